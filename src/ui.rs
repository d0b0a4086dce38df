use crate::repository::LoadedPackage;
use console::style;

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

pub fn display_packages(packages: &[LoadedPackage]) {
    if packages.is_empty() {
        display_status("No packages discovered in the monorepo.");
        return;
    }

    println!("\n{}", style("Discovered monorepo packages:").bold());
    for package in packages {
        println!(
            "  {} {} ({}) {}",
            style(&package.name).green(),
            package.version,
            package.package_type,
            style(short_reference(&package.dist_reference)).dim()
        );
        println!("    {}", style(package.root.display()).dim());
    }
    println!();
}

fn short_reference(reference: &str) -> &str {
    if reference.len() > 12 {
        &reference[..12]
    } else {
        reference
    }
}
