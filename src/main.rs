use anyhow::Result;
use clap::Parser;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use monorepo_helper::config::{self, PluginConfiguration};
use monorepo_helper::discovery::MANIFEST_FILE_NAME;
use monorepo_helper::git::SystemProcessRunner;
use monorepo_helper::guesser::NoFallback;
use monorepo_helper::repository::JsonPackageLoader;
use monorepo_helper::{plugin, ui};

#[derive(clap::Parser)]
#[command(
    name = "monorepo-helper",
    about = "Discover monorepo sub-packages and guess their versions from git tags"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Directory to inspect instead of the current one")]
    root: Option<PathBuf>,

    #[arg(long, help = "Do not fetch remote tags; rely on local tags only")]
    offline: bool,

    #[arg(long, help = "Maximum package discovery depth")]
    max_depth: Option<usize>,

    #[arg(
        long = "exclude",
        help = "Directory name to exclude from discovery (repeatable)"
    )]
    exclude: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Load the default configuration tier
    let defaults = match config::load_defaults(args.config.as_deref()) {
        Ok(defaults) => defaults,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    let working_dir = match args.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    let extra = read_root_extra(&working_dir);
    let mut configuration = PluginConfiguration::resolve(extra.as_ref(), &defaults);

    // Command-line flags override every other tier.
    if args.offline {
        configuration.offline_mode = true;
    }
    if let Some(depth) = args.max_depth {
        if depth > 0 {
            configuration.max_discovery_depth = depth;
        }
    }
    configuration.excluded_dirs.extend(args.exclude);

    let runner = SystemProcessRunner;
    let fallback = NoFallback;
    let loader = JsonPackageLoader;

    let Some(mut repository) =
        plugin::activate(&working_dir, &configuration, &runner, &fallback, &loader)
    else {
        ui::display_status("Monorepo discovery is inactive here.");
        return Ok(());
    };

    ui::display_status(&format!(
        "Discovering packages under {}",
        repository.root().display()
    ));

    if let Err(e) = repository.load_packages() {
        ui::display_error(&format!("Discovery failed: {}", e));
        std::process::exit(1);
    }

    ui::display_packages(repository.packages());
    ui::display_success(&format!(
        "{} package(s) offered to the resolver.",
        repository.packages().len()
    ));

    Ok(())
}

/// The `extra` block of the root manifest, when the working directory has a
/// readable one. A malformed root manifest is not fatal here; discovery
/// reports it properly once it reaches the file.
fn read_root_extra(dir: &Path) -> Option<Value> {
    let raw = fs::read_to_string(dir.join(MANIFEST_FILE_NAME)).ok()?;
    let manifest: Value = serde_json::from_str(&raw).ok()?;
    manifest.get("extra").cloned()
}
