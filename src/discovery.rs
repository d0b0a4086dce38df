use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Manifest file that marks a directory as a sub-package
pub const MANIFEST_FILE_NAME: &str = "composer.json";

/// Installed-dependency directory, always pruned from discovery
pub const VENDOR_DIR_NAME: &str = "vendor";

/// Walk the monorepo and yield the directory of every manifest within the
/// depth budget.
///
/// Depth counts entries directly inside `root` as 0, so a budget of 0
/// inspects only the root itself. The vendor directory, hidden directories
/// and any name in `excluded_dirs` are pruned before descent; their
/// contents are never visited and spend no depth budget. The walk is lazy,
/// finite, and sorted by file name so a fixed tree always yields the same
/// sequence; every call walks afresh.
pub fn discover_package_roots<'a>(
    root: &Path,
    max_depth: usize,
    excluded_dirs: &'a [String],
) -> impl Iterator<Item = PathBuf> + 'a {
    // walkdir counts the root itself as depth 0 and its entries as 1; the
    // discovery budget is shifted by one accordingly.
    WalkDir::new(root)
        .max_depth(max_depth.saturating_add(1))
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| entry.depth() == 0 || !is_pruned(entry, excluded_dirs))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE_NAME)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
}

fn is_pruned(entry: &DirEntry, excluded_dirs: &[String]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == VENDOR_DIR_NAME
        || name.starts_with('.')
        || excluded_dirs.iter().any(|excluded| excluded.as_str() == name)
}
