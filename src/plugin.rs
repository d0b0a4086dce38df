use crate::analyzer::TagResolver;
use crate::config::PluginConfiguration;
use crate::git::tags::DEFAULT_REMOTE;
use crate::git::{discover_git_root, git_available, ProcessRunner, TagSource};
use crate::guesser::{FallbackVersionGuesser, VersionGuesser};
use crate::repository::{MonorepoRepository, PackageLoader};
use log::{info, warn};
use std::path::Path;

/// Builds the monorepo repository source for a working directory.
///
/// Returns `None` whenever the engine cannot or should not run: disabled by
/// configuration, no usable git executable, no monorepo root. That is a
/// clean self-disable, not an error; one diagnostic is emitted and the
/// host's resolution proceeds exactly as if this source did not exist.
///
/// Embedders should insert the returned repository ahead of registry-backed
/// sources so its versions win over equivalents published elsewhere.
pub fn activate<'a>(
    working_dir: &Path,
    configuration: &'a PluginConfiguration,
    runner: &'a dyn ProcessRunner,
    fallback: &'a dyn FallbackVersionGuesser,
    loader: &'a dyn PackageLoader,
) -> Option<MonorepoRepository<'a>> {
    if !configuration.enabled {
        info!("Plugin is configured to be disabled.");
        return None;
    }

    if !git_available(runner) {
        info!("Plugin is disabled because no usable git executable was found.");
        return None;
    }

    let monorepo_root = match &configuration.forced_root {
        Some(forced) => {
            warn!("Forced monorepo root is {}.", forced.display());
            let root = if forced.is_absolute() {
                forced.clone()
            } else {
                working_dir.join(forced)
            };
            if !root.join(".git").is_dir() {
                info!("Plugin is disabled because forced monorepo root does not seem to be a valid GIT root.");
                return None;
            }
            root
        }
        None => match discover_git_root(runner, working_dir) {
            Some(root) => {
                info!("Detected monorepo root: {}", root.display());
                root
            }
            None => {
                info!(
                    "Plugin is disabled because no GIT root found in {} directory",
                    working_dir.display()
                );
                return None;
            }
        },
    };

    let source = TagSource::new(runner, &monorepo_root, DEFAULT_REMOTE);
    let resolver = TagResolver::new(source, configuration.offline_mode);
    let guesser = VersionGuesser::new(resolver, fallback);

    Some(MonorepoRepository::new(
        monorepo_root,
        configuration,
        loader,
        runner,
        guesser,
    ))
}
