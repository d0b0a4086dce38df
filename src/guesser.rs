use crate::analyzer::TagResolver;
use crate::domain::SemanticVersion;
use log::{info, warn};
use regex::Regex;
use serde_json::Value;
use std::cell::RefCell;
use std::path::Path;

/// Version assigned when nothing better can be derived: an unversioned
/// development branch.
pub const DEV_VERSION: &str = "dev-master";

/// Outcome of the next-version computation for the whole monorepo.
///
/// "Not computed yet" and "computed, nothing found" are different facts and
/// never share a representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionGuess {
    Undetermined,
    Determined(SemanticVersion),
    NotAvailable,
}

/// Host-provided heuristic that guesses a version from working-copy state.
///
/// This is the package manager's own guesser (branch names, branch-alias
/// metadata and the like); the discovery engine only consumes its output and
/// never reimplements it.
pub trait FallbackVersionGuesser {
    fn guess(&self, manifest: &Value, package_root: &Path) -> Option<String>;
}

/// Stand-in for hosts that provide no working-copy heuristic
pub struct NoFallback;

impl FallbackVersionGuesser for NoFallback {
    fn guess(&self, _manifest: &Value, _package_root: &Path) -> Option<String> {
        None
    }
}

/// Guesses package versions inside the monorepo.
///
/// The next semantic version derived from git tags is shared by every
/// sub-package, so it is computed at most once per run and memoized; only
/// the per-package decision (explicit version, next version, fallback) runs
/// per call.
pub struct VersionGuesser<'a> {
    resolver: TagResolver<'a>,
    fallback: &'a dyn FallbackVersionGuesser,
    next_version: RefCell<VersionGuess>,
}

impl<'a> VersionGuesser<'a> {
    pub fn new(resolver: TagResolver<'a>, fallback: &'a dyn FallbackVersionGuesser) -> Self {
        VersionGuesser {
            resolver,
            fallback,
            next_version: RefCell::new(VersionGuess::Undetermined),
        }
    }

    /// Returns the version for a package inside the monorepo.
    ///
    /// A version declared in the package's own manifest is never overridden.
    /// Otherwise the memoized next semantic version applies; when that is
    /// not available the host fallback heuristic is consulted, keeping its
    /// output only when it is a recognizable dev version. Its repeated
    /// `.9999999` branch-distance placeholders are collapsed to a single
    /// `.x` meaning "any version on this branch".
    pub fn package_version(&self, manifest: &Value, package_root: &Path) -> String {
        if let Some(version) = manifest.get("version").and_then(Value::as_str) {
            return version.to_string();
        }

        if let Some(next) = self.next_semantic_version() {
            return next.to_string();
        }

        let mut version = DEV_VERSION.to_string();
        if let Some(guessed) = self.fallback.guess(manifest, package_root) {
            if let Ok(placeholders) = Regex::new(r"(\.9999999)+") {
                if guessed.ends_with("-dev") && placeholders.is_match(&guessed) {
                    version = placeholders.replace_all(&guessed, ".x").into_owned();
                }
            }
        }
        version
    }

    /// Gets the next semantic version for all packages inside the monorepo.
    ///
    /// The underlying tag resolution (and its subprocess sequence) runs at
    /// most once per run; later calls reuse the memoized outcome.
    fn next_semantic_version(&self) -> Option<SemanticVersion> {
        if *self.next_version.borrow() == VersionGuess::Undetermined {
            let guess = match self.compute_next_version() {
                Some(version) => {
                    info!(
                        "'{}' is the next semantic version for all packages inside the monorepo.",
                        version
                    );
                    VersionGuess::Determined(version)
                }
                None => VersionGuess::NotAvailable,
            };
            *self.next_version.borrow_mut() = guess;
        }

        match &*self.next_version.borrow() {
            VersionGuess::Determined(version) => Some(version.clone()),
            _ => None,
        }
    }

    fn compute_next_version(&self) -> Option<SemanticVersion> {
        let tag = self.resolver.highest_valid_tag()?;
        let version = match SemanticVersion::parse(&tag) {
            Ok(version) => version,
            Err(e) => {
                warn!("Resolved tag '{}' failed to parse: {}", tag, e);
                return None;
            }
        };

        if version.is_prerelease() {
            match version.increment_prerelease() {
                Ok(next) => Some(next),
                Err(e) => {
                    warn!(
                        "Cannot derive the next pre-release from tag '{}': {}",
                        tag, e
                    );
                    None
                }
            }
        } else {
            Some(version.increment_patch())
        }
    }
}
