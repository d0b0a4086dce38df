use crate::domain::SemanticVersion;
use crate::git::TagSource;
use log::{error, info, warn};

/// Finds the single highest valid semantic-version tag visible to the
/// current mode.
///
/// Four paths converge on one value:
///
/// 1. Offline mode skips the remote entirely and considers every locally
///    known tag.
/// 2. Online, a failed fetch ends resolution immediately; local tags may be
///    stale relative to the remote, so there is no local-only fallback.
/// 3. After a successful fetch, an empty local list or an empty/unreachable
///    remote listing ends resolution, each with its own diagnostic.
/// 4. Otherwise the locally sorted list is filtered down to tags that also
///    exist on the remote (order preserved) and walked from highest to
///    lowest; the first tag that parses as a semantic version wins.
///
/// This is pure coordination: all side effects live in [TagSource], and
/// every diagnostic is advisory.
pub struct TagResolver<'a> {
    source: TagSource<'a>,
    offline: bool,
}

impl<'a> TagResolver<'a> {
    pub fn new(source: TagSource<'a>, offline: bool) -> Self {
        TagResolver { source, offline }
    }

    /// The highest tag that is a valid semantic version, or `None` when no
    /// such tag is visible in the current mode.
    pub fn highest_valid_tag(&self) -> Option<String> {
        if !self.offline {
            match self.source.fetch_remote() {
                Ok(output) if output.success() => {}
                Ok(output) => {
                    error!(
                        "Unable to fetch remote {}. Error: {}",
                        self.source.remote(),
                        output.stderr.trim()
                    );
                    return None;
                }
                Err(e) => {
                    error!("Unable to fetch remote {}. Error: {}", self.source.remote(), e);
                    return None;
                }
            }
        }

        let sorted_tags = match self.source.list_sorted_tags() {
            Ok(tags) => tags,
            Err(e) => {
                warn!("Could not list tags: {}", e);
                return None;
            }
        };
        if sorted_tags.is_empty() {
            info!("No tag found in the local repository.");
            return None;
        }
        info!(
            "The following local and remote tags found: {}.",
            sorted_tags.join(", ")
        );

        let candidates = if self.offline {
            warn!("Offline mode is active.");
            sorted_tags
        } else {
            match self.source.list_remote_tag_names() {
                Ok(Some(remote_names)) if !remote_names.is_empty() => {
                    // Intersect with the local listing so the candidates keep
                    // git's descending version order, which ls-remote cannot
                    // provide by itself.
                    let remote_tags: Vec<String> = sorted_tags
                        .iter()
                        .filter(|tag| remote_names.contains(*tag))
                        .cloned()
                        .collect();
                    info!(
                        "The following tags found on remote {}: {}.",
                        self.source.remote(),
                        remote_tags.join(", ")
                    );
                    remote_tags
                }
                Ok(Some(_)) => {
                    info!(
                        "No tags found on remote {}. All tags found earlier were local only.",
                        self.source.remote()
                    );
                    return None;
                }
                Ok(None) => {
                    warn!(
                        "Remote {} could not be queried for tags.",
                        self.source.remote()
                    );
                    return None;
                }
                Err(e) => {
                    warn!(
                        "Remote {} could not be queried for tags: {}",
                        self.source.remote(),
                        e
                    );
                    return None;
                }
            }
        };

        for tag in candidates {
            match SemanticVersion::parse(&tag) {
                Ok(_) => {
                    info!("'{}' is the highest semantic versioning tag.", tag);
                    return Some(tag);
                }
                Err(_) => {
                    info!(
                        "Skipping '{}' tag because it is not a valid semantic versioning tag.",
                        tag
                    );
                }
            }
        }

        None
    }
}
