use crate::error::{MonorepoHelperError, Result};
use crate::git::{split_lines, ProcessOutput, ProcessRunner};
use std::path::{Path, PathBuf};

/// Remote that tags are fetched from and compared against
pub const DEFAULT_REMOTE: &str = "origin";

/// Git tag command surface over an injected [ProcessRunner].
///
/// Runs the version-control subprocesses that fetch and list tags and hands
/// back raw tag names; ordering comes from git's own version-aware
/// comparator, and semantic validation is left entirely to the caller.
pub struct TagSource<'a> {
    runner: &'a dyn ProcessRunner,
    root: PathBuf,
    remote: String,
}

impl<'a> TagSource<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        root: impl Into<PathBuf>,
        remote: impl Into<String>,
    ) -> Self {
        TagSource {
            runner,
            root: root.into(),
            remote: remote.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Update local knowledge of the remote's tags.
    ///
    /// Failure is advisory for the caller, so the raw [ProcessOutput] is
    /// returned rather than an error; its stderr carries the fetch failure
    /// detail for diagnostics.
    pub fn fetch_remote(&self) -> Result<ProcessOutput> {
        self.runner
            .run(&["git", "fetch", &self.remote], Some(&self.root))
    }

    /// All locally known tags (remote tags included once fetched), sorted
    /// descending by git's version-aware comparator.
    ///
    /// `versionsort.suffix=-` makes a suffixed tag rank below the plain
    /// form of the same numeric prefix, so the descending listing places
    /// `2.0` ahead of `2.0-rc`. An empty list is a valid, non-error result.
    pub fn list_sorted_tags(&self) -> Result<Vec<String>> {
        let output = self.runner.run(
            &[
                "git",
                "-c",
                "versionsort.suffix=-",
                "for-each-ref",
                "--sort=-version:refname",
                "--format=%(refname:short)",
                "refs/tags",
            ],
            Some(&self.root),
        )?;
        if !output.success() {
            return Err(MonorepoHelperError::process(format!(
                "git for-each-ref failed: {}",
                output.stderr.trim()
            )));
        }
        Ok(split_lines(&output.stdout))
    }

    /// Tag names that exist on the remote, unsorted.
    ///
    /// `Ok(None)` means the remote could not be queried at all, which is
    /// distinct from `Ok(Some(vec![]))`: queried fine but carrying zero
    /// tags (`ls-remote --exit-code` exits 2 in that case).
    pub fn list_remote_tag_names(&self) -> Result<Option<Vec<String>>> {
        let output = self.runner.run(
            &["git", "ls-remote", "-t", "--refs", "--exit-code", &self.remote],
            Some(&self.root),
        )?;
        match output.status {
            Some(0) => Ok(Some(
                split_lines(&output.stdout)
                    .iter()
                    .filter_map(|line| parse_ls_remote_line(line))
                    .collect(),
            )),
            Some(2) => Ok(Some(Vec::new())),
            _ => Ok(None),
        }
    }
}

/// Extract the tag name from an `ls-remote` line (`<oid>\trefs/tags/<name>`)
fn parse_ls_remote_line(line: &str) -> Option<String> {
    line.split_whitespace()
        .nth(1)
        .and_then(|reference| reference.strip_prefix("refs/tags/"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::ScriptedRunner;

    const SORTED_TAGS_CMD: &str = "git -c versionsort.suffix=- for-each-ref \
         --sort=-version:refname --format=%(refname:short) refs/tags";

    fn source(runner: &ScriptedRunner) -> TagSource<'_> {
        TagSource::new(runner, "/work/monorepo", DEFAULT_REMOTE)
    }

    #[test]
    fn test_sorted_tag_listing_preserves_git_order() {
        let mut runner = ScriptedRunner::new();
        // git's version-aware sort: a -suffix sorts before the plain form
        // of the same numeric prefix.
        runner.add_response(SORTED_TAGS_CMD, ProcessOutput::ok("2.0\n2.0-rc\n1.9\n"));

        let tags = source(&runner).list_sorted_tags().unwrap();
        assert_eq!(tags, vec!["2.0", "2.0-rc", "1.9"]);
        let rc = tags.iter().position(|t| t == "2.0-rc").unwrap();
        assert_eq!(tags[rc - 1], "2.0");
        assert_eq!(tags[rc + 1], "1.9");
    }

    #[test]
    fn test_sorted_tag_listing_requests_version_sort() {
        let mut runner = ScriptedRunner::new();
        runner.add_response(SORTED_TAGS_CMD, ProcessOutput::ok(""));

        source(&runner).list_sorted_tags().unwrap();

        let call = &runner.calls()[0];
        assert!(call.contains("versionsort.suffix=-"));
        assert!(call.contains("--sort=-version:refname"));
    }

    #[test]
    fn test_empty_tag_listing_is_not_an_error() {
        let mut runner = ScriptedRunner::new();
        runner.add_response(SORTED_TAGS_CMD, ProcessOutput::ok("\n"));

        assert!(source(&runner).list_sorted_tags().unwrap().is_empty());
    }

    #[test]
    fn test_failed_tag_listing_is_an_error() {
        let runner = ScriptedRunner::new();
        assert!(source(&runner).list_sorted_tags().is_err());
    }

    #[test]
    fn test_fetch_failure_is_advisory() {
        let mut runner = ScriptedRunner::new();
        runner.add_response(
            "git fetch origin",
            ProcessOutput::failed(128, "could not resolve host"),
        );

        let output = source(&runner).fetch_remote().unwrap();
        assert!(!output.success());
        assert!(output.stderr.contains("could not resolve host"));
    }

    #[test]
    fn test_remote_tag_names_parsed_from_refs() {
        let mut runner = ScriptedRunner::new();
        runner.add_response(
            "git ls-remote -t --refs --exit-code origin",
            ProcessOutput::ok(
                "49f3b1c\trefs/tags/1.2.0\n8a00f21\trefs/tags/2.0.0-rc1\n",
            ),
        );

        let names = source(&runner).list_remote_tag_names().unwrap().unwrap();
        assert_eq!(names, vec!["1.2.0", "2.0.0-rc1"]);
    }

    #[test]
    fn test_remote_with_zero_tags_is_empty_not_unavailable() {
        let mut runner = ScriptedRunner::new();
        runner.add_response(
            "git ls-remote -t --refs --exit-code origin",
            ProcessOutput::failed(2, ""),
        );

        assert_eq!(
            source(&runner).list_remote_tag_names().unwrap(),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_unreachable_remote_is_unavailable() {
        let mut runner = ScriptedRunner::new();
        runner.add_response(
            "git ls-remote -t --refs --exit-code origin",
            ProcessOutput::failed(128, "could not read from remote repository"),
        );

        assert_eq!(source(&runner).list_remote_tag_names().unwrap(), None);
    }
}
