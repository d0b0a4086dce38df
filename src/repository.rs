use crate::config::PluginConfiguration;
use crate::discovery::{discover_package_roots, MANIFEST_FILE_NAME};
use crate::error::{MonorepoHelperError, Result};
use crate::git::{head_commit, ProcessRunner};
use crate::guesser::VersionGuesser;
use log::info;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// One sub-package loaded into the host's package object model
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPackage {
    pub name: String,
    pub package_type: String,
    pub version: String,
    /// Directory the package installs from (the `dist` url)
    pub root: PathBuf,
    /// Commit hash when the monorepo is a checkout, content hash otherwise
    pub dist_reference: String,
    /// The full manifest document, `dist` block included
    pub manifest: Value,
}

/// Host capability that turns a raw manifest document into a package record.
///
/// The repository hands over documents that already carry a `version` and a
/// synthesized `dist` block; a loader rejecting a document is fatal for the
/// run, exactly like a manifest that fails to parse.
pub trait PackageLoader {
    fn load(&self, manifest: &Value, source: &Path) -> Result<LoadedPackage>;
}

/// Default document-to-record mapping
pub struct JsonPackageLoader;

impl PackageLoader for JsonPackageLoader {
    fn load(&self, manifest: &Value, source: &Path) -> Result<LoadedPackage> {
        let name = manifest
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| MonorepoHelperError::manifest(source, "package has no name"))?;
        let package_type = manifest
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("library");
        let version = manifest
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| MonorepoHelperError::manifest(source, "package has no version"))?;
        let dist = manifest
            .get("dist")
            .ok_or_else(|| MonorepoHelperError::manifest(source, "package has no dist block"))?;
        let root = dist
            .get("url")
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .ok_or_else(|| MonorepoHelperError::manifest(source, "dist block has no url"))?;
        let dist_reference = dist
            .get("reference")
            .and_then(Value::as_str)
            .ok_or_else(|| MonorepoHelperError::manifest(source, "dist block has no reference"))?
            .to_string();

        Ok(LoadedPackage {
            name: name.to_string(),
            package_type: package_type.to_string(),
            version: version.to_string(),
            root,
            dist_reference,
            manifest: manifest.clone(),
        })
    }
}

/// Repository source that offers the monorepo's sub-packages to the host
/// resolver.
///
/// Discovery walks the tree once, then every manifest is parsed, decorated
/// with `dist` metadata and a guessed version, and loaded into the in-memory
/// package set. Embedders insert this source ahead of registry-backed ones
/// so its versions are preferred when equivalents exist elsewhere.
pub struct MonorepoRepository<'a> {
    root: PathBuf,
    configuration: &'a PluginConfiguration,
    loader: &'a dyn PackageLoader,
    runner: &'a dyn ProcessRunner,
    guesser: VersionGuesser<'a>,
    enabled: bool,
    packages: Vec<LoadedPackage>,
}

impl<'a> MonorepoRepository<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        configuration: &'a PluginConfiguration,
        loader: &'a dyn PackageLoader,
        runner: &'a dyn ProcessRunner,
        guesser: VersionGuesser<'a>,
    ) -> Self {
        MonorepoRepository {
            root: root.into(),
            configuration,
            loader,
            runner,
            guesser,
            enabled: true,
            packages: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disables the repository source.
    ///
    /// A disabled source loads nothing and offers nothing; resolution then
    /// proceeds exactly as if it did not exist.
    pub fn disable(&mut self, reason: &str) {
        self.enabled = false;
        info!("{}", reason);
    }

    /// The packages currently offered to the resolver
    pub fn packages(&self) -> &[LoadedPackage] {
        &self.packages
    }

    /// Discover every sub-package and load it into the package set.
    ///
    /// A manifest that fails to parse (or a document the loader rejects)
    /// aborts the whole run with the offending path. Silently dropping a
    /// package here would surface much later as a confusing "package not
    /// found" during resolution.
    pub fn load_packages(&mut self) -> Result<()> {
        self.packages.clear();
        if !self.enabled {
            return Ok(());
        }

        let package_roots: Vec<PathBuf> = discover_package_roots(
            &self.root,
            self.configuration.max_discovery_depth,
            &self.configuration.excluded_dirs,
        )
        .collect();

        for package_root in package_roots {
            let package = self.load_package(&package_root)?;
            info!(
                "Added {} {} as {} version from the monorepo.",
                package.name, package.package_type, package.version
            );
            self.packages.push(package);
        }

        Ok(())
    }

    fn load_package(&self, package_root: &Path) -> Result<LoadedPackage> {
        let manifest_path = package_root.join(MANIFEST_FILE_NAME);
        let raw = fs::read_to_string(&manifest_path)?;
        let mut manifest: Value = serde_json::from_str(&raw)
            .map_err(|e| MonorepoHelperError::manifest(&manifest_path, e.to_string()))?;
        if !manifest.is_object() {
            return Err(MonorepoHelperError::manifest(
                &manifest_path,
                "expected a JSON object",
            ));
        }

        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        manifest["dist"] = json!({
            "type": "path",
            "url": package_root.display().to_string(),
            "reference": hex::encode(hasher.finalize()),
        });
        // Enforce symlinking instead of copying.
        manifest["transport-options"] = json!({ "symlink": true });

        let version = self.guesser.package_version(&manifest, package_root);
        manifest["version"] = json!(version);

        // The commit hash is preferred over the content hash: it stays
        // stable across edits elsewhere in the tree. This reads the
        // checkout's HEAD, so every sub-package gets the same reference.
        if self.root.join(".git").is_dir() {
            if let Some(commit) = head_commit(self.runner, package_root) {
                manifest["dist"]["reference"] = json!(commit);
            }
        }

        self.loader.load(&manifest, &manifest_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::TagResolver;
    use crate::git::tags::DEFAULT_REMOTE;
    use crate::git::{ProcessOutput, ScriptedRunner, TagSource};
    use crate::guesser::NoFallback;

    const SORTED_TAGS_CMD: &str = "git -c versionsort.suffix=- for-each-ref \
         --sort=-version:refname --format=%(refname:short) refs/tags";
    const HEAD_COMMIT_CMD: &str = "git log -n1 --pretty=%H";

    fn configuration() -> PluginConfiguration {
        PluginConfiguration {
            max_discovery_depth: 5,
            offline_mode: true,
            excluded_dirs: Vec::new(),
            forced_root: None,
            enabled: true,
        }
    }

    fn repository<'a>(
        root: &Path,
        configuration: &'a PluginConfiguration,
        loader: &'a JsonPackageLoader,
        runner: &'a ScriptedRunner,
        fallback: &'a NoFallback,
    ) -> MonorepoRepository<'a> {
        let source = TagSource::new(runner, root, DEFAULT_REMOTE);
        let guesser = VersionGuesser::new(
            TagResolver::new(source, configuration.offline_mode),
            fallback,
        );
        MonorepoRepository::new(root, configuration, loader, runner, guesser)
    }

    fn write_package(root: &Path, dir: &str, manifest: &str) {
        let package_root = root.join(dir);
        fs::create_dir_all(&package_root).unwrap();
        fs::write(package_root.join(MANIFEST_FILE_NAME), manifest).unwrap();
    }

    #[test]
    fn test_loads_packages_with_guessed_and_declared_versions() {
        let tree = tempfile::tempdir().unwrap();
        let root = tree.path();
        write_package(root, "packages/app", r#"{"name": "acme/app"}"#);
        write_package(
            root,
            "packages/lib",
            r#"{"name": "acme/lib", "type": "library", "version": "3.0.0"}"#,
        );

        let mut runner = ScriptedRunner::new();
        runner.add_response(SORTED_TAGS_CMD, ProcessOutput::ok("1.2.3\n"));
        let configuration = configuration();
        let loader = JsonPackageLoader;
        let fallback = NoFallback;
        let mut repository = repository(root, &configuration, &loader, &runner, &fallback);

        repository.load_packages().unwrap();

        let packages = repository.packages();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "acme/app");
        assert_eq!(packages[0].version, "1.2.4");
        assert_eq!(packages[1].name, "acme/lib");
        assert_eq!(packages[1].version, "3.0.0");
    }

    #[test]
    fn test_dist_block_uses_content_hash_without_checkout() {
        let tree = tempfile::tempdir().unwrap();
        let root = tree.path();
        let manifest = r#"{"name": "acme/app", "version": "1.0.0"}"#;
        write_package(root, "app", manifest);

        let runner = ScriptedRunner::new();
        let configuration = configuration();
        let loader = JsonPackageLoader;
        let fallback = NoFallback;
        let mut repository = repository(root, &configuration, &loader, &runner, &fallback);

        repository.load_packages().unwrap();

        let package = &repository.packages()[0];
        let mut hasher = Sha256::new();
        hasher.update(manifest.as_bytes());
        assert_eq!(package.dist_reference, hex::encode(hasher.finalize()));
        assert_eq!(package.root, root.join("app"));
        assert_eq!(package.manifest["dist"]["type"], "path");
        assert_eq!(package.manifest["transport-options"]["symlink"], true);
        // No checkout, so git was never asked for a commit.
        assert_eq!(runner.call_count(HEAD_COMMIT_CMD), 0);
    }

    #[test]
    fn test_commit_hash_preferred_over_content_hash() {
        let tree = tempfile::tempdir().unwrap();
        let root = tree.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        write_package(root, "app", r#"{"name": "acme/app", "version": "1.0.0"}"#);

        let mut runner = ScriptedRunner::new();
        let commit = "5eed0aa2b5a2fbb1bbbf39b3ed1b8f23eb5ac1de";
        runner.add_response(HEAD_COMMIT_CMD, ProcessOutput::ok(format!("{}\n", commit)));
        let configuration = configuration();
        let loader = JsonPackageLoader;
        let fallback = NoFallback;
        let mut repository = repository(root, &configuration, &loader, &runner, &fallback);

        repository.load_packages().unwrap();

        let package = &repository.packages()[0];
        assert_eq!(package.dist_reference, commit);
        assert_eq!(package.manifest["dist"]["reference"], commit);
    }

    #[test]
    fn test_malformed_manifest_aborts_the_run() {
        let tree = tempfile::tempdir().unwrap();
        let root = tree.path();
        write_package(root, "good", r#"{"name": "acme/good", "version": "1.0.0"}"#);
        write_package(root, "broken", r#"{"name": "acme/broken", }"#);

        let runner = ScriptedRunner::new();
        let configuration = configuration();
        let loader = JsonPackageLoader;
        let fallback = NoFallback;
        let mut repository = repository(root, &configuration, &loader, &runner, &fallback);

        let err = repository.load_packages().unwrap_err();
        assert_eq!(
            err.manifest_path(),
            Some(root.join("broken").join(MANIFEST_FILE_NAME).as_path())
        );
        assert!(repository.packages().is_empty());
    }

    #[test]
    fn test_manifest_without_name_aborts_the_run() {
        let tree = tempfile::tempdir().unwrap();
        let root = tree.path();
        write_package(root, "anon", r#"{"version": "1.0.0"}"#);

        let runner = ScriptedRunner::new();
        let configuration = configuration();
        let loader = JsonPackageLoader;
        let fallback = NoFallback;
        let mut repository = repository(root, &configuration, &loader, &runner, &fallback);

        assert!(repository.load_packages().is_err());
    }

    #[test]
    fn test_disabled_repository_loads_nothing() {
        let tree = tempfile::tempdir().unwrap();
        let root = tree.path();
        write_package(root, "app", r#"{"name": "acme/app", "version": "1.0.0"}"#);

        let runner = ScriptedRunner::new();
        let configuration = configuration();
        let loader = JsonPackageLoader;
        let fallback = NoFallback;
        let mut repository = repository(root, &configuration, &loader, &runner, &fallback);

        repository.disable("disabled for the test");
        repository.load_packages().unwrap();

        assert!(!repository.is_enabled());
        assert!(repository.packages().is_empty());
    }

    #[test]
    fn test_versionless_packages_share_one_tag_resolution() {
        let tree = tempfile::tempdir().unwrap();
        let root = tree.path();
        write_package(root, "a", r#"{"name": "acme/a"}"#);
        write_package(root, "b", r#"{"name": "acme/b"}"#);
        write_package(root, "c", r#"{"name": "acme/c"}"#);

        let mut runner = ScriptedRunner::new();
        runner.add_response(SORTED_TAGS_CMD, ProcessOutput::ok("2.0.0\n"));
        let configuration = configuration();
        let loader = JsonPackageLoader;
        let fallback = NoFallback;
        let mut repository = repository(root, &configuration, &loader, &runner, &fallback);

        repository.load_packages().unwrap();

        assert_eq!(repository.packages().len(), 3);
        for package in repository.packages() {
            assert_eq!(package.version, "2.0.1");
        }
        assert_eq!(runner.call_count("git -c versionsort.suffix=-"), 1);
    }
}
