use crate::error::{MonorepoHelperError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Discovery depth used when nothing configures one; 0 is never valid
pub const DEFAULT_PACKAGE_DISCOVERY_DEPTH: usize = 5;

/// Section of the root manifest's `extra` block that configures this plugin
pub const EXTRA_SECTION: &str = "monorepo-helper";

pub const ENV_OFFLINE_MODE: &str = "MONOREPO_HELPER_OFFLINE_MODE";
pub const ENV_MAX_DISCOVERY_DEPTH: &str = "MONOREPO_HELPER_MAX_DISCOVERY_DEPTH";
pub const ENV_EXCLUDED_DIRS: &str = "MONOREPO_HELPER_EXCLUDED_DIRS";
pub const ENV_ROOT: &str = "MONOREPO_HELPER_ROOT";
pub const ENV_ENABLED: &str = "MONOREPO_HELPER_ENABLED";

/// Default tier of the configuration, loadable from `monorepo-helper.toml`.
///
/// Every field is optional; an absent field falls through to the built-in
/// default. The CLI feeds this in under the manifest and environment tiers.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscoveryDefaults {
    #[serde(default)]
    pub max_discovery_depth: Option<usize>,

    #[serde(default)]
    pub offline_mode: Option<bool>,

    #[serde(default)]
    pub excluded_dirs: Option<Vec<String>>,

    #[serde(default)]
    pub monorepo_root: Option<PathBuf>,

    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Loads discovery defaults from file or returns the built-ins.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `monorepo-helper.toml` in the current directory
/// 3. `monorepo-helper.toml` in the user config directory
/// 4. Built-in defaults if no file found
pub fn load_defaults(config_path: Option<&str>) -> Result<DiscoveryDefaults> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./monorepo-helper.toml").exists() {
        fs::read_to_string("./monorepo-helper.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join("monorepo-helper.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(DiscoveryDefaults::default());
        }
    } else {
        return Ok(DiscoveryDefaults::default());
    };

    toml::from_str(&config_str).map_err(|e| MonorepoHelperError::config(e.to_string()))
}

/// Value object that stores the plugin's configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfiguration {
    pub max_discovery_depth: usize,
    pub offline_mode: bool,
    pub excluded_dirs: Vec<String>,
    pub forced_root: Option<PathBuf>,
    pub enabled: bool,
}

impl PluginConfiguration {
    /// Resolve each knob with the documented precedence: the root manifest's
    /// `extra.monorepo-helper` value, else the environment variable, else
    /// the supplied default tier, else the built-in.
    ///
    /// `enabled` follows the same chain with a literal `true` at the end;
    /// the possibly surprising interplay of manifest default and environment
    /// override is intentional (see DESIGN.md) and must not be reordered.
    pub fn resolve(extra: Option<&Value>, defaults: &DiscoveryDefaults) -> Self {
        let section = extra.and_then(|extra| extra.get(EXTRA_SECTION));

        let offline_mode = section
            .and_then(|section| section.get("offline-mode"))
            .and_then(Value::as_bool)
            .or_else(|| env_bool(ENV_OFFLINE_MODE))
            .or(defaults.offline_mode)
            .unwrap_or(false);

        // 0 as max discovery depth is not valid.
        let max_discovery_depth = section
            .and_then(|section| section.get("max-discover-depth"))
            .and_then(Value::as_u64)
            .map(|depth| depth as usize)
            .or_else(|| env_parse(ENV_MAX_DISCOVERY_DEPTH))
            .or(defaults.max_discovery_depth)
            .filter(|depth| *depth > 0)
            .unwrap_or(DEFAULT_PACKAGE_DISCOVERY_DEPTH);

        let excluded_dirs = section
            .and_then(|section| section.get("excluded-dirs"))
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .or_else(|| {
                env::var(ENV_EXCLUDED_DIRS).ok().map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string)
                        .collect()
                })
            })
            .or_else(|| defaults.excluded_dirs.clone())
            .unwrap_or_default();

        let forced_root = section
            .and_then(|section| section.get("root"))
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .or_else(|| env::var(ENV_ROOT).ok().map(PathBuf::from))
            .or_else(|| defaults.monorepo_root.clone());

        let enabled = section
            .and_then(|section| section.get("enabled"))
            .and_then(Value::as_bool)
            .or_else(|| env_bool(ENV_ENABLED))
            .or(defaults.enabled)
            .unwrap_or(true);

        PluginConfiguration {
            max_discovery_depth,
            offline_mode,
            excluded_dirs,
            forced_root,
            enabled,
        }
    }
}

fn env_bool(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|value| parse_bool(&value))
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
