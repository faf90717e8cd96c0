//! Configuration loading and setting resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: a warning is logged and the
//! compiled defaults apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the catalog bearer token
pub const ENV_ACCESS_TOKEN: &str = "PLFIX_ACCESS_TOKEN";
/// Environment variable overriding the backup directory
pub const ENV_BACKUP_DIR: &str = "PLFIX_BACKUP_DIR";
/// Environment variable overriding the search cache file
pub const ENV_CACHE_FILE: &str = "PLFIX_CACHE_FILE";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter level ("error", "warn", "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Contents of `config.toml`
///
/// All fields are optional so a partial file still loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// OAuth bearer token for the primary catalog
    #[serde(default)]
    pub access_token: Option<String>,
    /// Directory receiving pre-run playlist snapshots
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
    /// Search result cache file
    #[serde(default)]
    pub cache_file: Option<PathBuf>,
    /// Base URL of the primary catalog API
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Minimum spacing between catalog requests
    #[serde(default)]
    pub request_interval_ms: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Compiled fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub backup_dir: PathBuf,
    pub cache_file: PathBuf,
    pub api_base_url: String,
    pub request_interval_ms: u64,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            backup_dir: PathBuf::from("backup"),
            cache_file: PathBuf::from("cache").join("search_cache.json"),
            api_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            request_interval_ms: 200,
            log_level: default_log_level(),
        }
    }
}

/// Default location of the user config file (`~/.config/plfix/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("plfix").join("config.toml"))
}

/// Load the TOML config
///
/// `explicit` is the `--config` argument. When it is `None` the platform
/// default location is tried. A missing or unreadable file yields the
/// defaults; a file that exists but does not parse is a configuration error.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => {
                warn!("Could not determine config directory, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    if !path.exists() {
        if explicit.is_some() {
            warn!("Config file not found: {}, using defaults", path.display());
        } else {
            info!("No config file at {}, using defaults", path.display());
        }
        return Ok(TomlConfig::default());
    }

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Config file {} unreadable ({}), using defaults", path.display(), e);
            return Ok(TomlConfig::default());
        }
    };
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolve a path setting: CLI → ENV → TOML → default
pub fn resolve_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
    default: &Path,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    default.to_path_buf()
}

/// Resolve the catalog access token: CLI → ENV → TOML
///
/// There is no compiled default; a missing token is fatal.
pub fn resolve_access_token(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let env_token = std::env::var(ENV_ACCESS_TOKEN).ok();
    let toml_token = toml_config.access_token.as_deref();

    let mut sources = Vec::new();
    if cli_arg.is_some_and(is_valid_token) {
        sources.push("command line");
    }
    if env_token.as_deref().is_some_and(is_valid_token) {
        sources.push("environment");
    }
    if toml_token.is_some_and(is_valid_token) {
        sources.push("TOML");
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "Access token found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(token) = cli_arg.filter(|t| is_valid_token(t)) {
        return Ok(token.trim().to_string());
    }
    if let Some(token) = env_token.filter(|t| is_valid_token(t)) {
        info!("Access token loaded from environment variable");
        return Ok(token.trim().to_string());
    }
    if let Some(token) = toml_token.filter(|t| is_valid_token(t)) {
        info!("Access token loaded from TOML config");
        return Ok(token.trim().to_string());
    }

    Err(Error::Config(format!(
        "Access token not configured. Please configure using one of:\n\
         1. Command line: --access-token <token>\n\
         2. Environment: {}=<token>\n\
         3. TOML config: ~/.config/plfix/config.toml (access_token = \"<token>\")\n\
         \n\
         The token needs the youtube.force-ssl scope to edit playlists.",
        ENV_ACCESS_TOKEN
    )))
}

/// Validate a token (non-empty, non-whitespace)
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_token() {
        assert!(is_valid_token("ya29.abc"));
        assert!(!is_valid_token(""));
        assert!(!is_valid_token("   \t"));
    }

    #[test]
    fn test_compiled_defaults_match_legacy_locations() {
        let defaults = CompiledDefaults::default();
        assert_eq!(defaults.backup_dir, PathBuf::from("backup"));
        assert_eq!(
            defaults.cache_file,
            PathBuf::from("cache").join("search_cache.json")
        );
        assert_eq!(defaults.log_level, "info");
        assert_eq!(defaults.request_interval_ms, 200);
    }

    #[test]
    fn test_partial_toml_parses() {
        let config: TomlConfig = toml::from_str("backup_dir = \"/tmp/b\"\n").unwrap();
        assert_eq!(config.backup_dir, Some(PathBuf::from("/tmp/b")));
        assert!(config.access_token.is_none());
        assert_eq!(config.logging.level, "info");
    }
}
