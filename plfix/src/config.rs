//! Resolved runtime settings for the plfix binary
//!
//! Combines command-line overrides with the TOML config and compiled
//! defaults (see [`plfix_common::config`] for the priority rules).

use plfix_common::config::{
    resolve_access_token, resolve_path, CompiledDefaults, TomlConfig, ENV_BACKUP_DIR,
    ENV_CACHE_FILE,
};
use plfix_common::Result;
use std::path::PathBuf;

/// Settings the command line may override
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub access_token: Option<String>,
    pub backup_dir: Option<PathBuf>,
    pub cache_file: Option<PathBuf>,
}

/// Fully resolved settings
#[derive(Clone)]
pub struct Settings {
    pub access_token: String,
    pub backup_dir: PathBuf,
    pub cache_file: PathBuf,
    pub api_base_url: String,
    pub request_interval_ms: u64,
    pub log_level: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("access_token", &"<redacted>")
            .field("backup_dir", &self.backup_dir)
            .field("cache_file", &self.cache_file)
            .field("api_base_url", &self.api_base_url)
            .field("request_interval_ms", &self.request_interval_ms)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Settings {
    /// Resolve every setting; fails only when no access token is configured
    pub fn resolve(cli: &CliOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::default();

        let access_token = resolve_access_token(cli.access_token.as_deref(), toml_config)?;
        let backup_dir = resolve_path(
            cli.backup_dir.as_deref(),
            ENV_BACKUP_DIR,
            toml_config.backup_dir.as_deref(),
            &defaults.backup_dir,
        );
        let cache_file = resolve_path(
            cli.cache_file.as_deref(),
            ENV_CACHE_FILE,
            toml_config.cache_file.as_deref(),
            &defaults.cache_file,
        );
        let api_base_url = toml_config
            .api_base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_base_url);
        let request_interval_ms = toml_config
            .request_interval_ms
            .unwrap_or(defaults.request_interval_ms);

        let settings = Self {
            access_token,
            backup_dir,
            cache_file,
            api_base_url,
            request_interval_ms,
            log_level: toml_config.logging.level.clone(),
        };
        tracing::debug!(settings = ?settings, "Settings resolved");
        Ok(settings)
    }

    /// Tracing filter directive for this crate and its common library
    pub fn log_filter(&self) -> String {
        log_filter(&self.log_level)
    }
}

/// `plfix=<level>,plfix_common=<level>`
pub fn log_filter(level: &str) -> String {
    let level = level.trim();
    let level = if level.is_empty() { "info" } else { level };
    format!("plfix={},plfix_common={}", level, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_cli_overrides_toml() {
        env::remove_var(plfix_common::config::ENV_ACCESS_TOKEN);
        env::remove_var(ENV_BACKUP_DIR);
        env::remove_var(ENV_CACHE_FILE);

        let toml_config = TomlConfig {
            access_token: Some("toml-token".to_string()),
            backup_dir: Some(PathBuf::from("/toml/backup")),
            request_interval_ms: Some(50),
            api_base_url: Some("http://localhost:9999/v3/".to_string()),
            ..Default::default()
        };
        let cli = CliOverrides {
            access_token: Some("cli-token".to_string()),
            backup_dir: None,
            cache_file: Some(PathBuf::from("/cli/cache.json")),
        };

        let settings = Settings::resolve(&cli, &toml_config).unwrap();
        assert_eq!(settings.access_token, "cli-token");
        assert_eq!(settings.backup_dir, PathBuf::from("/toml/backup"));
        assert_eq!(settings.cache_file, PathBuf::from("/cli/cache.json"));
        assert_eq!(settings.api_base_url, "http://localhost:9999/v3");
        assert_eq!(settings.request_interval_ms, 50);
    }

    #[test]
    #[serial]
    fn test_defaults_apply() {
        env::remove_var(plfix_common::config::ENV_ACCESS_TOKEN);
        env::remove_var(ENV_BACKUP_DIR);
        env::remove_var(ENV_CACHE_FILE);

        let cli = CliOverrides {
            access_token: Some("t".to_string()),
            ..Default::default()
        };
        let settings = Settings::resolve(&cli, &TomlConfig::default()).unwrap();
        assert_eq!(settings.backup_dir, PathBuf::from("backup"));
        assert_eq!(
            settings.cache_file,
            PathBuf::from("cache").join("search_cache.json")
        );
        assert_eq!(settings.request_interval_ms, 200);
        assert_eq!(settings.log_filter(), "plfix=info,plfix_common=info");
        assert!(!format!("{:?}", settings).contains("\"t\""));
    }

    #[test]
    #[serial]
    fn test_missing_token_is_fatal() {
        env::remove_var(plfix_common::config::ENV_ACCESS_TOKEN);
        assert!(Settings::resolve(&CliOverrides::default(), &TomlConfig::default()).is_err());
    }
}
