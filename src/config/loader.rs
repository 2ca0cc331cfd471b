//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Optional TOML file layered under the environment.
pub const CONFIG_PATH_ENV: &str = "CPE_PROXY_CONFIG";
/// Listen address override.
pub const SERVE_ADDR_ENV: &str = "SERVE_ADDR";
/// Directory address override.
pub const MONGO_ADDR_ENV: &str = "MONGO_ADDR";
/// Log level override.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file. Validation happens after environment overrides.
pub fn read_config_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the process configuration: defaults, then the file named by
/// `CPE_PROXY_CONFIG` if set, then environment overrides.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Same as [`load_from_env`] with an injectable variable lookup.
pub fn load_with<F>(lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(CONFIG_PATH_ENV) {
        Some(path) => read_config_file(Path::new(&path))?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, &lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay recognised environment variables onto `config`. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if let Some(addr) = get(SERVE_ADDR_ENV) {
        config.listener.bind_address = addr;
    }
    if let Some(addr) = get(MONGO_ADDR_ENV) {
        config.directory.uri = addr;
    }
    if let Some(level) = get(LOG_LEVEL_ENV) {
        config.observability.log_level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = load_with(env(&[])).unwrap();
        assert_eq!(config.listener.bind_address, ":8081");
        assert_eq!(config.directory.uri, "db");
    }

    #[test]
    fn test_env_overrides() {
        let config = load_with(env(&[
            (SERVE_ADDR_ENV, "127.0.0.1:9999"),
            (MONGO_ADDR_ENV, "mongodb://directory:27017"),
            (LOG_LEVEL_ENV, ""),
        ]))
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert_eq!(config.directory.uri, "mongodb://directory:27017");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_file_then_env() {
        let path = std::env::temp_dir().join(format!("cpe-proxy-{}.toml", std::process::id()));
        fs::write(
            &path,
            "[listener]\nbind_address = \"127.0.0.1:7000\"\n[routing]\ntunnel_type = \"l2tp\"\n",
        )
        .unwrap();

        let path_str = path.to_string_lossy().to_string();
        let config = load_with(env(&[
            (CONFIG_PATH_ENV, path_str.as_str()),
            (SERVE_ADDR_ENV, ":7001"),
        ]))
        .unwrap();
        assert_eq!(config.listener.bind_address, ":7001");
        assert_eq!(config.routing.tunnel_type, "l2tp");

        let from_file = read_config_file(&path).unwrap();
        assert_eq!(from_file.listener.bind_address, "127.0.0.1:7000");

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_with(env(&[(CONFIG_PATH_ENV, "/nonexistent/cpe-proxy.toml")])).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_env_is_rejected() {
        let err = load_with(env(&[(SERVE_ADDR_ENV, "not-an-address")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("bind_address"));
    }
}
