//! Gateway configuration loader for Switchyard.
//!
//! Reads `config.toml` (`~/.switchyard/config.toml` by default) and
//! deserializes it into [`GatewayConfig`]. A missing file yields the
//! defaults and the built-in provider catalog. Unlike cosmetic settings the
//! catalog is load-bearing, so a file that exists but cannot be read or
//! parsed is an error.

use std::path::{Path, PathBuf};

use switchyard_types::config::GatewayConfig;
use switchyard_types::error::GatewayError;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "SWITCHYARD_CONFIG";

/// `~/.switchyard`, or `./.switchyard` when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".switchyard")
}

/// Pick the config file path.
///
/// Priority: explicit path (`--config`), then `SWITCHYARD_CONFIG`, then
/// `{data_dir}/config.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    resolve_config_path_with(explicit, std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

fn resolve_config_path_with(explicit: Option<&Path>, from_env: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match from_env {
        Some(path) if !path.as_os_str().is_empty() => path,
        _ => default_data_dir().join("config.toml"),
    }
}

/// Load configuration from `path`.
///
/// - Missing file: [`GatewayConfig::default()`].
/// - Unreadable or malformed file: [`GatewayError::Config`].
pub async fn load_gateway_config(path: &Path) -> Result<GatewayConfig, GatewayError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return Ok(GatewayConfig::default());
        }
        Err(err) => {
            return Err(GatewayError::Config(format!(
                "failed to read {}: {err}",
                path.display()
            )));
        }
    };

    let config = toml::from_str::<GatewayConfig>(&content)
        .map_err(|err| GatewayError::Config(format!("failed to parse {}: {err}", path.display())))?;

    tracing::debug!(
        path = %path.display(),
        providers = config.providers.len(),
        "Loaded gateway config"
    );
    Ok(config)
}
