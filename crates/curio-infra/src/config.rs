//! Configuration loader for curio.
//!
//! Reads `config.toml` from the data directory (`~/.curio/` in production)
//! into [`RecommenderConfig`]. Falls back to defaults when the file is
//! missing or malformed, and replaces invalid weight sets section by section.

use std::path::{Path, PathBuf};

use curio_types::config::RecommenderConfig;

/// Resolve the data directory: `CURIO_DATA_DIR`, else `~/.curio`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CURIO_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".curio");
    }

    PathBuf::from(".curio")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`RecommenderConfig::default()`].
/// - Unreadable or unparsable file: warning, then the default.
/// - Parsed file: invalid sections are swapped for defaults, one warning each.
pub async fn load_config(data_dir: &Path) -> RecommenderConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return RecommenderConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return RecommenderConfig::default();
        }
    };

    let parsed = match toml::from_str::<RecommenderConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            return RecommenderConfig::default();
        }
    };

    let (config, problems) = parsed.sanitized();
    for problem in &problems {
        tracing::warn!(path = %config_path.display(), "{problem}");
    }
    config
}
