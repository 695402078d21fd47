//! TOML configuration parsing and validation.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use url::Url;

use crate::index::{CategoryDef, ALL_CATEGORY};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Ordered bucket definitions; the first must be the `all` sentinel.
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryDef>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the document store API, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// WebSocket endpoint for live updates, e.g. `ws://127.0.0.1:8000/ws`.
    /// Configured separately from `base_url` so split endpoints behind a
    /// TLS-terminating proxy keep working.
    pub ws_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Fuzzy dissimilarity threshold in `[0, 1]`; lower is stricter.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Default cap on displayed search results.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            limit: default_limit(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_threshold() -> f64 {
    0.3
}
fn default_limit() -> usize {
    50
}

fn default_categories() -> Vec<CategoryDef> {
    [
        (ALL_CATEGORY, "All Files"),
        ("Career", "Career"),
        ("Academic", "Academic"),
        ("Projects", "Projects"),
        ("Financial", "Financial"),
    ]
    .iter()
    .map(|(id, label)| CategoryDef {
        id: id.to_string(),
        label: label.to_string(),
    })
    .collect()
}

impl ApiConfig {
    /// Parsed WebSocket endpoint; also used for validation at load time.
    pub fn ws_url(&self) -> Result<Url> {
        let url = Url::parse(&self.ws_url).context("parsing api.ws_url")?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => anyhow::bail!("api.ws_url must use ws or wss, got '{}'", other),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.api.base_url.trim().is_empty() {
        anyhow::bail!("api.base_url must not be empty");
    }
    config.api.ws_url()?;

    if !(0.0..=1.0).contains(&config.retrieval.threshold) {
        anyhow::bail!("retrieval.threshold must be in [0.0, 1.0]");
    }
    if config.retrieval.limit < 1 {
        anyhow::bail!("retrieval.limit must be >= 1");
    }

    match config.categories.first() {
        Some(first) if first.id == ALL_CATEGORY => {}
        Some(first) => anyhow::bail!(
            "the first category must be the '{}' sentinel, got '{}'",
            ALL_CATEGORY,
            first.id
        ),
        None => anyhow::bail!("at least one category must be defined"),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docket.toml");
        fs::write(&path, content).unwrap();
        (tmp, path)
    }

    const MINIMAL: &str = r#"
[api]
base_url = "http://127.0.0.1:8000"
ws_url = "ws://127.0.0.1:8000/ws"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let (_tmp, path) = write_config(MINIMAL);
        let config = load_config(&path).unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.retrieval.threshold, 0.3);
        assert_eq!(config.retrieval.limit, 50);
        assert_eq!(config.categories.len(), 5);
        assert_eq!(config.categories[0].id, ALL_CATEGORY);
        assert_eq!(config.categories[0].label, "All Files");
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let (_tmp, path) = write_config(
            r#"
[api]
base_url = "http://127.0.0.1:8000"
ws_url = "ws://127.0.0.1:8000/ws"

[retrieval]
threshold = 1.5
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn ws_url_must_be_a_websocket_scheme() {
        let (_tmp, path) = write_config(
            r#"
[api]
base_url = "http://127.0.0.1:8000"
ws_url = "http://127.0.0.1:8000/ws"
"#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn first_category_must_be_the_all_sentinel() {
        let (_tmp, path) = write_config(
            r#"
[api]
base_url = "http://127.0.0.1:8000"
ws_url = "ws://127.0.0.1:8000/ws"

[[categories]]
id = "Career"
label = "Career"
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("sentinel"));
    }

    #[test]
    fn explicit_categories_override_defaults() {
        let (_tmp, path) = write_config(
            r#"
[api]
base_url = "http://127.0.0.1:8000"
ws_url = "ws://127.0.0.1:8000/ws"

[[categories]]
id = "all"
label = "Everything"

[[categories]]
id = "Legal"
label = "Legal"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[1].id, "Legal");
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(&tmp.path().join("absent.toml")).is_err());
    }
}
