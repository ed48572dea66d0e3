//! Catalog configuration
//!
//! Sources are declared in a JSON file. The `kind` field selects the
//! connector implementation, so adding a store means adding a kind here
//! and one `SourceConnector` implementation.

use crate::connector::{Dialect, SourceConnector};
use crate::error::{Error, Result};
use crate::memory::MemoryConnector;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_INTERVAL_MINUTES: u64 = 5;
pub const DEFAULT_SAMPLE_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_interval_minutes() -> u64 {
    DEFAULT_INTERVAL_MINUTES
}

fn default_sample_limit() -> usize {
    DEFAULT_SAMPLE_LIMIT
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            sources: Vec::new(),
        }
    }
}

/// Connector implementation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    /// Records inlined in the config
    Memory,
    /// JSON array of objects on disk
    JsonFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub key: String,
    pub brand_label: String,
    pub kind: ConnectorKind,
    pub dialect: Dialect,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<Record>,
}

fn default_available() -> bool {
    true
}

impl CatalogConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: CatalogConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_minutes == 0 {
            return Err(Error::InvalidConfig("interval_minutes must be positive".into()));
        }
        if self.sample_limit == 0 {
            return Err(Error::InvalidConfig("sample_limit must be positive".into()));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.key.trim().is_empty() {
                return Err(Error::InvalidConfig("source key cannot be empty".into()));
            }
            if !seen.insert(source.key.as_str()) {
                return Err(Error::InvalidConfig(format!("duplicate source key: {}", source.key)));
            }
            if source.kind == ConnectorKind::JsonFile && source.path.is_none() {
                return Err(Error::InvalidConfig(format!(
                    "source {} is json_file but has no path",
                    source.key
                )));
            }
        }
        Ok(())
    }

    /// Build every configured connector, in declaration order.
    pub fn build_connectors(&self) -> Result<Vec<Arc<dyn SourceConnector>>> {
        self.sources.iter().map(connector_from_config).collect()
    }
}

/// Connector factory keyed by `SourceConfig::kind`
pub fn connector_from_config(config: &SourceConfig) -> Result<Arc<dyn SourceConnector>> {
    let records = match config.kind {
        ConnectorKind::Memory => config.records.clone(),
        ConnectorKind::JsonFile => {
            let path = config.path.as_ref().ok_or_else(|| {
                Error::InvalidConfig(format!("source {} has no path", config.key))
            })?;
            load_records(path)?
        }
    };

    let connector = MemoryConnector::new(&config.key, &config.brand_label, config.dialect, records);
    connector.set_available(config.available);
    Ok(Arc::new(connector))
}

fn load_records(path: &Path) -> Result<Vec<Record>> {
    let raw = std::fs::read_to_string(path)?;
    let Value::Array(items) = serde_json::from_str::<Value>(&raw)? else {
        return Err(Error::InvalidConfig(format!(
            "{} must contain a JSON array",
            path.display()
        )));
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            other => Err(Error::InvalidConfig(format!(
                "expected objects in {}, found {}",
                path.display(),
                other
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config: CatalogConfig = serde_json::from_str(r#"{"sources": []}"#).unwrap();
        assert_eq!(config.interval_minutes, 5);
        assert_eq!(config.sample_limit, 100);
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let config: CatalogConfig = serde_json::from_str(
            r#"{"sources": [
                {"key": "zara", "brand_label": "Zara", "kind": "memory", "dialect": "structured"},
                {"key": "zara", "brand_label": "Zara", "kind": "memory", "dialect": "structured"}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_json_file_connector() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("zara.json");
        let mut file = std::fs::File::create(&data_path).unwrap();
        write!(file, r#"[{{"_id": "Z1", "colour": "red"}}, {{"_id": "Z2", "colour": "blue"}}]"#)
            .unwrap();

        let config_path = dir.path().join("catalog.json");
        std::fs::write(
            &config_path,
            serde_json::json!({
                "interval_minutes": 1,
                "sources": [{
                    "key": "zara",
                    "brand_label": "Zara",
                    "kind": "json_file",
                    "dialect": "structured",
                    "path": data_path,
                }]
            })
            .to_string(),
        )
        .unwrap();

        let config = CatalogConfig::load(&config_path).unwrap();
        let connectors = config.build_connectors().unwrap();
        assert_eq!(connectors.len(), 1);
        assert_eq!(connectors[0].source_key(), "zara");

        let sample = connectors[0].fetch_sample(10).await.unwrap();
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.fields, vec!["_id", "colour"]);
    }

    #[test]
    fn test_json_file_requires_path() {
        let config: CatalogConfig = serde_json::from_str(
            r#"{"sources": [{"key": "vh", "brand_label": "Van Heusen", "kind": "json_file", "dialect": "text"}]}"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
