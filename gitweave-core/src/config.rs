use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::edges::EdgeHelper;
use crate::error::ConfigError;
use crate::log::{IgnoreMode, NetworkPreset, NodeSpec};
use crate::predicate::Predicate;
use crate::types::AttrValue;

/// Top-level gitweave configuration, matching `gitweave.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitweaveConfig {
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub nodes: NodeSpec,
    #[serde(default)]
    pub filters: Vec<FilterRule>,
    #[serde(default)]
    pub ignore: IgnoreSection,
    #[serde(default)]
    pub export: ExportSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    /// Named preset; when set it supplies mode, helper, and attribute defaults.
    pub preset: Option<String>,
    pub mode1: String,
    pub mode2: String,
    pub helper: EdgeHelper,
    /// Record tags copied onto every edge.
    pub edge_attributes: Vec<String>,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            preset: None,
            mode1: "author".to_string(),
            mode2: "files".to_string(),
            helper: EdgeHelper::Simple,
            edge_attributes: vec!["date".to_string()],
        }
    }
}

/// One `[[filters]]` entry, applied in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    pub tag: String,
    pub fun: String,
    pub value: AttrValue,
    #[serde(default)]
    pub negate: bool,
}

impl FilterRule {
    pub fn predicate(&self) -> Result<Predicate, ConfigError> {
        Predicate::new(&self.fun, self.value.clone())
            .map_err(|e| ConfigError::Invalid(format!("filter on '{}': {e}", self.tag)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreSection {
    /// Regular expressions over file paths.
    pub patterns: Vec<String>,
    pub mode: IgnoreMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Edge attribute columns written after `id1,id2`.
    pub edge_columns: Vec<String>,
    /// Node attribute columns written after `id,type`.
    pub node_columns: Vec<String>,
    /// Record tags left out of TSV output.
    pub tsv_ignore: Vec<String>,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            edge_columns: vec!["weight".to_string(), "date".to_string()],
            node_columns: Vec::new(),
            tsv_ignore: vec!["message".to_string(), "changes".to_string()],
        }
    }
}

impl GitweaveConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), filters = config.filters.len(), "Loaded config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that modes are set, the preset exists, and every filter and
    /// ignore pattern compiles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.network.preset {
            NetworkPreset::named(name).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if self.network.mode1.trim().is_empty() || self.network.mode2.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "network.mode1 and network.mode2 must be non-empty".to_string(),
            ));
        }
        for rule in &self.filters {
            rule.predicate()?;
        }
        for pattern in &self.ignore.patterns {
            regex::Regex::new(pattern)
                .map_err(|e| ConfigError::Invalid(format!("ignore pattern '{pattern}': {e}")))?;
        }
        Ok(())
    }

    /// The network parameters this config describes.
    ///
    /// A named preset wins over the individual `[network]` and `[nodes]`
    /// settings.
    pub fn network_preset(&self) -> Result<NetworkPreset, ConfigError> {
        match &self.network.preset {
            Some(name) => NetworkPreset::named(name).map_err(|e| ConfigError::Invalid(e.to_string())),
            None => Ok(NetworkPreset {
                mode1: self.network.mode1.clone(),
                mode2: self.network.mode2.clone(),
                helper: self.network.helper,
                edge_attributes: self.network.edge_attributes.clone(),
                nodes: self.nodes.clone(),
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
