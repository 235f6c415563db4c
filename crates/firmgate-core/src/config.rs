//! Engine configuration loaded from TOML

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::context::{EngineContext, HardwareIds, DEFAULT_ENGINE_ID};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSection,
    /// Extra runtime versions, keyed by component id
    #[serde(default)]
    pub runtime_versions: BTreeMap<String, String>,
    #[serde(default)]
    pub hwids: HwidsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSection {
    /// Identifier the engine's own version is registered under
    #[serde(default = "default_engine_id")]
    pub id: String,
    #[serde(default = "default_engine_version")]
    pub version: String,
    /// Refuse generic releases on enforce-requires devices even with force
    #[serde(default)]
    pub supported_build: bool,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            id: default_engine_id(),
            version: default_engine_version(),
            supported_build: false,
        }
    }
}

fn default_engine_id() -> String {
    DEFAULT_ENGINE_ID.to_string()
}

fn default_engine_version() -> String {
    "2.0.16".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HwidsSection {
    /// Hardware identity loading has completed
    #[serde(default)]
    pub loaded: bool,
    #[serde(default)]
    pub guids: Vec<String>,
}

impl EngineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Build the engine state snapshot
    ///
    /// An explicit `runtime_versions` entry for the engine id wins over
    /// `engine.version`.
    pub fn into_context(self) -> EngineContext {
        let mut ctx = EngineContext::new(&self.engine.version);
        if self.engine.id != DEFAULT_ENGINE_ID {
            ctx.engine_id = self.engine.id.clone();
            ctx.runtime_versions
                .insert(&self.engine.id, &self.engine.version);
        }
        for (id, version) in &self.runtime_versions {
            ctx.runtime_versions.insert(id, version);
        }
        if self.hwids.loaded {
            ctx.hwids = HardwareIds::loaded(&self.hwids.guids);
        }
        ctx.supported_build = self.engine.supported_build;
        ctx
    }
}
