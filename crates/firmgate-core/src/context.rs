//! Read-only machine state consulted by requirement checks

use std::collections::{BTreeMap, BTreeSet};

/// Identifier the engine's own minimum-version gates are expressed against
pub const DEFAULT_ENGINE_ID: &str = "org.freedesktop.fwupd";

/// Component id to version, e.g. the engine itself or the kernel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeVersions(BTreeMap<String, String>);

impl RuntimeVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, version: &str) {
        self.0.insert(id.to_string(), version.to_string());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// GUIDs derived from the live machine's hardware identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardwareIds {
    guids: BTreeSet<String>,
    /// Hardware identity loading has completed
    pub loaded: bool,
}

impl HardwareIds {
    /// An identity set that has finished loading
    pub fn loaded<I, S>(guids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            guids: guids
                .into_iter()
                .map(|g| g.as_ref().to_ascii_lowercase())
                .collect(),
            loaded: true,
        }
    }

    pub fn contains(&self, guid: &str) -> bool {
        self.guids.contains(&guid.to_ascii_lowercase())
    }

    pub fn insert(&mut self, guid: &str) {
        self.guids.insert(guid.to_ascii_lowercase());
    }

    pub fn len(&self) -> usize {
        self.guids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guids.is_empty()
    }
}

/// Snapshot of engine state for the duration of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineContext {
    pub engine_id: String,
    pub runtime_versions: RuntimeVersions,
    pub hwids: HardwareIds,
    /// Strict handling of devices that enforce specific requirements
    pub supported_build: bool,
}

impl EngineContext {
    /// Context for an engine at `version`, with no hardware identity loaded
    pub fn new(engine_version: &str) -> Self {
        let mut runtime_versions = RuntimeVersions::new();
        runtime_versions.insert(DEFAULT_ENGINE_ID, engine_version);
        Self {
            engine_id: DEFAULT_ENGINE_ID.to_string(),
            runtime_versions,
            hwids: HardwareIds::default(),
            supported_build: false,
        }
    }

    /// The engine's own runtime version, if registered
    pub fn engine_version(&self) -> Option<&str> {
        self.runtime_versions.get(&self.engine_id)
    }
}
