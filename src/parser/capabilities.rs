use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parser::names::normalize_family;

/// Default commands and attributes a device family exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Device family name as written in the catalog.
    #[serde(alias = "devicetype")]
    pub family: String,
    /// Commands the family supports (e.g. `On`, `Toggle`).
    #[serde(default)]
    pub commands: Vec<String>,
    /// Readable attributes the family exposes (e.g. `OnOff`).
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// Read-only lookup of device family → default actions, keyed by normalized family.
#[derive(Debug, Clone, Default)]
pub struct CapabilityCatalog {
    entries: IndexMap<String, Capability>,
}

impl CapabilityCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load catalog entries from a JSON array. Later entries replace earlier ones.
    pub fn load_from_json(&mut self, json: &str) -> Result<()> {
        let parsed: Vec<Capability> =
            serde_json::from_str(json).map_err(Error::json("capability catalog"))?;
        for capability in parsed {
            self.insert(capability);
        }
        Ok(())
    }

    /// Register a single family.
    pub fn insert(&mut self, capability: Capability) {
        self.entries
            .insert(normalize_family(&capability.family), capability);
    }

    /// Look up a family, tolerating hyphen/underscore spelling differences.
    pub fn get(&self, family: &str) -> Option<&Capability> {
        self.entries.get(&normalize_family(family))
    }

    /// Look up a family, failing when the catalog has no entry for it.
    pub fn require(&self, family: &str) -> Result<&Capability> {
        self.get(family).ok_or_else(|| Error::UnknownFamily {
            family: family.to_string(),
        })
    }

    /// Normalized names of every family in the catalog.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of catalog entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no family is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
