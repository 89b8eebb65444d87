use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parser::capabilities::CapabilityCatalog;
use crate::parser::names::validate_object_id;

/// Action key reserved for "every action not customized individually".
pub const COMMON_ACTION: &str = "can_action";

/// Relation name that replaces the `room` role in both model and tuples.
pub const HAS_DEVICE: &str = "has_device";

/// Role a subject holds on a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleKey {
    /// Full control.
    Admin,
    /// Restricted control.
    Junior,
    /// Minimal control.
    Guest,
    /// Room the device is installed in; emitted as `has_device`.
    Room,
    /// Operator-defined role, emitted verbatim.
    Custom(String),
}

impl RoleKey {
    /// True for the three user-facing roles that always admit users and group members.
    pub fn is_structural(&self) -> bool {
        matches!(self, RoleKey::Admin | RoleKey::Junior | RoleKey::Guest)
    }

    /// Relation name this role is written under.
    pub fn relation(&self) -> &str {
        match self {
            RoleKey::Admin => "admin",
            RoleKey::Junior => "junior",
            RoleKey::Guest => "guest",
            RoleKey::Room => HAS_DEVICE,
            RoleKey::Custom(name) => name,
        }
    }

    fn as_input(&self) -> &str {
        match self {
            RoleKey::Room => "room",
            other => other.relation(),
        }
    }
}

impl From<String> for RoleKey {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => RoleKey::Admin,
            "junior" => RoleKey::Junior,
            "guest" => RoleKey::Guest,
            "room" => RoleKey::Room,
            _ => RoleKey::Custom(value),
        }
    }
}

impl From<&str> for RoleKey {
    fn from(value: &str) -> Self {
        RoleKey::from(value.to_string())
    }
}

impl From<RoleKey> for String {
    fn from(value: RoleKey) -> Self {
        value.as_input().to_string()
    }
}

impl fmt::Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_input())
    }
}

/// Access-control configuration collected for one physical device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device identifier, used as the tuple object id.
    #[serde(alias = "device")]
    pub id: String,
    /// Device family (capability catalog key).
    #[serde(alias = "type")]
    pub family: String,
    /// Role → subject ids, in the order the roles were configured.
    #[serde(default)]
    pub roles: IndexMap<RoleKey, Vec<String>>,
    /// Action → permission expression, in selection order.
    /// The key [`COMMON_ACTION`] sets the fallback for all remaining actions.
    #[serde(default)]
    pub actions: IndexMap<String, String>,
}

impl DeviceConfig {
    /// Create a device with no roles or actions.
    pub fn new(id: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            family: family.into(),
            roles: IndexMap::new(),
            actions: IndexMap::new(),
        }
    }

    /// Builder-style role assignment.
    pub fn with_role<I, S>(mut self, role: impl Into<RoleKey>, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles
            .insert(role.into(), subjects.into_iter().map(Into::into).collect());
        self
    }

    /// Builder-style action permission.
    pub fn with_action(mut self, action: impl Into<String>, expression: impl Into<String>) -> Self {
        self.actions.insert(action.into(), expression.into());
        self
    }
}

/// Decode device configuration rows from JSON.
pub fn load_devices(json: &str) -> Result<Vec<DeviceConfig>> {
    serde_json::from_str(json).map_err(Error::json("device configuration"))
}

/// Check device ids and families before assembly.
///
/// Ids must be usable as tuple object ids and unique; every family must exist
/// in the capability catalog.
pub fn validate_devices(devices: &[DeviceConfig], catalog: &CapabilityCatalog) -> Result<()> {
    let mut seen = HashSet::new();
    for device in devices {
        validate_object_id("devices.id", &device.id)?;
        if !seen.insert(device.id.as_str()) {
            return Err(Error::DuplicateDevice {
                device: device.id.clone(),
            });
        }
        catalog.require(&device.family)?;
    }
    Ok(())
}
