use crate::error::{Error, Result};

/// Normalize a device family into an `OpenFGA`-safe type fragment.
///
/// Type names may not contain hyphens, so `room-airconditioner` becomes
/// `room_airconditioner`. Surrounding whitespace is dropped.
pub fn normalize_family(family: &str) -> String {
    family.trim().replace('-', "_")
}

/// Per-instance type name used before canonicalization: `<instance>_<family>`.
///
/// Examples:
/// - `("light105", "onofflightswitch")` -> `"light105_onofflightswitch"`
/// - `("aircon105", "room-airconditioner")` -> `"aircon105_room_airconditioner"`
pub fn instance_type_name(instance_id: &str, family: &str) -> String {
    format!("{instance_id}_{}", normalize_family(family))
}

/// Reject identifiers that would break `type:id` tuple syntax.
///
/// Rules:
/// - must not be empty after trimming
/// - must not contain whitespace, `:` or `#`
pub fn validate_object_id(field: &str, value: &str) -> Result<()> {
    let reason = if value.trim().is_empty() {
        Some("must not be empty")
    } else if value.chars().any(char::is_whitespace) {
        Some("must not contain whitespace")
    } else if value.contains(':') || value.contains('#') {
        Some("must not contain ':' or '#'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidIdentifier {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Reject identifiers that also become type names and so may not contain hyphens.
pub fn validate_type_safe_id(field: &str, value: &str) -> Result<()> {
    validate_object_id(field, value)?;
    if value.contains('-') {
        return Err(Error::InvalidIdentifier {
            field: field.to_string(),
            value: value.to_string(),
            reason: format!("replace '-' with '_' (e.g. '{}')", value.replace('-', "_")),
        });
    }
    Ok(())
}
