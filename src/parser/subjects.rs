use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parser::names::{validate_object_id, validate_type_safe_id};

/// Attribute keys that describe a subject row rather than a membership.
const NON_MEMBERSHIP_KEYS: [&str; 3] = ["id", "uid", "name"];

/// Column holding the user id in a subject row.
pub const UID_KEY: &str = "uid";

/// Column holding group memberships in a subject row.
pub const GROUP_KEY: &str = "group";

/// A single cell of a subject row: one value or a comma-split list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Single value (may be empty).
    One(String),
    /// Multiple values.
    Many(Vec<String>),
}

impl AttributeValue {
    /// Non-empty values held by this cell.
    pub fn values(&self) -> Vec<&str> {
        match self {
            AttributeValue::One(v) => {
                if v.trim().is_empty() {
                    Vec::new()
                } else {
                    vec![v.as_str()]
                }
            }
            AttributeValue::Many(vs) => vs
                .iter()
                .map(String::as_str)
                .filter(|v| !v.trim().is_empty())
                .collect(),
        }
    }

    fn contains(&self, needle: &str) -> bool {
        match self {
            AttributeValue::One(v) => v == needle,
            AttributeValue::Many(vs) => vs.iter().any(|v| v == needle),
        }
    }
}

/// One row of the user-attribute sheet, columns kept in header order.
pub type SubjectRecord = IndexMap<String, AttributeValue>;

/// One row of the user-groups sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Group identifier.
    pub uid: String,
    /// Parent group identifier; empty or absent for top-level groups.
    #[serde(default)]
    pub parent: Option<String>,
}

impl GroupRecord {
    /// Parent group id, if one is set.
    pub fn parent(&self) -> Option<&str> {
        self.parent
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Type of a subject referenced by a role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubjectType {
    /// An individual user (`uid` column).
    User,
    /// A user group; permissions flow through `group#member`.
    Group,
    /// Any other membership set (e.g. `room`).
    Other(String),
}

impl SubjectType {
    fn from_key(key: &str) -> Self {
        match key {
            UID_KEY => SubjectType::User,
            GROUP_KEY => SubjectType::Group,
            other => SubjectType::Other(other.to_string()),
        }
    }

    /// Type restriction tag used inside a `define` statement.
    ///
    /// Examples: `user`, `group#member`, `room`.
    pub fn tag(&self) -> String {
        match self {
            SubjectType::User => "user".to_string(),
            SubjectType::Group => "group#member".to_string(),
            SubjectType::Other(key) => key.clone(),
        }
    }

    /// Tuple `user` field for a subject of this type.
    ///
    /// Examples: `user:alice`, `group:eng#member`, `room:r101`.
    pub fn subject(&self, id: &str) -> String {
        match self {
            SubjectType::User => format!("user:{id}"),
            SubjectType::Group => format!("group:{id}#member"),
            SubjectType::Other(key) => format!("{key}:{id}"),
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// User attributes and groups used to resolve subject ids to their types.
#[derive(Debug, Clone, Default)]
pub struct SubjectCatalog {
    records: Vec<SubjectRecord>,
    groups: Vec<GroupRecord>,
}

impl SubjectCatalog {
    /// Build a catalog from already-decoded rows.
    pub fn new(records: Vec<SubjectRecord>, groups: Vec<GroupRecord>) -> Self {
        Self { records, groups }
    }

    /// Decode user-attribute rows and (optionally) group rows from JSON.
    pub fn from_json(records_json: &str, groups_json: Option<&str>) -> Result<Self> {
        let records: Vec<SubjectRecord> =
            serde_json::from_str(records_json).map_err(Error::json("subject catalog"))?;
        let groups: Vec<GroupRecord> = match groups_json {
            Some(json) => serde_json::from_str(json).map_err(Error::json("group list"))?,
            None => Vec::new(),
        };
        let catalog = Self::new(records, groups);
        catalog.validate()?;
        Ok(catalog)
    }

    /// Subject rows in input order.
    pub fn records(&self) -> &[SubjectRecord] {
        &self.records
    }

    /// Group rows in input order.
    pub fn groups(&self) -> &[GroupRecord] {
        &self.groups
    }

    /// Check ids and group references before any model is generated.
    ///
    /// Group ids become object ids of the `group` type and must be hyphen-free.
    /// When group rows are present, every group named in a subject row must be one of them.
    pub fn validate(&self) -> Result<()> {
        for group in &self.groups {
            validate_type_safe_id("groups.uid", &group.uid)?;
            if let Some(parent) = group.parent() {
                validate_type_safe_id("groups.parent", parent)?;
            }
        }

        let known_groups: BTreeSet<&str> = self.groups.iter().map(|g| g.uid.as_str()).collect();
        for record in &self.records {
            for (key, value) in record {
                if key == "id" || key == "name" {
                    continue;
                }
                for v in value.values() {
                    validate_object_id(&format!("subjects.{key}"), v)?;
                    if key == GROUP_KEY && !known_groups.is_empty() && !known_groups.contains(v) {
                        return Err(Error::InvalidIdentifier {
                            field: "subjects.group".to_string(),
                            value: v.to_string(),
                            reason: "group is not defined in the group list".to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve a subject id to its type by scanning rows in order.
    ///
    /// The first column (other than `id`/`name`) whose value contains the id decides
    /// the type; group rows are consulted last. Returns `None` for unknown ids.
    pub fn resolve(&self, subject: &str) -> Option<SubjectType> {
        for record in &self.records {
            for (key, value) in record {
                if key == "id" || key == "name" {
                    continue;
                }
                if value.contains(subject) {
                    return Some(SubjectType::from_key(key));
                }
            }
        }
        self.groups
            .iter()
            .any(|g| g.uid == subject)
            .then_some(SubjectType::Group)
    }

    /// Like [`SubjectCatalog::resolve`], but an unknown id is a hard error.
    pub fn require(&self, subject: &str, device: &str) -> Result<SubjectType> {
        self.resolve(subject).ok_or_else(|| Error::AmbiguousSubject {
            subject: subject.to_string(),
            device: device.to_string(),
        })
    }

    /// Membership columns other than `group`, in first-seen order.
    ///
    /// Each becomes a schema type whose `member` relation holds users.
    pub fn membership_types(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for record in &self.records {
            for key in record.keys() {
                if NON_MEMBERSHIP_KEYS.contains(&key.as_str()) || key == GROUP_KEY {
                    continue;
                }
                if !out.contains(key) {
                    out.push(key.clone());
                }
            }
        }
        out
    }

    /// Every membership pair `(user id, column, value)` in row order.
    pub fn memberships(&self) -> Vec<(&str, &str, &str)> {
        let mut out = Vec::new();
        for record in &self.records {
            let Some(uid) = record
                .get(UID_KEY)
                .and_then(|v| v.values().first().copied())
            else {
                continue;
            };
            for (key, value) in record {
                if NON_MEMBERSHIP_KEYS.contains(&key.as_str()) {
                    continue;
                }
                for v in value.values() {
                    out.push((uid, key.as_str(), v));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBJECTS: &str = r#"[
        {"id": "1", "uid": "alice", "name": "Alice", "group": ["eng", "ops"], "room": "r101"},
        {"id": "2", "uid": "bob", "name": "Bob", "group": "ops", "room": ""}
    ]"#;

    const GROUPS: &str = r#"[
        {"uid": "eng", "parent": "staff"},
        {"uid": "ops", "parent": ""},
        {"uid": "staff"}
    ]"#;

    fn catalog() -> SubjectCatalog {
        SubjectCatalog::from_json(SUBJECTS, Some(GROUPS)).expect("catalog should load")
    }

    #[test]
    fn resolve_maps_columns_to_subject_types() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("alice"), Some(SubjectType::User));
        assert_eq!(catalog.resolve("eng"), Some(SubjectType::Group));
        assert_eq!(
            catalog.resolve("r101"),
            Some(SubjectType::Other("room".to_string()))
        );
        // Only known through the group sheet.
        assert_eq!(catalog.resolve("staff"), Some(SubjectType::Group));
    }

    #[test]
    fn resolve_ignores_name_and_id_columns() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("Alice"), None);
        assert_eq!(catalog.resolve("1"), None);

        let err = catalog.require("Alice", "light101").expect_err("name is not a subject");
        assert!(matches!(err, Error::AmbiguousSubject { .. }));
        assert!(err.to_string().contains("light101"));
    }

    #[test]
    fn subject_type_renders_tags_and_tuple_subjects() {
        assert_eq!(SubjectType::Group.tag(), "group#member");
        assert_eq!(SubjectType::Group.subject("eng"), "group:eng#member");
        assert_eq!(SubjectType::User.subject("alice"), "user:alice");
        assert_eq!(
            SubjectType::Other("room".to_string()).subject("r101"),
            "room:r101"
        );
    }

    #[test]
    fn membership_types_and_pairs_follow_row_order() {
        let catalog = catalog();
        assert_eq!(catalog.membership_types(), ["room"]);
        assert_eq!(
            catalog.memberships(),
            [
                ("alice", "group", "eng"),
                ("alice", "group", "ops"),
                ("alice", "room", "r101"),
                ("bob", "group", "ops"),
            ]
        );
    }

    #[test]
    fn validate_rejects_undefined_groups_and_hyphens() {
        let err = SubjectCatalog::from_json(SUBJECTS, Some(r#"[{"uid": "eng"}]"#))
            .expect_err("ops is undefined");
        assert!(err.to_string().contains("ops"));

        let err = SubjectCatalog::from_json("[]", Some(r#"[{"uid": "dev-team"}]"#))
            .expect_err("hyphenated group");
        assert!(matches!(err, Error::InvalidIdentifier { .. }));
    }

    #[test]
    fn group_parent_treats_blank_as_none() {
        let catalog = catalog();
        let parents: Vec<Option<&str>> = catalog.groups().iter().map(GroupRecord::parent).collect();
        assert_eq!(parents, [Some("staff"), None, None]);
    }
}
