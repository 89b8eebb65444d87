use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::generator::canonicalize::TypeMapping;
use crate::generator::resolver::TypeResolver;
use crate::parser::devices::DeviceConfig;
use crate::parser::names::instance_type_name;
use crate::parser::subjects::{SubjectCatalog, SubjectType};

/// Relation name linking users to their membership objects.
pub const MEMBER: &str = "member";

/// Relation name linking a group to its parent group.
pub const PARENT: &str = "parent";

/// A relationship tuple in `OpenFGA` write format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleKey {
    /// Subject, e.g. `user:alice` or `group:eng#member`.
    pub user: String,
    /// Relation on the object.
    pub relation: String,
    /// Object, `<type>:<id>`.
    pub object: String,
}

impl TupleKey {
    /// Build a tuple from its three fields.
    pub fn new(
        user: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }

    /// Type part of the object (`onofflightswitch_1` for `onofflightswitch_1:light101`).
    pub fn object_type(&self) -> &str {
        self.object
            .split_once(':')
            .map_or(self.object.as_str(), |(t, _)| t)
    }
}

/// Serialize tuples as a pretty-printed JSON array.
pub fn format_tuples(tuples: &[TupleKey]) -> Result<String> {
    serde_json::to_string_pretty(tuples).map_err(Error::json("relationship tuple"))
}

/// Role assignments rewritten to point at canonical device types.
///
/// Objects become `<canonical type>:<device id>`, the `room` role becomes
/// `has_device`, and group subjects are written as `group:<id>#member`.
/// Duplicate tuples are emitted once.
pub fn generate_device_tuples(
    devices: &[DeviceConfig],
    mapping: &[TypeMapping],
    subjects: &SubjectCatalog,
) -> Result<Vec<TupleKey>> {
    let resolver = TypeResolver::new(mapping);
    let mut tuples = Vec::new();
    let mut generated = HashSet::new();

    for device in devices {
        let instance_type = instance_type_name(&device.id, &device.family);
        let canonical = resolver.require(&device.id, &instance_type)?;
        let object = format!("{canonical}:{}", device.id);

        for (role, subject_ids) in &device.roles {
            for subject in subject_ids {
                let subject_type = subjects.require(subject, &device.id)?;
                let tuple = TupleKey::new(subject_type.subject(subject), role.relation(), &object);
                if generated.insert(tuple.clone()) {
                    tuples.push(tuple);
                }
            }
        }
    }

    Ok(tuples)
}

/// Membership and group-hierarchy tuples derived from the subject catalog.
///
/// - `user:<uid> member <column>:<value>` for every non-empty attribute value
/// - `group:<parent> parent group:<uid>` for every group with a parent
pub fn generate_user_tuples(subjects: &SubjectCatalog) -> Vec<TupleKey> {
    let mut tuples = Vec::new();
    let mut generated = HashSet::new();

    for (uid, column, value) in subjects.memberships() {
        let tuple = TupleKey::new(
            SubjectType::User.subject(uid),
            MEMBER,
            format!("{column}:{value}"),
        );
        if generated.insert(tuple.clone()) {
            tuples.push(tuple);
        }
    }

    for group in subjects.groups() {
        let Some(parent) = group.parent() else {
            continue;
        };
        let tuple = TupleKey::new(
            format!("group:{parent}"),
            PARENT,
            format!("group:{}", group.uid),
        );
        if generated.insert(tuple.clone()) {
            tuples.push(tuple);
        }
    }

    tuples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::subjects::{AttributeValue, GroupRecord, SubjectRecord};

    fn subjects() -> SubjectCatalog {
        let mut alice = SubjectRecord::new();
        alice.insert("uid".to_string(), AttributeValue::One("alice".to_string()));
        alice.insert(
            "group".to_string(),
            AttributeValue::Many(vec!["eng".to_string()]),
        );
        alice.insert("room".to_string(), AttributeValue::One("r101".to_string()));
        SubjectCatalog::new(
            vec![alice],
            vec![
                GroupRecord {
                    uid: "eng".to_string(),
                    parent: Some("staff".to_string()),
                },
                GroupRecord {
                    uid: "staff".to_string(),
                    parent: None,
                },
            ],
        )
    }

    fn mapping() -> Vec<TypeMapping> {
        vec![TypeMapping {
            type_name: "onofflightswitch_1".to_string(),
            typeset: vec!["light101".to_string(), "light102".to_string()],
        }]
    }

    #[test]
    fn device_tuples_use_canonical_types_and_rewrite_room() {
        let devices = [DeviceConfig::new("light101", "onofflightswitch")
            .with_role("admin", ["alice", "eng", "alice"])
            .with_role("room", ["r101"])];

        let tuples =
            generate_device_tuples(&devices, &mapping(), &subjects()).expect("tuples should build");

        assert_eq!(
            tuples,
            [
                TupleKey::new("user:alice", "admin", "onofflightswitch_1:light101"),
                TupleKey::new("group:eng#member", "admin", "onofflightswitch_1:light101"),
                TupleKey::new("room:r101", "has_device", "onofflightswitch_1:light101"),
            ]
        );
        assert_eq!(tuples[0].object_type(), "onofflightswitch_1");
    }

    #[test]
    fn unmapped_device_is_an_error() {
        let devices = [DeviceConfig::new("door9", "doorlock").with_role("admin", ["alice"])];
        let err = generate_device_tuples(&devices, &mapping(), &subjects())
            .expect_err("door9 has no canonical type");
        assert!(matches!(err, Error::UnmappedInstance { .. }));
    }

    #[test]
    fn user_tuples_cover_memberships_and_parents() {
        let tuples = generate_user_tuples(&subjects());
        assert_eq!(
            tuples,
            [
                TupleKey::new("user:alice", "member", "group:eng"),
                TupleKey::new("user:alice", "member", "room:r101"),
                TupleKey::new("group:staff", "parent", "group:eng"),
            ]
        );
    }

    #[test]
    fn format_tuples_emits_openfga_field_names() {
        let json = format_tuples(&[TupleKey::new("user:alice", "admin", "doorlock:door1")])
            .expect("tuples serialize");
        assert!(json.contains(r#""user": "user:alice""#), "{json}");
        assert!(json.contains(r#""object": "doorlock:door1""#), "{json}");
    }
}
