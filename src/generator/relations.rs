use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::parser::capabilities::CapabilityCatalog;
use crate::parser::devices::{DeviceConfig, RoleKey, COMMON_ACTION};
use crate::parser::names::{instance_type_name, normalize_family};
use crate::parser::subjects::{SubjectCatalog, SubjectType};

/// One `define <key>: <expr>` line of a type block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RelationStatement {
    key: String,
    text: String,
}

impl RelationStatement {
    /// Build a statement from a relation name and its rewrite expression.
    pub fn new(key: impl Into<String>, expr: &str) -> Self {
        let key = key.into();
        let text = format!("define {key}: {}", expr.trim());
        Self { key, text }
    }

    /// Relation name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Fully rendered statement.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered relation statements with unique keys; the first statement for a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationList {
    statements: Vec<RelationStatement>,
}

impl RelationList {
    /// Append a statement unless its key is already present. Returns whether it was kept.
    pub fn push(&mut self, statement: RelationStatement) -> bool {
        if self.statements.iter().any(|s| s.key == statement.key) {
            return false;
        }
        self.statements.push(statement);
        true
    }

    /// Statements in insertion order.
    pub fn statements(&self) -> &[RelationStatement] {
        &self.statements
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// True when no statement was kept.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Copy of this list ordered by relation name.
    pub fn sorted_by_key(&self) -> Self {
        let mut statements = self.statements.clone();
        statements.sort_by(|a, b| a.key.cmp(&b.key));
        Self { statements }
    }

    /// Stable serialization used to detect identical access-control shapes.
    ///
    /// Two lists share a key iff their statement texts are equal in the same order.
    pub fn relation_set_key(&self) -> String {
        serde_json::Value::from(
            self.statements
                .iter()
                .map(|s| s.text.clone())
                .collect::<Vec<_>>(),
        )
        .to_string()
    }
}

/// A device instance with its assembled relations, ready for canonicalization.
///
/// Only produced by [`assemble`], which guarantees at least one relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDevice {
    instance_id: String,
    family: String,
    instance_type: String,
    relations: RelationList,
}

impl AssembledDevice {
    /// Device id.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Normalized device family.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Per-instance type name, `<instance>_<family>`.
    pub fn instance_type(&self) -> &str {
        &self.instance_type
    }

    /// Assembled relation statements.
    pub fn relations(&self) -> &RelationList {
        &self.relations
    }
}

/// Assemble the relation statements of one device.
///
/// Order is fixed: roles in configuration order, then actions in selection order,
/// then catalog commands and attributes in catalog order.
pub fn assemble(
    device: &DeviceConfig,
    catalog: &CapabilityCatalog,
    subjects: &SubjectCatalog,
) -> Result<AssembledDevice> {
    let capability = catalog.require(&device.family)?;
    let mut relations = RelationList::default();

    for (role, subject_ids) in &device.roles {
        let mut tags: Vec<String> = if role.is_structural() {
            vec![SubjectType::User.tag(), SubjectType::Group.tag()]
        } else if *role == RoleKey::Room {
            vec!["room".to_string()]
        } else {
            Vec::new()
        };
        for subject in subject_ids {
            let tag = subjects.require(subject, &device.id)?.tag();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        relations.push(RelationStatement::new(
            role.relation(),
            &format!("[{}]", tags.join(", ")),
        ));
    }

    let mut customized: HashSet<&str> = HashSet::new();
    for (action, expr) in &device.actions {
        if action == COMMON_ACTION {
            relations.push(RelationStatement::new(COMMON_ACTION, expr));
        } else {
            relations.push(RelationStatement::new(format!("can_{action}"), expr));
            customized.insert(action.as_str());
        }
    }

    for name in capability.commands.iter().chain(&capability.attributes) {
        if customized.contains(name.as_str()) {
            continue;
        }
        relations.push(RelationStatement::new(format!("can_{name}"), COMMON_ACTION));
    }

    if relations.is_empty() {
        return Err(Error::EmptyRelations {
            device: device.id.clone(),
        });
    }

    debug!(
        device = %device.id,
        family = %device.family,
        relations = relations.len(),
        "assembled device relations"
    );

    Ok(AssembledDevice {
        instance_id: device.id.clone(),
        family: normalize_family(&device.family),
        instance_type: instance_type_name(&device.id, &device.family),
        relations,
    })
}

/// Assemble every device, stopping at the first failure.
pub fn assemble_all(
    devices: &[DeviceConfig],
    catalog: &CapabilityCatalog,
    subjects: &SubjectCatalog,
) -> Result<Vec<AssembledDevice>> {
    devices
        .iter()
        .map(|device| assemble(device, catalog, subjects))
        .collect()
}
