use std::collections::BTreeSet;
use std::fmt::Write;

use tracing::info;

use crate::error::Result;
use crate::generator::canonicalize::{canonicalize, CanonicalModel, CanonicalizeOptions};
use crate::generator::relations::{assemble_all, RelationStatement};
use crate::generator::tuple_generator::{
    generate_device_tuples, generate_user_tuples, TupleKey, MEMBER, PARENT,
};
use crate::parser::capabilities::CapabilityCatalog;
use crate::parser::devices::{validate_devices, DeviceConfig};
use crate::parser::subjects::{SubjectCatalog, GROUP_KEY};

/// Subject types declared in every model, ahead of membership columns.
const BUILTIN_SUBJECT_TYPES: [&str; 3] = ["user", GROUP_KEY, "room"];

/// Options for a full generation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Merge devices whose relations only differ in statement order.
    pub sort_relations: bool,
}

/// Generated `OpenFGA` model, canonicalization details and tuples.
#[derive(Debug, Clone)]
pub struct GeneratedModel {
    /// The complete `OpenFGA` DSL text.
    pub dsl: String,
    /// Device canonicalization outcome (type mapping, groups, per-family counts).
    pub canonical: CanonicalModel,
    /// User tuples followed by device tuples.
    pub tuples: Vec<TupleKey>,
}

#[derive(Debug, Clone)]
struct TypePlan {
    type_name: String,
    relations: Vec<RelationStatement>,
}

impl TypePlan {
    fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            relations: Vec::new(),
        }
    }

    fn define(mut self, relation: &str, expr: &str) -> Self {
        self.relations.push(RelationStatement::new(relation, expr));
        self
    }
}

/// Build the complete model and tuples for a set of devices.
///
/// Devices are validated, assembled, folded into canonical types, and their role
/// assignments rewritten against the canonical types. Subject types come first in
/// the schema, device types after.
pub fn generate_model(
    devices: &[DeviceConfig],
    catalog: &CapabilityCatalog,
    subjects: &SubjectCatalog,
    options: GenerateOptions,
) -> Result<GeneratedModel> {
    validate_devices(devices, catalog)?;
    let assembled = assemble_all(devices, catalog, subjects)?;

    let user_types = user_type_plans(subjects);
    let canonicalize_options = CanonicalizeOptions {
        sort_relations: options.sort_relations,
        reserved_types: user_types
            .iter()
            .map(|t| t.type_name.clone())
            .collect::<BTreeSet<_>>(),
    };
    let canonical = canonicalize(&assembled, &canonicalize_options);

    let mut dsl = String::new();
    writeln!(dsl, "model").unwrap();
    writeln!(dsl, "  schema 1.1").unwrap();
    for plan in &user_types {
        writeln!(dsl).unwrap();
        render_type(&mut dsl, plan);
    }
    if !canonical.dsl.is_empty() {
        writeln!(dsl).unwrap();
        dsl.push_str(&canonical.dsl);
    }

    let mut tuples = generate_user_tuples(subjects);
    tuples.extend(generate_device_tuples(devices, &canonical.mapping, subjects)?);

    info!(
        devices = devices.len(),
        device_types = canonical.groups.len(),
        tuples = tuples.len(),
        "generated authorization model"
    );

    Ok(GeneratedModel {
        dsl,
        canonical,
        tuples,
    })
}

/// Subject-side type definitions.
///
/// `user` has no relations; `group` supports nesting through `parent`; `room` and
/// every other membership column hold users through `member`.
fn user_type_plans(subjects: &SubjectCatalog) -> Vec<TypePlan> {
    let mut plans = vec![
        TypePlan::new("user"),
        TypePlan::new(GROUP_KEY)
            .define(PARENT, "[group]")
            .define(MEMBER, &format!("[user] or {MEMBER} from {PARENT}")),
        TypePlan::new("room").define(MEMBER, "[user]"),
    ];
    for column in subjects.membership_types() {
        if BUILTIN_SUBJECT_TYPES.contains(&column.as_str()) {
            continue;
        }
        plans.push(TypePlan::new(column).define(MEMBER, "[user]"));
    }
    plans
}

fn render_type(dsl: &mut String, plan: &TypePlan) {
    writeln!(dsl, "type {}", plan.type_name).unwrap();
    if plan.relations.is_empty() {
        return;
    }
    writeln!(dsl, "  relations").unwrap();
    for statement in &plan.relations {
        writeln!(dsl, "    {}", statement.text()).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::capabilities::Capability;
    use crate::parser::devices::COMMON_ACTION;
    use crate::parser::subjects::{AttributeValue, SubjectRecord};

    fn subjects() -> SubjectCatalog {
        let mut alice = SubjectRecord::new();
        alice.insert("uid".to_string(), AttributeValue::One("alice".to_string()));
        alice.insert("floor".to_string(), AttributeValue::One("f1".to_string()));
        SubjectCatalog::new(vec![alice], Vec::new())
    }

    fn catalog() -> CapabilityCatalog {
        let mut catalog = CapabilityCatalog::new();
        catalog.insert(Capability {
            family: "doorlock".to_string(),
            commands: vec!["LockDoor".to_string()],
            attributes: Vec::new(),
        });
        catalog
    }

    #[test]
    fn model_declares_subject_types_before_device_types() {
        let devices = [DeviceConfig::new("door1", "doorlock")
            .with_role("admin", ["alice"])
            .with_action(COMMON_ACTION, "admin")];
        let model = generate_model(&devices, &catalog(), &subjects(), GenerateOptions::default())
            .expect("model should generate");

        let type_lines: Vec<&str> = model
            .dsl
            .lines()
            .filter(|l| l.starts_with("type "))
            .collect();
        assert_eq!(
            type_lines,
            [
                "type user",
                "type group",
                "type room",
                "type floor",
                "type doorlock"
            ]
        );
        assert!(model.dsl.starts_with("model\n  schema 1.1\n\ntype user\n"));
        assert!(model
            .dsl
            .contains("    define member: [user] or member from parent\n"));
        assert_eq!(
            model.tuples.last(),
            Some(&TupleKey::new("user:alice", "admin", "doorlock:door1"))
        );
    }

    #[test]
    fn invalid_devices_fail_before_assembly() {
        let devices = [DeviceConfig::new("t1", "toaster")];
        assert!(
            generate_model(&devices, &catalog(), &subjects(), GenerateOptions::default()).is_err()
        );
    }
}
