use std::collections::{BTreeSet, HashSet};
use std::fmt::Write;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::generator::relations::{AssembledDevice, RelationList};
use crate::generator::resolver::SuffixStripper;

/// Knobs for a canonicalization run.
#[derive(Debug, Clone, Default)]
pub struct CanonicalizeOptions {
    /// Sort each device's statements by relation name before comparing shapes.
    ///
    /// Off by default: statements must then match in their assembled order.
    pub sort_relations: bool,
    /// Type names declared elsewhere in the model (`user`, `group`, ...).
    /// A family is never simplified onto one of these.
    pub reserved_types: BTreeSet<String>,
}

/// Which original instances were folded into a canonical type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMapping {
    /// Canonical type name declared in the schema.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Instance ids sharing this type.
    pub typeset: Vec<String>,
}

/// Instances of one family that share an identical relation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalGroup {
    /// Normalized device family.
    pub family: String,
    /// Serialized relation list shared by every member.
    pub relation_set_key: String,
    /// Instance ids, in input order.
    pub members: Vec<String>,
    /// Canonical type name.
    pub type_name: String,
    /// Shared relation statements.
    pub relations: RelationList,
}

/// Per-family deduplication outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilySummary {
    /// Normalized device family.
    pub family: String,
    /// Number of device instances of the family.
    pub instances: usize,
    /// Number of canonical types emitted for the family.
    pub groups: usize,
}

/// Result of folding device instances into canonical types.
#[derive(Debug, Clone, Default)]
pub struct CanonicalModel {
    /// `type` blocks for every canonical group, without the `model` header.
    pub dsl: String,
    /// Canonical groups in family-then-first-seen order.
    pub groups: Vec<CanonicalGroup>,
    /// One entry per group.
    pub mapping: Vec<TypeMapping>,
    /// Instances vs. groups per family, in first-seen family order.
    pub family_summaries: Vec<FamilySummary>,
}

#[derive(Debug)]
struct PendingGroup<'a> {
    relations: RelationList,
    instance_types: Vec<&'a str>,
}

/// Group devices by family and relation shape and assign canonical type names.
///
/// Every group of a family is named `<family>_<N>` with `N` counting from 1 in
/// first-seen order. A family that yields a single group is simplified to the
/// bare family name unless that name is already taken.
pub fn canonicalize(devices: &[AssembledDevice], options: &CanonicalizeOptions) -> CanonicalModel {
    let mut families: IndexMap<&str, IndexMap<String, PendingGroup<'_>>> = IndexMap::new();
    for device in devices {
        let relations = if options.sort_relations {
            device.relations().sorted_by_key()
        } else {
            device.relations().clone()
        };
        let key = relations.relation_set_key();
        families
            .entry(device.family())
            .or_default()
            .entry(key)
            .or_insert_with(|| PendingGroup {
                relations,
                instance_types: Vec::new(),
            })
            .instance_types
            .push(device.instance_type());
    }

    let known_families: Vec<&str> = families.keys().copied().collect();
    let mut declared: HashSet<String> = options.reserved_types.iter().cloned().collect();
    let mut model = CanonicalModel::default();

    for (family, shapes) in families {
        let stripper = SuffixStripper::for_family(family, &known_families);
        let simplify = shapes.len() == 1 && !declared.contains(family);
        if shapes.len() == 1 && !simplify {
            warn!(
                family,
                "family name collides with an existing type; keeping numbered type name"
            );
        }

        let mut counter = 0usize;
        let mut instances = 0usize;
        let group_count = shapes.len();

        for (relation_set_key, pending) in shapes {
            let type_name = if simplify {
                family.to_string()
            } else {
                next_numbered_name(family, &mut counter, &declared)
            };
            declared.insert(type_name.clone());

            let members: Vec<String> = pending
                .instance_types
                .iter()
                .map(|t| stripper.strip(t).to_string())
                .collect();
            instances += members.len();

            model.mapping.push(TypeMapping {
                type_name: type_name.clone(),
                typeset: members.clone(),
            });
            model.groups.push(CanonicalGroup {
                family: family.to_string(),
                relation_set_key,
                members,
                type_name,
                relations: pending.relations,
            });
        }

        info!(
            family,
            instances,
            groups = group_count,
            "canonicalized device family"
        );
        model.family_summaries.push(FamilySummary {
            family: family.to_string(),
            instances,
            groups: group_count,
        });
    }

    model.dsl = render_types(&model.groups);
    model
}

fn next_numbered_name(family: &str, counter: &mut usize, declared: &HashSet<String>) -> String {
    loop {
        *counter += 1;
        let candidate = format!("{family}_{counter}");
        if !declared.contains(&candidate) {
            return candidate;
        }
        warn!(type_name = %candidate, "type name already declared; skipping");
    }
}

/// Render one `type` block per group, separated by blank lines.
pub fn render_types(groups: &[CanonicalGroup]) -> String {
    let mut dsl = String::new();
    for (idx, group) in groups.iter().enumerate() {
        if idx > 0 {
            writeln!(dsl).unwrap();
        }
        writeln!(dsl, "type {}", group.type_name).unwrap();
        writeln!(dsl, "  relations").unwrap();
        for statement in group.relations.statements() {
            writeln!(dsl, "    {}", statement.text()).unwrap();
        }
    }
    dsl
}
