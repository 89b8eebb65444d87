use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::error::{Error, Result};
use crate::generator::canonicalize::TypeMapping;
use crate::parser::names::normalize_family;

/// One way of recovering the instance id from a per-instance type name.
pub trait SuffixStrategy: fmt::Debug {
    /// Return the instance-id prefix of `instance_type`, or `None` if this strategy does not apply.
    fn strip<'a>(&self, instance_type: &'a str) -> Option<&'a str>;
}

/// Strips a trailing `_<family>` for any family known to the run.
///
/// Families are tried longest first so that `room_airconditioner` wins over
/// `airconditioner` for `aircon105_room_airconditioner`.
#[derive(Debug, Clone, Default)]
pub struct KnownFamilySuffix {
    suffixes: Vec<String>,
}

impl KnownFamilySuffix {
    /// Build from family names; hyphens are normalized to underscores.
    pub fn new<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut suffixes: Vec<String> = families
            .into_iter()
            .map(|f| format!("_{}", normalize_family(f.as_ref())))
            .collect();
        suffixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        suffixes.dedup();
        Self { suffixes }
    }
}

impl SuffixStrategy for KnownFamilySuffix {
    fn strip<'a>(&self, instance_type: &'a str) -> Option<&'a str> {
        self.suffixes
            .iter()
            .find_map(|suffix| instance_type.strip_suffix(suffix.as_str()))
    }
}

/// Splits at the last underscore.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastUnderscore;

impl SuffixStrategy for LastUnderscore {
    fn strip<'a>(&self, instance_type: &'a str) -> Option<&'a str> {
        instance_type.rfind('_').map(|idx| &instance_type[..idx])
    }
}

/// Ordered fallback chain of [`SuffixStrategy`] implementations.
#[derive(Debug, Default)]
pub struct SuffixStripper {
    strategies: Vec<Box<dyn SuffixStrategy>>,
}

impl SuffixStripper {
    /// Chain the given strategies; earlier strategies take precedence.
    pub fn new(strategies: Vec<Box<dyn SuffixStrategy>>) -> Self {
        Self { strategies }
    }

    /// Known-family suffix match, then last-underscore split.
    pub fn for_families<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strategies: Vec<Box<dyn SuffixStrategy>> = vec![
            Box::new(KnownFamilySuffix::new(families)),
            Box::new(LastUnderscore),
        ];
        Self::new(strategies)
    }

    /// Chain for members of one known family: that family's own suffix first,
    /// then the [`SuffixStripper::for_families`] chain.
    ///
    /// `lab_room_airconditioner` of family `airconditioner` yields `lab_room`
    /// even when `room_airconditioner` is also a known family.
    pub fn for_family<I, S>(family: &str, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strategies: Vec<Box<dyn SuffixStrategy>> = vec![
            Box::new(KnownFamilySuffix::new([family])),
            Box::new(KnownFamilySuffix::new(families)),
            Box::new(LastUnderscore),
        ];
        Self::new(strategies)
    }

    /// Recover the instance id from `instance_type`.
    ///
    /// The first strategy producing a non-empty prefix wins. When none does, the
    /// literal type name is kept and a warning is logged.
    pub fn strip<'a>(&self, instance_type: &'a str) -> &'a str {
        for strategy in &self.strategies {
            if let Some(prefix) = strategy.strip(instance_type) {
                if !prefix.is_empty() {
                    return prefix;
                }
            }
        }
        warn!(
            instance_type = %instance_type,
            "could not recover an instance id from type name; keeping it literally"
        );
        instance_type
    }
}

/// Index from instance id to the canonical type it was folded into.
#[derive(Debug, Clone, Default)]
pub struct TypeResolver<'m> {
    by_member: HashMap<&'m str, &'m str>,
}

impl<'m> TypeResolver<'m> {
    /// Index every `typeset` member of `mapping`. The first entry listing a member wins.
    pub fn new(mapping: &'m [TypeMapping]) -> Self {
        let mut by_member = HashMap::new();
        for entry in mapping {
            for member in &entry.typeset {
                by_member
                    .entry(member.as_str())
                    .or_insert(entry.type_name.as_str());
            }
        }
        Self { by_member }
    }

    /// Canonical type of `instance_id`, if mapped.
    pub fn resolve(&self, instance_id: &str) -> Option<&'m str> {
        self.by_member.get(instance_id).copied()
    }

    /// Canonical type of a device, also accepting a typeset member kept as its
    /// literal per-instance type name.
    pub fn require(&self, instance_id: &str, instance_type: &str) -> Result<&'m str> {
        self.resolve(instance_id)
            .or_else(|| self.resolve(instance_type))
            .ok_or_else(|| Error::UnmappedInstance {
                device: instance_id.to_string(),
            })
    }
}
