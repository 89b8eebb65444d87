#![allow(dead_code)]

use std::path::PathBuf;

use device2fga::generator::model_generator::{self, GenerateOptions, GeneratedModel};
use device2fga::parser::capabilities::CapabilityCatalog;
use device2fga::parser::devices::{self, DeviceConfig};
use device2fga::parser::subjects::SubjectCatalog;

pub(crate) fn fixture_dir(fixture: &str) -> PathBuf {
    PathBuf::from("tests/fixtures").join(fixture)
}

pub(crate) fn read_fixture(fixture: &str, file: &str) -> String {
    let path = fixture_dir(fixture).join(file);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}

pub(crate) fn load_fixture_catalog(fixture: &str) -> CapabilityCatalog {
    let mut catalog = CapabilityCatalog::new();
    catalog
        .load_from_json(&read_fixture(fixture, "capabilities.json"))
        .expect("fixture capabilities should parse");
    catalog
}

pub(crate) fn load_fixture_subjects(fixture: &str) -> SubjectCatalog {
    let groups_path = fixture_dir(fixture).join("groups.json");
    let groups = std::fs::read_to_string(groups_path).ok();
    SubjectCatalog::from_json(&read_fixture(fixture, "subjects.json"), groups.as_deref())
        .expect("fixture subjects should parse")
}

pub(crate) fn load_fixture_devices(fixture: &str) -> Vec<DeviceConfig> {
    devices::load_devices(&read_fixture(fixture, "devices.json"))
        .expect("fixture devices should parse")
}

pub(crate) fn generate_fixture_model(fixture: &str, options: GenerateOptions) -> GeneratedModel {
    model_generator::generate_model(
        &load_fixture_devices(fixture),
        &load_fixture_catalog(fixture),
        &load_fixture_subjects(fixture),
        options,
    )
    .expect("fixture model should generate")
}

/// Type names declared by `type X` lines of a DSL document.
pub(crate) fn declared_types(dsl: &str) -> Vec<&str> {
    dsl.lines()
        .filter_map(|line| line.strip_prefix("type "))
        .map(str::trim)
        .collect()
}
