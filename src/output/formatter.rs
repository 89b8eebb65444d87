use std::path::{Component, Path};

use crate::error::{Error, Result};
use crate::generator::model_generator::GeneratedModel;
use crate::generator::tuple_generator;
use crate::output::report;

/// Write all output files to the specified directory.
///
/// Produces `<name>.fga`, `<name>_tuples.json`, `<name>_type_mapping.json` and
/// `<name>_report.md`.
pub fn write_output(output_dir: &Path, name: &str, model: &GeneratedModel) -> Result<()> {
    validate_output_name(name)?;

    std::fs::create_dir_all(output_dir).map_err(Error::io(output_dir))?;

    let fga_path = output_dir.join(format!("{name}.fga"));
    std::fs::write(&fga_path, &model.dsl).map_err(Error::io(&fga_path))?;

    let tuples_path = output_dir.join(format!("{name}_tuples.json"));
    let tuples_content = tuple_generator::format_tuples(&model.tuples)?;
    std::fs::write(&tuples_path, tuples_content).map_err(Error::io(&tuples_path))?;

    let mapping_path = output_dir.join(format!("{name}_type_mapping.json"));
    let mapping_content = serde_json::to_string_pretty(&model.canonical.mapping)
        .map_err(Error::json("type mapping"))?;
    std::fs::write(&mapping_path, mapping_content).map_err(Error::io(&mapping_path))?;

    let report_path = output_dir.join(format!("{name}_report.md"));
    std::fs::write(&report_path, report::build_report(model)).map_err(Error::io(&report_path))?;

    Ok(())
}

fn validate_output_name(name: &str) -> Result<()> {
    let invalid = |reason| Error::InvalidOutputName {
        name: name.to_string(),
        reason,
    };
    if name.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    let candidate = Path::new(name);
    if candidate.is_absolute() {
        return Err(invalid("absolute paths are not allowed"));
    }
    if candidate.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    }) {
        return Err(invalid("traversal segments are not allowed"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("path separators are not allowed"));
    }
    Ok(())
}
