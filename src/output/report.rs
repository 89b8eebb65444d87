use std::fmt::Write;

use crate::generator::model_generator::GeneratedModel;

/// Build a markdown report summarizing how devices were folded into types.
pub fn build_report(model: &GeneratedModel) -> String {
    let mut report = String::new();

    writeln!(report, "# device2fga Canonicalization Report").unwrap();
    writeln!(report).unwrap();

    writeln!(report, "## Family Summary").unwrap();
    writeln!(report).unwrap();
    writeln!(report, "| Family | Instances | Canonical Types | Notes |").unwrap();
    writeln!(report, "|--------|-----------|-----------------|-------|").unwrap();

    for summary in &model.canonical.family_summaries {
        let notes = if summary.groups == 1 && summary.instances > 1 {
            "all instances share one type"
        } else if summary.groups == summary.instances && summary.instances > 1 {
            "REVIEW: no instances were merged"
        } else {
            ""
        };
        writeln!(
            report,
            "| {} | {} | {} | {} |",
            summary.family, summary.instances, summary.groups, notes
        )
        .unwrap();
    }

    writeln!(report).unwrap();
    writeln!(report, "## Type Mapping").unwrap();
    writeln!(report).unwrap();
    writeln!(report, "| Type | Devices |").unwrap();
    writeln!(report, "|------|---------|").unwrap();
    for entry in &model.canonical.mapping {
        writeln!(report, "| {} | {} |", entry.type_name, entry.typeset.join(", ")).unwrap();
    }

    writeln!(report).unwrap();
    writeln!(report, "## Tuples").unwrap();
    writeln!(report).unwrap();
    writeln!(report, "{} relationship tuples generated.", model.tuples.len()).unwrap();

    report
}
