/// Writes the generated model, tuples, type mapping, and report to disk.
pub mod formatter;
/// Builds a Markdown canonicalization report from the generated model.
pub mod report;
