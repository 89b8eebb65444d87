//! Fold per-device access-control configuration into canonical `OpenFGA` types and tuples.
#![warn(missing_docs)]

/// Crate-wide error type.
pub mod error;
/// Relation assembly, canonicalization, and tuple generation.
pub mod generator;
/// File output and markdown report generation.
pub mod output;
/// Input decoding: devices, capability catalog, and subject catalog.
pub mod parser;

pub use error::{Error, Result};
