/// Capability catalog: default commands and attributes per device family.
pub mod capabilities;
/// Device configuration rows and role keys.
pub mod devices;
/// Identifier normalization and validation helpers shared by model and tuple generation.
pub mod names;
/// Subject catalog (user attributes and groups) and subject type resolution.
pub mod subjects;
