/// Groups structurally identical devices into canonical schema types.
pub mod canonicalize;
/// Full pipeline: subject types, canonical device types, and tuples.
pub mod model_generator;
/// Per-device relation statement assembly.
pub mod relations;
/// Instance-id recovery and instance → canonical type lookup.
pub mod resolver;
/// Relationship tuples rewritten against canonical types.
pub mod tuple_generator;
