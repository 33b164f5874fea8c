//! Schema-level models: identifiers, entity declarations and id policies.

mod entity;
mod id_property;
mod identifier;

pub use entity::{ConstraintKind, EntitySchema, IndexKind, PropertySchema};
pub use id_property::{
    IdGeneration, IdGenerator, IdProperty, IdPropertyRegistry, DEFAULT_ID_PROPERTY,
};
pub use identifier::{Label, PropertyKey, RelationshipType};
