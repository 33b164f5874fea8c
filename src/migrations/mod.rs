//! Helpers for writing Neo4j schema and data migrations.
//!
//! Each helper is a single statement against the store, guarded by a
//! read-check where the change could collide with existing schema:
//! - **Properties**: remove, rename (refuses to overwrite an existing target)
//! - **Labels**: add, remove, rename
//! - **Relationships**: rename by recreating with copied properties
//! - **Constraints/indexes**: add, drop, existence checks
//! - **Ids**: batched population of a label's id property
//!
//! Progress is written through an [`Output`] sink in the `say` format:
//! `-- message` for headers and `   -> detail` for sub-items.

mod helpers;
mod output;

pub use helpers::{AddOptions, Direction, MigrationHelpers, RelationshipFilter};
pub use output::{format_say, MemoryOutput, Output, RowCount, StdoutOutput, TracingOutput};
