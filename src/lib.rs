//! Graphshift - Schema migration helpers for Neo4j
//!
//! Translates migration intents (add a constraint, rename a label, populate
//! id properties) into Cypher statements and reports progress for each step.

pub mod config;
pub mod error;
pub mod graph;
pub mod migrations;
pub mod models;

pub use error::AppError;
pub use migrations::MigrationHelpers;
