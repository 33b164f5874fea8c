//! Graph abstraction layer for Cypher execution.
//!
//! The migration helpers never talk to a driver directly. They build Cypher
//! statements and hand them to a [`CypherExecutor`], which keeps the helpers
//! testable against scripted executors and lets the same code run against
//! any Bolt-speaking store.
//!
//! # Architecture
//!
//! - [`CypherExecutor`] - Execute Cypher statements (implemented by backends)
//! - [`Query`] / [`QueryExt`] - Fluent parameter binding on top of an executor
//! - [`SchemaExt`] - Constraint and index metadata plus DDL, for any executor
//! - [`cypher`] - Identifier quoting for labels, properties and types
//!
//! # Usage
//!
//! ```ignore
//! use graphshift::graph::{QueryExt, backends::neo4j::Neo4jClient};
//!
//! let client = Neo4jClient::connect(&config.neo4j).await?;
//!
//! let rows = client.query("MATCH (n:Book) WHERE n.name = $name RETURN n.name AS name")
//!     .param("name", "Dune")
//!     .fetch_all()
//!     .await?;
//! ```

mod macros;
mod query;
mod row;
mod schema;
mod traits;

pub mod backends;
pub mod cypher;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core types
pub use query::{Query, QueryExt};
pub use row::{Params, Row, RowStream};
pub use schema::{LabelIndexes, SchemaExt};
pub use traits::CypherExecutor;

// Re-export macro (defined at crate root via #[macro_export])
#[doc(inline)]
pub use crate::cypher;
