//! Core trait for Cypher execution.
//!
//! Backends implement [`CypherExecutor`]; everything above it (query
//! builder, schema inspection, migration helpers) is written against the
//! trait only.

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, RowStream};

/// Executes Cypher queries against a graph database.
///
/// Each call is an independent auto-commit statement. The helpers issue
/// statements strictly one after another, so implementations need no
/// internal ordering guarantees beyond completing a statement before the
/// returned stream is exhausted.
#[async_trait]
pub trait CypherExecutor: Send + Sync {
    /// Executes a Cypher query and returns a stream of result rows.
    ///
    /// Use this for queries that return data (MATCH, RETURN, SHOW).
    ///
    /// # Arguments
    ///
    /// * `cypher` - The Cypher query string
    /// * `params` - Parameters to bind to the query
    async fn execute_cypher(&self, cypher: &str, params: Params)
        -> Result<RowStream<'_>, AppError>;

    /// Executes a Cypher query without returning results.
    ///
    /// Use this for mutations and schema commands (CREATE, DROP, SET).
    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError>;
}
