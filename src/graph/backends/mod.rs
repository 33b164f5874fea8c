//! Backend implementations for graph databases.
//!
//! Each backend implements [`CypherExecutor`](crate::graph::CypherExecutor).
//!
//! # Available Backends
//!
//! | Backend | Module | Status |
//! |---------|--------|--------|
//! | Neo4j 5 (Bolt) | [`neo4j`] | Available |
//!
//! # Implementing a Backend
//!
//! 1. Create a client struct (e.g., `Neo4jClient`)
//! 2. Implement `CypherExecutor` for it, converting [`Params`](crate::graph::Params)
//!    to the driver's parameter type and driver rows to [`Row`](crate::graph::Row)
//! 3. Support `SHOW CONSTRAINTS` / `SHOW INDEXES` and Neo4j 5 schema DDL,
//!    which [`SchemaExt`](crate::graph::SchemaExt) relies on

pub mod neo4j;
