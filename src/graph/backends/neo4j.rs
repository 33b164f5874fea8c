//! Neo4j backend over the `neo4rs` Bolt driver.
//!
//! # Example
//!
//! ```ignore
//! use graphshift::config::Config;
//! use graphshift::graph::backends::neo4j::Neo4jClient;
//! use graphshift::graph::QueryExt;
//!
//! let config = Config::load()?;
//! let client = Neo4jClient::connect(&config.neo4j).await?;
//!
//! let rows = client.query("MATCH (n:Book) RETURN n.name AS name")
//!     .fetch_all()
//!     .await?;
//! ```

use std::collections::HashMap;

use async_stream::try_stream;
use async_trait::async_trait;
use neo4rs::{
    BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType,
    ConfigBuilder, Graph,
};
use serde_json::Value as JsonValue;

use crate::config::Neo4jConfig;
use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::CypherExecutor;

/// Neo4j graph client.
///
/// Wraps a `neo4rs::Graph`, which pools Bolt connections internally. Every
/// statement runs in its own auto-commit transaction, which schema commands
/// require.
///
/// This type is cheap to clone.
#[derive(Clone)]
pub struct Neo4jClient {
    graph: Graph,
}

impl Neo4jClient {
    /// Connects using the `[neo4j]` configuration section.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, AppError> {
        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_deref().unwrap_or(""));
        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }

        let graph = Graph::connect(builder.build()?).await?;
        tracing::info!(uri = %config.uri, "Connected to Neo4j");

        Ok(Self { graph })
    }
}

#[async_trait]
impl CypherExecutor for Neo4jClient {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let mut stream = self
            .graph
            .execute(build_query(cypher, params))
            .await
            .map_err(|e| query_error(cypher, e))?;
        let cypher = cypher.to_string();

        Ok(Box::pin(try_stream! {
            while let Some(row) = stream.next().await.map_err(|e| query_error(&cypher, e))? {
                yield parse_bolt_row(&row, &cypher)?;
            }
        }))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.graph
            .run(build_query(cypher, params))
            .await
            .map_err(|e| query_error(cypher, e))
    }
}

fn query_error(cypher: &str, err: neo4rs::Error) -> AppError {
    AppError::Query {
        message: format!("Cypher query failed: {}", err),
        query: cypher.to_string(),
    }
}

/// Builds a driver query with every parameter converted to a Bolt value.
fn build_query(cypher: &str, params: Params) -> neo4rs::Query {
    params
        .into_iter()
        .fold(neo4rs::query(cypher), |query, (name, value)| {
            query.param(&name, json_to_bolt(value))
        })
}

/// Converts a JSON parameter value into its Bolt equivalent.
///
/// Integers that fit in `i64` stay integers; everything else numeric becomes
/// a float.
fn json_to_bolt(value: JsonValue) -> BoltType {
    match value {
        JsonValue::Null => BoltType::Null(BoltNull),
        JsonValue::Bool(b) => BoltType::Boolean(BoltBoolean::new(b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(f64::NAN))),
        },
        JsonValue::String(s) => BoltType::String(BoltString::from(s)),
        JsonValue::Array(items) => {
            let mut list = BoltList::with_capacity(items.len());
            for item in items {
                list.push(json_to_bolt(item));
            }
            BoltType::List(list)
        }
        JsonValue::Object(fields) => {
            let mut map = BoltMap::with_capacity(fields.len());
            for (key, value) in fields {
                map.put(BoltString::from(key), json_to_bolt(value));
            }
            BoltType::Map(map)
        }
    }
}

/// Converts a Bolt row into a JSON [`Row`] keyed by column name.
fn parse_bolt_row(row: &neo4rs::Row, cypher: &str) -> Result<Row, AppError> {
    row.to::<HashMap<String, JsonValue>>()
        .map(Row::new)
        .map_err(|e| AppError::Query {
            message: format!("Failed to decode row: {}", e),
            query: cypher.to_string(),
        })
}
