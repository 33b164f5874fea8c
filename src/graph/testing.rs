//! Scripted executor for unit tests.
//!
//! Records every statement it receives and answers queries from a queue of
//! canned responses keyed by a substring of the statement text. Unmatched
//! statements yield no rows.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::CypherExecutor;

/// A statement received by [`ScriptedExecutor`].
#[derive(Debug, Clone)]
pub struct Call {
    pub cypher: String,
    pub params: Params,
}

enum Response {
    Rows(Vec<Row>),
    Fail(String),
}

#[derive(Default)]
pub struct ScriptedExecutor {
    calls: Mutex<Vec<Call>>,
    responses: Mutex<VecDeque<(String, Response)>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `rows` for the next statement containing `pattern`.
    pub fn respond(&self, pattern: &str, rows: Vec<Row>) {
        self.responses
            .lock()
            .unwrap()
            .push_back((pattern.to_string(), Response::Rows(rows)));
    }

    /// Queues a query error for the next statement containing `pattern`.
    pub fn fail(&self, pattern: &str, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back((pattern.to_string(), Response::Fail(message.to_string())));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Statements received so far, without parameters.
    pub fn statements(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.cypher).collect()
    }

    fn answer(&self, cypher: &str, params: Params) -> Result<Vec<Row>, AppError> {
        self.calls.lock().unwrap().push(Call {
            cypher: cypher.to_string(),
            params,
        });

        let mut responses = self.responses.lock().unwrap();
        let position = responses
            .iter()
            .position(|(pattern, _)| cypher.contains(pattern.as_str()));
        match position.and_then(|i| responses.remove(i)) {
            Some((_, Response::Rows(rows))) => Ok(rows),
            Some((_, Response::Fail(message))) => Err(AppError::Query {
                message,
                query: cypher.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl CypherExecutor for ScriptedExecutor {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let rows = self.answer(cypher, params)?;
        Ok(Box::pin(futures::stream::iter(rows.into_iter().map(Ok))))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.answer(cypher, params).map(|_| ())
    }
}
