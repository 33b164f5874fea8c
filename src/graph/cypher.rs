//! Cypher text helpers.
//!
//! Labels, relationship types and property keys cannot be bound as
//! parameters, so they are interpolated into statement text. Every such
//! identifier goes through [`quote`], which wraps it in backticks and doubles
//! any embedded backtick, so arbitrary names stay a single identifier.
//!
//! # Example
//!
//! ```
//! use graphshift::graph::cypher::quote;
//!
//! assert_eq!(quote("Book"), "`Book`");
//! assert_eq!(quote("odd`name"), "`odd``name`");
//! ```

/// Quotes a label, relationship type or property key for use in Cypher.
pub fn quote(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// Renders a label expression such as `` :`A`:`B` `` for `SET`/`REMOVE` clauses.
///
/// Returns an empty string for an empty iterator.
pub fn label_expression<'a>(labels: impl IntoIterator<Item = &'a str>) -> String {
    labels
        .into_iter()
        .map(|l| format!(":{}", quote(l)))
        .collect()
}
