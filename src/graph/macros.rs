//! Macro for convenient Cypher query construction.

/// Macro for inline Cypher queries with optional parameters.
///
/// # Usage
///
/// ```ignore
/// use graphshift::cypher;
///
/// // Query without parameters
/// let query = cypher!(client, "MATCH (n:Book) RETURN count(n) AS count");
///
/// // Query with parameters
/// let query = cypher!(client, "MATCH (n:Book) WHERE n.name = $name RETURN n", name = "Dune");
///
/// let rows = query.fetch_all().await?;
/// ```
#[macro_export]
macro_rules! cypher {
    // Query without parameters
    ($graph:expr, $query:expr) => {
        $graph.query($query)
    };
    // Query with parameters
    ($graph:expr, $query:expr, $($name:ident = $value:expr),+ $(,)?) => {
        $graph.query($query)$(.param(stringify!($name), $value))+
    };
}
