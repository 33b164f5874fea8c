//! Constraint and index metadata for Neo4j 5.
//!
//! [`SchemaExt`] is implemented for every [`CypherExecutor`] and covers the
//! two halves of schema work: inspecting what exists (`SHOW CONSTRAINTS`,
//! `SHOW INDEXES`) and issuing the DDL to change it. It never decides whether
//! a change is allowed; that is the migration helpers' job.

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::cypher::quote;
use crate::graph::query::QueryExt;
use crate::graph::traits::CypherExecutor;
use crate::models::{Label, PropertyKey};

/// Property keys covered by plain range indexes on a label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelIndexes {
    /// One entry per index, each listing the indexed properties in order.
    pub property_keys: Vec<Vec<String>>,
}

impl LabelIndexes {
    /// True if a single-property index on `property` exists.
    pub fn contains(&self, property: &str) -> bool {
        self.property_keys
            .iter()
            .any(|keys| keys.len() == 1 && keys[0] == property)
    }
}

const FIND_UNIQUE_CONSTRAINT: &str = "SHOW CONSTRAINTS YIELD name, type, entityType, labelsOrTypes, properties \
     WHERE entityType = 'NODE' AND type IN ['UNIQUENESS', 'NODE_PROPERTY_UNIQUENESS'] \
     AND labelsOrTypes = [$label] AND properties = [$property] \
     RETURN name";

const FIND_INDEX: &str = "SHOW INDEXES YIELD name, type, entityType, labelsOrTypes, properties, owningConstraint \
     WHERE entityType = 'NODE' AND type = 'RANGE' AND owningConstraint IS NULL \
     AND labelsOrTypes = [$label] AND properties = [$property] \
     RETURN name";

const FIND_CONSTRAINT_INDEX: &str = "SHOW INDEXES YIELD name, type, entityType, labelsOrTypes, properties, owningConstraint \
     WHERE entityType = 'NODE' AND type = 'RANGE' AND owningConstraint IS NOT NULL \
     AND labelsOrTypes = [$label] AND properties = [$property] \
     RETURN name";

const LABEL_INDEXES: &str = "SHOW INDEXES YIELD type, entityType, labelsOrTypes, properties, owningConstraint \
     WHERE entityType = 'NODE' AND type = 'RANGE' AND owningConstraint IS NULL \
     AND labelsOrTypes = [$label] \
     RETURN properties";

/// Schema inspection and DDL on top of any [`CypherExecutor`].
#[async_trait]
pub trait SchemaExt: CypherExecutor {
    /// Name of the uniqueness constraint on `label.property`, if one exists.
    async fn unique_constraint_name(
        &self,
        label: &Label,
        property: &PropertyKey,
    ) -> Result<Option<String>, AppError> {
        self.query(FIND_UNIQUE_CONSTRAINT)
            .param("label", label.as_str())
            .param("property", property.as_str())
            .fetch_scalar("name")
            .await
    }

    async fn constraint_exists(
        &self,
        label: &Label,
        property: &PropertyKey,
    ) -> Result<bool, AppError> {
        Ok(self.unique_constraint_name(label, property).await?.is_some())
    }

    /// Name of the range index on `label.property`, if one exists.
    ///
    /// Indexes owned by a constraint and other index types (text, point,
    /// fulltext, vector) are not reported here.
    async fn index_name(
        &self,
        label: &Label,
        property: &PropertyKey,
    ) -> Result<Option<String>, AppError> {
        self.query(FIND_INDEX)
            .param("label", label.as_str())
            .param("property", property.as_str())
            .fetch_scalar("name")
            .await
    }

    async fn index_exists(&self, label: &Label, property: &PropertyKey) -> Result<bool, AppError> {
        Ok(self.index_name(label, property).await?.is_some())
    }

    /// Name of the range index backing a constraint on `label.property`.
    ///
    /// Such an index blocks `CREATE INDEX` on the same pair but can only be
    /// removed by dropping its constraint.
    async fn constraint_index_name(
        &self,
        label: &Label,
        property: &PropertyKey,
    ) -> Result<Option<String>, AppError> {
        self.query(FIND_CONSTRAINT_INDEX)
            .param("label", label.as_str())
            .param("property", property.as_str())
            .fetch_scalar("name")
            .await
    }

    /// All plain range indexes on `label`.
    async fn label_indexes(&self, label: &Label) -> Result<LabelIndexes, AppError> {
        let rows = self
            .query(LABEL_INDEXES)
            .param("label", label.as_str())
            .fetch_all()
            .await?;

        let property_keys = rows
            .iter()
            .map(|row| row.get::<Vec<String>>("properties"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LabelIndexes { property_keys })
    }

    async fn create_unique_constraint(
        &self,
        label: &Label,
        property: &PropertyKey,
    ) -> Result<(), AppError> {
        let cypher = format!(
            "CREATE CONSTRAINT FOR (n:{}) REQUIRE n.{} IS UNIQUE",
            label.quoted(),
            property.quoted()
        );
        tracing::debug!(statement = %cypher, "creating constraint");
        self.query(&cypher).run().await
    }

    async fn create_index(&self, label: &Label, property: &PropertyKey) -> Result<(), AppError> {
        let cypher = format!(
            "CREATE INDEX FOR (n:{}) ON (n.{})",
            label.quoted(),
            property.quoted()
        );
        tracing::debug!(statement = %cypher, "creating index");
        self.query(&cypher).run().await
    }

    async fn drop_constraint_named(&self, name: &str) -> Result<(), AppError> {
        let cypher = format!("DROP CONSTRAINT {}", quote(name));
        tracing::debug!(statement = %cypher, "dropping constraint");
        self.query(&cypher).run().await
    }

    async fn drop_index_named(&self, name: &str) -> Result<(), AppError> {
        let cypher = format!("DROP INDEX {}", quote(name));
        tracing::debug!(statement = %cypher, "dropping index");
        self.query(&cypher).run().await
    }
}

impl<E: CypherExecutor + ?Sized> SchemaExt for E {}
