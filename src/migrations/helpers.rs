//! Migration helpers: schema and data changes expressed as single Cypher
//! statements, with duplicate/missing checks and progress output.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;

use crate::config::{MigrationsConfig, DEFAULT_BATCH_SIZE};
use crate::error::AppError;
use crate::graph::cypher::label_expression;
use crate::graph::{CypherExecutor, LabelIndexes, Params, QueryExt, Row, SchemaExt};
use crate::migrations::output::{format_say, Output, RowCount, TracingOutput};
use crate::models::{EntitySchema, IdPropertyRegistry, Label, PropertyKey, RelationshipType};

/// Options for [`MigrationHelpers::add_constraint_with`] and
/// [`MigrationHelpers::add_index_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Drop and recreate an existing constraint/index instead of failing.
    pub force: bool,
}

impl AddOptions {
    pub fn force() -> Self {
        Self { force: true }
    }
}

/// Direction of the relationships matched by [`MigrationHelpers::rename_relationship`],
/// seen from the `from` node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Outgoing,
    Incoming,
}

/// Restricts which relationships [`MigrationHelpers::rename_relationship`] touches.
#[derive(Debug, Clone, Default)]
pub struct RelationshipFilter {
    /// Label of the node the pattern starts from.
    pub from: Option<Label>,
    /// Label of the node at the other end.
    pub to: Option<Label>,
    pub direction: Direction,
}

/// Schema and data migration helpers over a [`CypherExecutor`].
///
/// Holds no state between calls: every operation reads what it needs from
/// the store and writes its change in one statement. Helpers are meant to be
/// called one at a time from a single migration.
///
/// # Example
///
/// ```ignore
/// let helpers = MigrationHelpers::new(&client).with_output(StdoutOutput);
///
/// helpers.add_constraint("Book", "name").await?;
/// helpers
///     .say_with_time("Renaming Book to Publication", helpers.rename_label("Book", "Publication"))
///     .await?;
/// ```
pub struct MigrationHelpers<'a, E: CypherExecutor + ?Sized> {
    executor: &'a E,
    output: Arc<dyn Output>,
    id_properties: IdPropertyRegistry,
    batch_size: usize,
}

impl<'a, E: CypherExecutor + ?Sized> MigrationHelpers<'a, E> {
    /// Creates helpers writing progress through [`TracingOutput`].
    pub fn new(executor: &'a E) -> Self {
        Self {
            executor,
            output: Arc::new(TracingOutput),
            id_properties: IdPropertyRegistry::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_output(mut self, output: impl Output + 'static) -> Self {
        self.output = Arc::new(output);
        self
    }

    pub fn with_id_properties(mut self, registry: IdPropertyRegistry) -> Self {
        self.id_properties = registry;
        self
    }

    /// Maximum nodes per id-population batch. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_config(self, config: &MigrationsConfig) -> Self {
        self.with_batch_size(config.batch_size)
    }

    // =========================================================================
    // Properties and nodes
    // =========================================================================

    /// Removes `property` from every node labeled `label`.
    ///
    /// Returns the number of nodes that had the property.
    pub async fn remove_property(
        &self,
        label: impl Into<Label>,
        property: impl Into<PropertyKey>,
    ) -> Result<u64, AppError> {
        let (label, property) = (label.into(), property.into());
        label.ensure_named()?;
        property.ensure_named()?;

        let cypher = format!(
            "MATCH (n:{label}) WHERE n.{prop} IS NOT NULL REMOVE n.{prop} RETURN count(n) AS count",
            label = label.quoted(),
            prop = property.quoted()
        );
        self.run_counted(&cypher, Params::new()).await
    }

    /// Moves the value of `from` into `to` on every node labeled `label`.
    ///
    /// Fails with [`AppError::DuplicateTarget`] without touching any node if
    /// some node of `label` already has `to`.
    pub async fn rename_property(
        &self,
        label: impl Into<Label>,
        from: impl Into<PropertyKey>,
        to: impl Into<PropertyKey>,
    ) -> Result<u64, AppError> {
        let (label, from, to) = (label.into(), from.into(), to.into());
        label.ensure_named()?;
        from.ensure_named()?;
        to.ensure_named()?;
        if from == to {
            return Err(AppError::Validation(format!(
                "cannot rename property `{}` of `{}` to itself",
                from, label
            )));
        }

        let existing = format!(
            "MATCH (n:{}) WHERE n.{} IS NOT NULL WITH n LIMIT 1 RETURN count(n) AS count",
            label.quoted(),
            to.quoted()
        );
        if self.run_counted(&existing, Params::new()).await? > 0 {
            return Err(AppError::DuplicateTarget {
                label: label.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let cypher = format!(
            "MATCH (n:{label}) WHERE n.{from} IS NOT NULL SET n.{to} = n.{from} REMOVE n.{from} RETURN count(n) AS count",
            label = label.quoted(),
            from = from.quoted(),
            to = to.quoted()
        );
        self.run_counted(&cypher, Params::new()).await
    }

    /// Deletes every node labeled `label` together with its relationships.
    pub async fn drop_nodes(&self, label: impl Into<Label>) -> Result<u64, AppError> {
        let label = label.into();
        label.ensure_named()?;

        let cypher = format!(
            "MATCH (n:{}) DETACH DELETE n RETURN count(n) AS count",
            label.quoted()
        );
        self.run_counted(&cypher, Params::new()).await
    }

    // =========================================================================
    // Labels
    // =========================================================================

    /// Adds each of `new_labels` to every node labeled `label`.
    pub async fn add_labels<I, L>(&self, label: impl Into<Label>, new_labels: I) -> Result<u64, AppError>
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.change_labels("SET", label.into(), new_labels).await
    }

    pub async fn add_label(
        &self,
        label: impl Into<Label>,
        new_label: impl Into<Label>,
    ) -> Result<u64, AppError> {
        let new_label: Label = new_label.into();
        self.add_labels(label, [new_label]).await
    }

    /// Removes each of `labels` from every node labeled `label`.
    pub async fn remove_labels<I, L>(&self, label: impl Into<Label>, labels: I) -> Result<u64, AppError>
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.change_labels("REMOVE", label.into(), labels).await
    }

    pub async fn remove_label(
        &self,
        label: impl Into<Label>,
        target: impl Into<Label>,
    ) -> Result<u64, AppError> {
        let target: Label = target.into();
        self.remove_labels(label, [target]).await
    }

    async fn change_labels<I, L>(&self, clause: &str, label: Label, labels: I) -> Result<u64, AppError>
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        label.ensure_named()?;
        let labels: Vec<Label> = labels.into_iter().map(Into::into).collect();
        for l in &labels {
            l.ensure_named()?;
        }
        if labels.is_empty() {
            return Ok(0);
        }

        let cypher = format!(
            "MATCH (n:{}) {} n{} RETURN count(n) AS count",
            label.quoted(),
            clause,
            label_expression(labels.iter().map(Label::as_str))
        );
        self.run_counted(&cypher, Params::new()).await
    }

    /// Moves every node labeled `from` to label `to`.
    pub async fn rename_label(
        &self,
        from: impl Into<Label>,
        to: impl Into<Label>,
    ) -> Result<u64, AppError> {
        let (from, to) = (from.into(), to.into());
        from.ensure_named()?;
        to.ensure_named()?;
        if from == to {
            return Err(AppError::Validation(format!(
                "cannot rename label `{}` to itself",
                from
            )));
        }

        let cypher = format!(
            "MATCH (n:{from}) SET n:{to} REMOVE n:{from} RETURN count(n) AS count",
            from = from.quoted(),
            to = to.quoted()
        );
        self.run_counted(&cypher, Params::new()).await
    }

    // =========================================================================
    // Relationships
    // =========================================================================

    /// Recreates every matching `old` relationship as `new`, copying its
    /// properties, and deletes the original.
    pub async fn rename_relationship(
        &self,
        old: impl Into<RelationshipType>,
        new: impl Into<RelationshipType>,
        filter: RelationshipFilter,
    ) -> Result<u64, AppError> {
        let (old, new) = (old.into(), new.into());
        old.ensure_named()?;
        new.ensure_named()?;
        if old == new {
            return Err(AppError::Validation(format!(
                "cannot rename relationship type `{}` to itself",
                old
            )));
        }

        let from = label_expression(filter.from.as_ref().map(Label::as_str));
        let to = label_expression(filter.to.as_ref().map(Label::as_str));
        let (matched, created) = match filter.direction {
            Direction::Outgoing => (
                format!("(a{})-[r:{}]->(b{})", from, old.quoted(), to),
                format!("(a)-[r2:{}]->(b)", new.quoted()),
            ),
            Direction::Incoming => (
                format!("(a{})<-[r:{}]-(b{})", from, old.quoted(), to),
                format!("(a)<-[r2:{}]-(b)", new.quoted()),
            ),
        };

        let cypher = format!(
            "MATCH {} CREATE {} SET r2 = properties(r) DELETE r RETURN count(r2) AS count",
            matched, created
        );
        self.run_counted(&cypher, Params::new()).await
    }

    // =========================================================================
    // Raw statements
    // =========================================================================

    /// Runs `statement` with `params` bound and returns every row.
    pub async fn execute(&self, statement: &str, params: Params) -> Result<Vec<Row>, AppError> {
        tracing::debug!(statement = %statement, "executing migration statement");
        self.executor.query(statement).params(params).fetch_all().await
    }

    // =========================================================================
    // Constraints and indexes
    // =========================================================================

    pub async fn constraint_exists(
        &self,
        label: impl Into<Label>,
        property: impl Into<PropertyKey>,
    ) -> Result<bool, AppError> {
        self.executor
            .constraint_exists(&label.into(), &property.into())
            .await
    }

    pub async fn index_exists(
        &self,
        label: impl Into<Label>,
        property: impl Into<PropertyKey>,
    ) -> Result<bool, AppError> {
        self.executor
            .index_exists(&label.into(), &property.into())
            .await
    }

    pub async fn indexes(&self, label: impl Into<Label>) -> Result<LabelIndexes, AppError> {
        self.executor.label_indexes(&label.into()).await
    }

    /// Adds a uniqueness constraint on `label.property`.
    ///
    /// Fails with [`AppError::DuplicateConstraint`] if one already exists.
    pub async fn add_constraint(
        &self,
        label: impl Into<Label>,
        property: impl Into<PropertyKey>,
    ) -> Result<(), AppError> {
        self.add_constraint_with(label, property, AddOptions::default())
            .await
    }

    pub async fn add_constraint_with(
        &self,
        label: impl Into<Label>,
        property: impl Into<PropertyKey>,
        options: AddOptions,
    ) -> Result<(), AppError> {
        let (label, property) = (label.into(), property.into());
        label.ensure_named()?;
        property.ensure_named()?;

        if let Some(name) = self
            .executor
            .unique_constraint_name(&label, &property)
            .await?
        {
            if !options.force {
                return Err(AppError::DuplicateConstraint {
                    label: label.to_string(),
                    property: property.to_string(),
                });
            }
            tracing::warn!(constraint = %name, "Replacing constraint for {}#{}", label, property);
            self.executor.drop_constraint_named(&name).await?;
        }

        self.executor
            .create_unique_constraint(&label, &property)
            .await?;
        tracing::info!("Added constraint for {}#{}", label, property);
        Ok(())
    }

    /// Drops the uniqueness constraint on `label.property`.
    ///
    /// Fails with [`AppError::NoSuchConstraint`] if there is none.
    pub async fn drop_constraint(
        &self,
        label: impl Into<Label>,
        property: impl Into<PropertyKey>,
    ) -> Result<(), AppError> {
        let (label, property) = (label.into(), property.into());
        label.ensure_named()?;
        property.ensure_named()?;

        let name = self
            .executor
            .unique_constraint_name(&label, &property)
            .await?
            .ok_or_else(|| AppError::NoSuchConstraint {
                label: label.to_string(),
                property: property.to_string(),
            })?;

        self.executor.drop_constraint_named(&name).await?;
        tracing::info!("Dropped constraint for {}#{}", label, property);
        Ok(())
    }

    /// Adds an index on `label.property`.
    ///
    /// Fails with [`AppError::DuplicateIndex`] if one already exists, including
    /// the index backing a uniqueness constraint on the same pair.
    pub async fn add_index(
        &self,
        label: impl Into<Label>,
        property: impl Into<PropertyKey>,
    ) -> Result<(), AppError> {
        self.add_index_with(label, property, AddOptions::default())
            .await
    }

    pub async fn add_index_with(
        &self,
        label: impl Into<Label>,
        property: impl Into<PropertyKey>,
        options: AddOptions,
    ) -> Result<(), AppError> {
        let (label, property) = (label.into(), property.into());
        label.ensure_named()?;
        property.ensure_named()?;

        if let Some(name) = self.executor.index_name(&label, &property).await? {
            if !options.force {
                return Err(AppError::DuplicateIndex {
                    label: label.to_string(),
                    property: property.to_string(),
                });
            }
            tracing::warn!(index = %name, "Replacing index for {}#{}", label, property);
            self.executor.drop_index_named(&name).await?;
        } else if self
            .executor
            .constraint_index_name(&label, &property)
            .await?
            .is_some()
        {
            // A constraint's index cannot be dropped on its own, even with `force`.
            return Err(AppError::DuplicateIndex {
                label: label.to_string(),
                property: property.to_string(),
            });
        }

        self.executor.create_index(&label, &property).await?;
        tracing::info!("Added index for {}#{}", label, property);
        Ok(())
    }

    /// Drops the index on `label.property`.
    ///
    /// Fails with [`AppError::NoSuchIndex`] if there is none.
    pub async fn drop_index(
        &self,
        label: impl Into<Label>,
        property: impl Into<PropertyKey>,
    ) -> Result<(), AppError> {
        let (label, property) = (label.into(), property.into());
        label.ensure_named()?;
        property.ensure_named()?;

        let name = self
            .executor
            .index_name(&label, &property)
            .await?
            .ok_or_else(|| AppError::NoSuchIndex {
                label: label.to_string(),
                property: property.to_string(),
            })?;

        self.executor.drop_index_named(&name).await?;
        tracing::info!("Dropped index for {}#{}", label, property);
        Ok(())
    }

    /// Creates every constraint and index `schema` declares that is missing.
    ///
    /// Existing ones are left alone. Returns how many were created.
    pub async fn ensure_schema(&self, schema: &EntitySchema) -> Result<u64, AppError> {
        let label = &schema.label;
        label.ensure_named()?;
        let mut created = 0;

        for property in schema.unique_properties() {
            if !self.executor.constraint_exists(label, property).await? {
                self.executor.create_unique_constraint(label, property).await?;
                created += 1;
            }
        }
        for property in schema.indexed_properties() {
            if !self.executor.index_exists(label, property).await?
                && self
                    .executor
                    .constraint_index_name(label, property)
                    .await?
                    .is_none()
            {
                self.executor.create_index(label, property).await?;
                created += 1;
            }
        }

        tracing::info!("Ensured schema for {} ({} created)", label, created);
        Ok(created)
    }

    // =========================================================================
    // Id population
    // =========================================================================

    /// Gives every node of `label` lacking its id property a new id.
    ///
    /// Ids come from the policy registered for `label`; one value is
    /// generated per node. Nodes are updated in batches of at most the
    /// configured batch size. Returns the number of nodes updated.
    pub async fn populate_id_property(&self, label: impl Into<Label>) -> Result<u64, AppError> {
        let label = label.into();
        let policy = self
            .id_properties
            .get(&label)
            .ok_or_else(|| AppError::UnknownIdProperty(label.to_string()))?;
        let id = policy.name.quoted();

        let count_missing = format!(
            "MATCH (n:{}) WHERE n.{} IS NULL RETURN count(n) AS count",
            label.quoted(),
            id
        );
        let assign = format!(
            "MATCH (n:{label}) WHERE n.{id} IS NULL WITH n LIMIT $limit \
             WITH collect(n) AS nodes \
             UNWIND range(0, size(nodes) - 1) AS i \
             WITH nodes[i] AS node, $ids[i] AS value \
             SET node.{id} = value RETURN count(node) AS count",
            label = label.quoted(),
            id = id
        );

        let mut populated = 0;
        let mut last_batch: Option<(Duration, u64)> = None;

        loop {
            let remaining = self.run_counted(&count_missing, Params::new()).await?;
            if remaining == 0 {
                break;
            }
            self.report_batch_status(remaining, last_batch);

            let batch = remaining.min(self.batch_size as u64);
            let ids = (0..batch)
                .map(|_| policy.generate())
                .collect::<Result<Vec<JsonValue>, _>>()?;
            if ids.iter().any(JsonValue::is_null) {
                return Err(AppError::Validation(format!(
                    "id generator for {} returned null",
                    label
                )));
            }

            let mut params = Params::new();
            params.insert("limit".to_string(), JsonValue::from(batch));
            params.insert("ids".to_string(), JsonValue::Array(ids));

            let started = Instant::now();
            let updated = self.run_counted(&assign, params).await?;
            if updated == 0 {
                return Err(AppError::Validation(format!(
                    "no ids assigned for {} while {} nodes still lack `{}`",
                    label, remaining, policy.name
                )));
            }

            last_batch = Some((started.elapsed(), updated));
            populated += updated;
        }

        tracing::info!("Populated {} for {} nodes of {}", policy.name, populated, label);
        Ok(populated)
    }

    fn report_batch_status(&self, remaining: u64, last_batch: Option<(Duration, u64)>) {
        match last_batch {
            None => self.say("Running first batch...", true),
            Some((elapsed, nodes)) => {
                let per_node = elapsed.as_secs_f64() / nodes as f64;
                self.say(
                    &format!(
                        "{} nodes left. Last batch: {:.1}ms / node (ETA: {:.1} minutes)",
                        remaining,
                        per_node * 1000.0,
                        per_node * remaining as f64 / 60.0
                    ),
                    true,
                );
            }
        }
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Writes `-- text`, or `   -> text` when `subitem` is set.
    pub fn say(&self, text: &str, subitem: bool) {
        self.output.output(&format_say(text, subitem));
    }

    /// Writes `text`, awaits `work`, then reports elapsed seconds and, when
    /// the result is a row count, the number of rows.
    ///
    /// Errors from `work` are returned as-is; nothing is reported after the
    /// header line in that case.
    pub async fn say_with_time<T, Fut>(&self, text: &str, work: Fut) -> Result<T, AppError>
    where
        Fut: Future<Output = Result<T, AppError>>,
        T: RowCount,
    {
        self.say(text, false);
        let started = Instant::now();
        let result = work.await?;
        self.say(&format!("{:.4}s", started.elapsed().as_secs_f64()), true);
        if let Some(rows) = result.row_count() {
            self.say(&format!("{} rows", rows), true);
        }
        Ok(result)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Runs a statement returning a single `count` column.
    async fn run_counted(&self, cypher: &str, params: Params) -> Result<u64, AppError> {
        tracing::debug!(statement = %cypher, "running migration statement");
        Ok(self
            .executor
            .query(cypher)
            .params(params)
            .fetch_scalar::<u64>("count")
            .await?
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::testing::ScriptedExecutor;
    use crate::migrations::output::MemoryOutput;
    use crate::models::IdProperty;
    use serde_json::json;

    fn count(n: u64) -> Vec<Row> {
        vec![Row::from_pairs([("count", json!(n))])]
    }

    fn named(name: &str) -> Vec<Row> {
        vec![Row::from_pairs([("name", json!(name))])]
    }

    // -------------------------------------------------------------------------
    // Properties and nodes
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_remove_property() {
        let executor = ScriptedExecutor::new();
        executor.respond("REMOVE n.`name`", count(3));
        let helpers = MigrationHelpers::new(&executor);

        let removed = helpers.remove_property("Book", "name").await.unwrap();

        assert_eq!(removed, 3);
        assert_eq!(
            executor.statements(),
            vec!["MATCH (n:`Book`) WHERE n.`name` IS NOT NULL REMOVE n.`name` RETURN count(n) AS count"]
        );
    }

    #[tokio::test]
    async fn test_rename_property() {
        let executor = ScriptedExecutor::new();
        executor.respond("WITH n LIMIT 1", count(0));
        executor.respond("SET n.`title`", count(2));
        let helpers = MigrationHelpers::new(&executor);

        let renamed = helpers.rename_property("Book", "name", "title").await.unwrap();

        assert_eq!(renamed, 2);
        let statements = executor.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[1],
            "MATCH (n:`Book`) WHERE n.`name` IS NOT NULL SET n.`title` = n.`name` REMOVE n.`name` RETURN count(n) AS count"
        );
    }

    #[tokio::test]
    async fn test_rename_property_to_existing_fails_without_mutation() {
        let executor = ScriptedExecutor::new();
        executor.respond("WITH n LIMIT 1", count(1));
        let helpers = MigrationHelpers::new(&executor);

        let err = helpers
            .rename_property("Book", "name", "title")
            .await
            .unwrap_err();

        match &err {
            AppError::DuplicateTarget { label, from, to } => {
                assert_eq!(label, "Book");
                assert_eq!(from, "name");
                assert_eq!(to, "title");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("remove_property"));
        assert_eq!(executor.statements().len(), 1);
        assert!(!executor.statements()[0].contains("SET"));
    }

    #[tokio::test]
    async fn test_rename_property_to_itself_is_rejected() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        let err = helpers.rename_property("Book", "name", "name").await;
        assert!(matches!(err, Err(AppError::Validation(_))));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drop_nodes_detaches() {
        let executor = ScriptedExecutor::new();
        executor.respond("DETACH DELETE", count(4));
        let helpers = MigrationHelpers::new(&executor);

        assert_eq!(helpers.drop_nodes("Book").await.unwrap(), 4);
        assert_eq!(
            executor.statements(),
            vec!["MATCH (n:`Book`) DETACH DELETE n RETURN count(n) AS count"]
        );
    }

    #[tokio::test]
    async fn test_empty_label_is_rejected() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        assert!(matches!(
            helpers.drop_nodes(" ").await,
            Err(AppError::Validation(_))
        ));
        assert!(executor.calls().is_empty());
    }

    // -------------------------------------------------------------------------
    // Labels
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_labels() {
        let executor = ScriptedExecutor::new();
        executor.respond("SET n:", count(3));
        let helpers = MigrationHelpers::new(&executor);

        let changed = helpers.add_labels("Book", ["Foo", "Bar"]).await.unwrap();

        assert_eq!(changed, 3);
        assert_eq!(
            executor.statements(),
            vec!["MATCH (n:`Book`) SET n:`Foo`:`Bar` RETURN count(n) AS count"]
        );
    }

    #[tokio::test]
    async fn test_add_labels_with_nothing_to_add_issues_no_statement() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        let changed = helpers
            .add_labels("Book", Vec::<Label>::new())
            .await
            .unwrap();
        assert_eq!(changed, 0);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_and_remove_single_label() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        helpers.add_label("Book", "Archived").await.unwrap();
        helpers.remove_label("Book", "Archived").await.unwrap();
        helpers.remove_labels("Book", ["Foo", "Bar"]).await.unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                "MATCH (n:`Book`) SET n:`Archived` RETURN count(n) AS count",
                "MATCH (n:`Book`) REMOVE n:`Archived` RETURN count(n) AS count",
                "MATCH (n:`Book`) REMOVE n:`Foo`:`Bar` RETURN count(n) AS count",
            ]
        );
    }

    #[tokio::test]
    async fn test_rename_label() {
        let executor = ScriptedExecutor::new();
        executor.respond("REMOVE n:`Book`", count(3));
        let helpers = MigrationHelpers::new(&executor);

        assert_eq!(helpers.rename_label("Book", "Publication").await.unwrap(), 3);
        assert_eq!(
            executor.statements(),
            vec!["MATCH (n:`Book`) SET n:`Publication` REMOVE n:`Book` RETURN count(n) AS count"]
        );
    }

    #[tokio::test]
    async fn test_rename_label_to_itself_is_rejected() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        assert!(matches!(
            helpers.rename_label("Book", "Book").await,
            Err(AppError::Validation(_))
        ));
        assert!(executor.calls().is_empty());
    }

    // -------------------------------------------------------------------------
    // Relationships and raw statements
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_rename_relationship_outgoing() {
        let executor = ScriptedExecutor::new();
        executor.respond("CREATE (a)-[r2:`AUTHORED`]->(b)", count(5));
        let helpers = MigrationHelpers::new(&executor);

        let filter = RelationshipFilter {
            from: Some(Label::new("Author")),
            to: Some(Label::new("Book")),
            direction: Direction::Outgoing,
        };
        let renamed = helpers
            .rename_relationship("WROTE", "AUTHORED", filter)
            .await
            .unwrap();

        assert_eq!(renamed, 5);
        assert_eq!(
            executor.statements(),
            vec!["MATCH (a:`Author`)-[r:`WROTE`]->(b:`Book`) CREATE (a)-[r2:`AUTHORED`]->(b) SET r2 = properties(r) DELETE r RETURN count(r2) AS count"]
        );
    }

    #[tokio::test]
    async fn test_rename_relationship_incoming_unfiltered() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        let filter = RelationshipFilter {
            direction: Direction::Incoming,
            ..Default::default()
        };
        helpers
            .rename_relationship("WROTE", "AUTHORED", filter)
            .await
            .unwrap();

        assert_eq!(
            executor.statements(),
            vec!["MATCH (a)<-[r:`WROTE`]-(b) CREATE (a)<-[r2:`AUTHORED`]-(b) SET r2 = properties(r) DELETE r RETURN count(r2) AS count"]
        );
    }

    #[tokio::test]
    async fn test_execute_passes_params_and_rows() {
        let executor = ScriptedExecutor::new();
        executor.respond(
            "RETURN n.name",
            vec![Row::from_pairs([("name", json!("Dune"))])],
        );
        let helpers = MigrationHelpers::new(&executor);

        let mut params = Params::new();
        params.insert("name".to_string(), json!("Dune"));
        let rows = helpers
            .execute(
                "MATCH (n:Book) WHERE n.name = $name RETURN n.name AS name",
                params,
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<String>("name").unwrap(), "Dune");
        assert_eq!(executor.calls()[0].params.get("name"), Some(&json!("Dune")));
    }

    #[tokio::test]
    async fn test_execute_propagates_store_errors() {
        let executor = ScriptedExecutor::new();
        executor.fail("BROKEN", "Invalid input 'BROKEN'");
        let helpers = MigrationHelpers::new(&executor);

        let err = helpers.execute("BROKEN", Params::new()).await.unwrap_err();
        match err {
            AppError::Query { message, query } => {
                assert_eq!(message, "Invalid input 'BROKEN'");
                assert_eq!(query, "BROKEN");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    // -------------------------------------------------------------------------
    // Constraints and indexes
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_constraint_creates_when_missing() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        helpers.add_constraint("Book", "name").await.unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("SHOW CONSTRAINTS"));
        assert_eq!(
            statements[1],
            "CREATE CONSTRAINT FOR (n:`Book`) REQUIRE n.`name` IS UNIQUE"
        );
    }

    #[tokio::test]
    async fn test_add_constraint_duplicate() {
        let executor = ScriptedExecutor::new();
        executor.respond("SHOW CONSTRAINTS", named("book_name"));
        let helpers = MigrationHelpers::new(&executor);

        let err = helpers.add_constraint("Book", "name").await.unwrap_err();

        assert_eq!(err.to_string(), "Duplicate constraint for Book#name");
        assert!(matches!(err, AppError::DuplicateConstraint { .. }));
        assert_eq!(executor.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_add_constraint_force_replaces() {
        let executor = ScriptedExecutor::new();
        executor.respond("SHOW CONSTRAINTS", named("book_name"));
        let helpers = MigrationHelpers::new(&executor);

        helpers
            .add_constraint_with("Book", "name", AddOptions::force())
            .await
            .unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[1], "DROP CONSTRAINT `book_name`");
        assert!(statements[2].starts_with("CREATE CONSTRAINT"));
    }

    #[tokio::test]
    async fn test_drop_constraint() {
        let executor = ScriptedExecutor::new();
        executor.respond("SHOW CONSTRAINTS", named("book_name"));
        let helpers = MigrationHelpers::new(&executor);

        helpers.drop_constraint("Book", "name").await.unwrap();

        assert_eq!(executor.statements()[1], "DROP CONSTRAINT `book_name`");
    }

    #[tokio::test]
    async fn test_drop_missing_constraint() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        let err = helpers.drop_constraint("Book", "name").await.unwrap_err();

        assert_eq!(err.to_string(), "No such constraint for Book#name");
        assert_eq!(executor.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_add_index_creates_when_missing() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        helpers.add_index("Book", "author_name").await.unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].contains("owningConstraint IS NULL"));
        assert!(statements[1].contains("owningConstraint IS NOT NULL"));
        assert_eq!(
            statements[2],
            "CREATE INDEX FOR (n:`Book`) ON (n.`author_name`)"
        );
    }

    #[tokio::test]
    async fn test_add_index_on_constrained_property_is_duplicate() {
        let executor = ScriptedExecutor::new();
        executor.respond("owningConstraint IS NOT NULL", named("book_name_unique"));
        executor.respond("owningConstraint IS NOT NULL", named("book_name_unique"));
        let helpers = MigrationHelpers::new(&executor);

        let err = helpers.add_index("Book", "name").await.unwrap_err();
        assert_eq!(err.to_string(), "Duplicate index for Book#name");

        let forced = helpers
            .add_index_with("Book", "name", AddOptions::force())
            .await;
        assert!(matches!(forced, Err(AppError::DuplicateIndex { .. })));

        assert!(!executor
            .statements()
            .iter()
            .any(|s| s.starts_with("CREATE") || s.starts_with("DROP")));
    }

    #[tokio::test]
    async fn test_ensure_schema_skips_index_backed_by_constraint() {
        let executor = ScriptedExecutor::new();
        executor.respond("owningConstraint IS NOT NULL", named("book_name_unique"));
        let helpers = MigrationHelpers::new(&executor);

        let schema = EntitySchema::new("Book").indexed("name");
        assert_eq!(helpers.ensure_schema(&schema).await.unwrap(), 0);
        assert!(!executor.statements().iter().any(|s| s.starts_with("CREATE")));
    }

    #[tokio::test]
    async fn test_drop_with_empty_names_is_rejected() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        assert!(matches!(
            helpers.drop_constraint("", "name").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            helpers.drop_index("Book", " ").await,
            Err(AppError::Validation(_))
        ));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_index_duplicate() {
        let executor = ScriptedExecutor::new();
        executor.respond("SHOW INDEXES", named("book_author"));
        let helpers = MigrationHelpers::new(&executor);

        let err = helpers.add_index("Book", "author_name").await.unwrap_err();

        assert_eq!(err.to_string(), "Duplicate index for Book#author_name");
        assert_eq!(executor.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_add_index_force_replaces() {
        let executor = ScriptedExecutor::new();
        executor.respond("SHOW INDEXES", named("book_author"));
        let helpers = MigrationHelpers::new(&executor);

        helpers
            .add_index_with("Book", "author_name", AddOptions::force())
            .await
            .unwrap();

        let statements = executor.statements();
        assert_eq!(statements[1], "DROP INDEX `book_author`");
        assert!(statements[2].starts_with("CREATE INDEX"));
    }

    #[tokio::test]
    async fn test_drop_index() {
        let executor = ScriptedExecutor::new();
        executor.respond("SHOW INDEXES", named("book_author"));
        let helpers = MigrationHelpers::new(&executor);

        helpers.drop_index("Book", "author_name").await.unwrap();
        assert_eq!(executor.statements()[1], "DROP INDEX `book_author`");
    }

    #[tokio::test]
    async fn test_drop_missing_index() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        let err = helpers.drop_index("Book", "author_name").await.unwrap_err();

        assert_eq!(err.to_string(), "No such index for Book#author_name");
        assert!(matches!(err, AppError::NoSuchIndex { .. }));
        assert_eq!(executor.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_existence_checks() {
        let executor = ScriptedExecutor::new();
        executor.respond("SHOW CONSTRAINTS", named("book_name"));
        executor.respond(
            "RETURN properties",
            vec![Row::from_pairs([("properties", json!(["author_name"]))])],
        );
        let helpers = MigrationHelpers::new(&executor);

        assert!(helpers.constraint_exists("Book", "name").await.unwrap());
        assert!(!helpers.index_exists("Book", "name").await.unwrap());
        let indexes = helpers.indexes("Book").await.unwrap();
        assert_eq!(indexes.property_keys, vec![vec!["author_name".to_string()]]);
    }

    #[tokio::test]
    async fn test_ensure_schema_only_creates_missing() {
        let executor = ScriptedExecutor::new();
        // `name` is already constrained, `uuid` is not, `author_name` has no index.
        executor.respond("SHOW CONSTRAINTS", named("book_name"));
        let helpers = MigrationHelpers::new(&executor);

        let schema = EntitySchema::new("Book")
            .unique("name")
            .indexed("author_name")
            .id_property(IdProperty::default());
        let created = helpers.ensure_schema(&schema).await.unwrap();

        assert_eq!(created, 2);
        let creates: Vec<String> = executor
            .statements()
            .into_iter()
            .filter(|s| s.starts_with("CREATE"))
            .collect();
        assert_eq!(
            creates,
            vec![
                "CREATE CONSTRAINT FOR (n:`Book`) REQUIRE n.`uuid` IS UNIQUE",
                "CREATE INDEX FOR (n:`Book`) ON (n.`author_name`)",
            ]
        );
    }

    // -------------------------------------------------------------------------
    // Id population
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_populate_id_property_uuid_in_batches() {
        let executor = ScriptedExecutor::new();
        executor.respond("IS NULL RETURN count(n)", count(3));
        executor.respond("UNWIND", count(2));
        executor.respond("IS NULL RETURN count(n)", count(1));
        executor.respond("UNWIND", count(1));
        executor.respond("IS NULL RETURN count(n)", count(0));
        let output = MemoryOutput::new();
        let helpers = MigrationHelpers::new(&executor)
            .with_output(output.clone())
            .with_batch_size(2)
            .with_id_properties(IdPropertyRegistry::new().register("Book", IdProperty::default()));

        let populated = helpers.populate_id_property("Book").await.unwrap();

        assert_eq!(populated, 3);
        let batches: Vec<_> = executor
            .calls()
            .into_iter()
            .filter(|c| c.cypher.contains("UNWIND"))
            .collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].params.get("limit"), Some(&json!(2)));
        assert_eq!(batches[1].params.get("limit"), Some(&json!(1)));

        let ids: Vec<String> = batches
            .iter()
            .flat_map(|c| c.params["ids"].as_array().unwrap().clone())
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids.len(), 3);
        for id in &ids {
            let parsed = uuid::Uuid::parse_str(id).unwrap();
            assert_eq!(&parsed.to_string(), id);
        }

        let lines = output.lines();
        assert_eq!(lines[0], "   -> Running first batch...");
        assert!(lines[1].starts_with("   -> 1 nodes left. Last batch:"));
    }

    #[tokio::test]
    async fn test_populate_id_property_custom_generator() {
        let executor = ScriptedExecutor::new();
        executor.respond("IS NULL RETURN count(n)", count(2));
        executor.respond("UNWIND", count(2));
        let registry = IdPropertyRegistry::new().register(
            "Book",
            IdProperty::custom("code", || {
                Ok(json!(format!("custom-{}", uuid::Uuid::new_v4())))
            }),
        );
        let helpers = MigrationHelpers::new(&executor)
            .with_output(MemoryOutput::new())
            .with_id_properties(registry);

        assert_eq!(helpers.populate_id_property("Book").await.unwrap(), 2);

        let batch = executor
            .calls()
            .into_iter()
            .find(|c| c.cypher.contains("UNWIND"))
            .unwrap();
        assert!(batch.cypher.contains("SET node.`code` = value"));
        let ids = batch.params["ids"].as_array().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids
            .iter()
            .all(|id| id.as_str().unwrap().starts_with("custom-")));
    }

    #[tokio::test]
    async fn test_populate_id_property_generator_error_propagates() {
        let executor = ScriptedExecutor::new();
        executor.respond("IS NULL RETURN count(n)", count(1));
        let registry = IdPropertyRegistry::new().register(
            "Book",
            IdProperty::custom("code", || Err(AppError::Internal("sequence exhausted".into()))),
        );
        let helpers = MigrationHelpers::new(&executor)
            .with_output(MemoryOutput::new())
            .with_id_properties(registry);

        let err = helpers.populate_id_property("Book").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(ref m) if m == "sequence exhausted"));
        assert!(!executor.statements().iter().any(|s| s.contains("UNWIND")));
    }

    #[tokio::test]
    async fn test_populate_id_property_rejects_null_ids() {
        let executor = ScriptedExecutor::new();
        executor.respond("IS NULL RETURN count(n)", count(1));
        let registry = IdPropertyRegistry::new()
            .register("Book", IdProperty::custom("code", || Ok(JsonValue::Null)));
        let helpers = MigrationHelpers::new(&executor)
            .with_output(MemoryOutput::new())
            .with_id_properties(registry);

        assert!(matches!(
            helpers.populate_id_property("Book").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_populate_id_property_stops_when_nothing_assigned() {
        let executor = ScriptedExecutor::new();
        executor.respond("IS NULL RETURN count(n)", count(2));
        executor.respond("UNWIND", count(0));
        let helpers = MigrationHelpers::new(&executor)
            .with_output(MemoryOutput::new())
            .with_id_properties(IdPropertyRegistry::new().register("Book", IdProperty::default()));

        assert!(matches!(
            helpers.populate_id_property("Book").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_populate_id_property_unknown_label() {
        let executor = ScriptedExecutor::new();
        let helpers = MigrationHelpers::new(&executor);

        let err = helpers.populate_id_property("Shelf").await.unwrap_err();
        assert!(matches!(err, AppError::UnknownIdProperty(ref l) if l == "Shelf"));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_batch_size_from_config() {
        let executor = ScriptedExecutor::new();
        executor.respond("IS NULL RETURN count(n)", count(5));
        executor.respond("UNWIND", count(1));
        executor.respond("IS NULL RETURN count(n)", count(0));
        let config = MigrationsConfig { batch_size: 0 };
        let helpers = MigrationHelpers::new(&executor)
            .with_output(MemoryOutput::new())
            .with_config(&config)
            .with_id_properties(IdPropertyRegistry::new().register("Book", IdProperty::default()));

        assert_eq!(helpers.populate_id_property("Book").await.unwrap(), 1);
        let batch = executor
            .calls()
            .into_iter()
            .find(|c| c.cypher.contains("UNWIND"))
            .unwrap();
        assert_eq!(batch.params.get("limit"), Some(&json!(1)));
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_say() {
        let executor = ScriptedExecutor::new();
        let output = MemoryOutput::new();
        let helpers = MigrationHelpers::new(&executor).with_output(output.clone());

        helpers.say("Hello", false);
        helpers.say("Nested", true);

        assert_eq!(output.lines(), vec!["-- Hello", "   -> Nested"]);
    }

    #[tokio::test]
    async fn test_say_with_time_reports_elapsed_and_rows() {
        let executor = ScriptedExecutor::new();
        executor.respond("REMOVE n:`Book`", count(3));
        let output = MemoryOutput::new();
        let helpers = MigrationHelpers::new(&executor).with_output(output.clone());

        let rows = helpers
            .say_with_time(
                "Renaming Book to Publication",
                helpers.rename_label("Book", "Publication"),
            )
            .await
            .unwrap();

        assert_eq!(rows, 3);
        let lines = output.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "-- Renaming Book to Publication");
        assert!(lines[1].starts_with("   -> "));
        assert!(lines[1].ends_with('s'));
        let seconds: f64 = lines[1]["   -> ".len()..lines[1].len() - 1].parse().unwrap();
        assert!(seconds >= 0.0);
        assert_eq!(lines[2], "   -> 3 rows");
    }

    #[tokio::test]
    async fn test_say_with_time_without_row_count() {
        let executor = ScriptedExecutor::new();
        let output = MemoryOutput::new();
        let helpers = MigrationHelpers::new(&executor).with_output(output.clone());

        helpers
            .say_with_time("Adding constraint", helpers.add_constraint("Book", "name"))
            .await
            .unwrap();

        assert_eq!(output.lines().len(), 2);
    }

    #[tokio::test]
    async fn test_say_with_time_propagates_failure() {
        let executor = ScriptedExecutor::new();
        executor.respond("SHOW INDEXES", named("book_author"));
        let output = MemoryOutput::new();
        let helpers = MigrationHelpers::new(&executor).with_output(output.clone());

        let result = helpers
            .say_with_time("Adding index", helpers.add_index("Book", "author_name"))
            .await;

        assert!(matches!(result, Err(AppError::DuplicateIndex { .. })));
        assert_eq!(output.lines(), vec!["-- Adding index"]);
    }
}
