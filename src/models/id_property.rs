//! Id property policies: which property identifies nodes of a label and how
//! new values for it are produced.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::models::{Label, PropertyKey};

/// Property name used when a label declares a UUID id without naming it.
pub const DEFAULT_ID_PROPERTY: &str = "uuid";

/// User-supplied id generator, invoked once per node that needs an id.
pub type IdGenerator = Arc<dyn Fn() -> Result<JsonValue, AppError> + Send + Sync>;

/// How values for an id property are generated.
#[derive(Clone)]
pub enum IdGeneration {
    /// Random v4 UUID, lowercase and hyphenated.
    Uuid,
    /// Caller-provided generator.
    Custom(IdGenerator),
}

impl fmt::Debug for IdGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdGeneration::Uuid => f.write_str("Uuid"),
            IdGeneration::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// The id policy of one label.
#[derive(Debug, Clone)]
pub struct IdProperty {
    pub name: PropertyKey,
    pub generation: IdGeneration,
}

impl IdProperty {
    /// Id property filled with generated UUIDs.
    pub fn uuid(name: impl Into<PropertyKey>) -> Self {
        Self {
            name: name.into(),
            generation: IdGeneration::Uuid,
        }
    }

    /// Id property filled by `generator`.
    ///
    /// # Example
    ///
    /// ```
    /// use graphshift::models::IdProperty;
    /// use serde_json::json;
    ///
    /// let policy = IdProperty::custom("code", || Ok(json!("BK-001")));
    /// assert_eq!(policy.generate().unwrap(), json!("BK-001"));
    /// ```
    pub fn custom<F>(name: impl Into<PropertyKey>, generator: F) -> Self
    where
        F: Fn() -> Result<JsonValue, AppError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            generation: IdGeneration::Custom(Arc::new(generator)),
        }
    }

    /// Produces one new id value.
    pub fn generate(&self) -> Result<JsonValue, AppError> {
        match &self.generation {
            IdGeneration::Uuid => Ok(JsonValue::String(uuid::Uuid::new_v4().to_string())),
            IdGeneration::Custom(generator) => generator(),
        }
    }
}

impl Default for IdProperty {
    fn default() -> Self {
        Self::uuid(DEFAULT_ID_PROPERTY)
    }
}

/// Id policies by label.
#[derive(Debug, Clone, Default)]
pub struct IdPropertyRegistry {
    policies: HashMap<Label, IdProperty>,
}

impl IdPropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the policy for `label`, builder style.
    pub fn register(mut self, label: impl Into<Label>, policy: IdProperty) -> Self {
        self.insert(label, policy);
        self
    }

    pub fn insert(&mut self, label: impl Into<Label>, policy: IdProperty) {
        self.policies.insert(label.into(), policy);
    }

    pub fn get(&self, label: &Label) -> Option<&IdProperty> {
        self.policies.get(label)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
