//! Static schema declarations per node label.
//!
//! An [`EntitySchema`] lists which properties of a label are indexed or
//! uniquely constrained and how its id property is generated. Migrations use
//! it to bring a database in line with the declared model.

use crate::models::{IdProperty, IdPropertyRegistry, Label, PropertyKey};

/// Kind of index declared on a property. Neo4j 5 creates range indexes by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Range,
}

/// Kind of constraint declared on a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
}

/// Declaration of one property of a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    pub name: PropertyKey,
    pub index: Option<IndexKind>,
    pub constraint: Option<ConstraintKind>,
}

/// Declared schema of a node label.
///
/// # Example
///
/// ```
/// use graphshift::models::{EntitySchema, IdProperty};
///
/// let book = EntitySchema::new("Book")
///     .unique("name")
///     .indexed("author_name")
///     .id_property(IdProperty::default());
///
/// assert_eq!(book.properties.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub label: Label,
    pub properties: Vec<PropertySchema>,
    pub id_property: Option<IdProperty>,
}

impl EntitySchema {
    pub fn new(label: impl Into<Label>) -> Self {
        Self {
            label: label.into(),
            properties: Vec::new(),
            id_property: None,
        }
    }

    /// Declares a property with neither index nor constraint.
    pub fn property(self, name: impl Into<PropertyKey>) -> Self {
        self.with_property(name.into(), None, None)
    }

    /// Declares a property backed by a range index.
    pub fn indexed(self, name: impl Into<PropertyKey>) -> Self {
        self.with_property(name.into(), Some(IndexKind::Range), None)
    }

    /// Declares a property with a uniqueness constraint.
    pub fn unique(self, name: impl Into<PropertyKey>) -> Self {
        self.with_property(name.into(), None, Some(ConstraintKind::Unique))
    }

    /// Declares the id property. It is implicitly unique.
    pub fn id_property(mut self, policy: IdProperty) -> Self {
        self.id_property = Some(policy);
        self
    }

    fn with_property(
        mut self,
        name: PropertyKey,
        index: Option<IndexKind>,
        constraint: Option<ConstraintKind>,
    ) -> Self {
        // Redeclaring a property replaces the earlier declaration.
        self.properties.retain(|p| p.name != name);
        self.properties.push(PropertySchema {
            name,
            index,
            constraint,
        });
        self
    }

    /// Properties that must carry a uniqueness constraint, id property included.
    pub fn unique_properties(&self) -> Vec<&PropertyKey> {
        let mut keys: Vec<&PropertyKey> = self
            .properties
            .iter()
            .filter(|p| p.constraint == Some(ConstraintKind::Unique))
            .map(|p| &p.name)
            .collect();
        if let Some(id) = &self.id_property {
            if !keys.contains(&&id.name) {
                keys.push(&id.name);
            }
        }
        keys
    }

    /// Properties that must carry a plain index.
    pub fn indexed_properties(&self) -> Vec<&PropertyKey> {
        self.properties
            .iter()
            .filter(|p| p.index.is_some())
            .map(|p| &p.name)
            .collect()
    }
}

impl IdPropertyRegistry {
    /// Collects the id policies declared by `schemas`.
    pub fn from_schemas<'a>(schemas: impl IntoIterator<Item = &'a EntitySchema>) -> Self {
        schemas
            .into_iter()
            .filter_map(|s| s.id_property.clone().map(|p| (s.label.clone(), p)))
            .fold(Self::new(), |registry, (label, policy)| {
                registry.register(label, policy)
            })
    }
}
