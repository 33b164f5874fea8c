//! Schema identifiers: labels, property keys and relationship types.
//!
//! All three are plain names. They are interpolated into Cypher text rather
//! than bound as parameters, so each one carries a [`quoted`](Label::quoted)
//! rendering that is always safe to splice into a statement.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::graph::cypher::quote;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Backtick-quoted form for Cypher text.
            pub fn quoted(&self) -> String {
                quote(&self.0)
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }

            /// Fails with [`AppError::Validation`] for a blank name.
            pub fn ensure_named(&self) -> Result<(), AppError> {
                if self.is_empty() {
                    Err(AppError::Validation(format!(
                        "{} name must not be empty",
                        $kind
                    )))
                } else {
                    Ok(())
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }

        impl From<&$name> for $name {
            fn from(name: &$name) -> Self {
                name.clone()
            }
        }
    };
}

identifier!(
    /// A node label, e.g. `Book`.
    Label,
    "label"
);

identifier!(
    /// A node property key, e.g. `author_name`.
    PropertyKey,
    "property"
);

identifier!(
    /// A relationship type, e.g. `WROTE`.
    RelationshipType,
    "relationship type"
);
