//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// Generates a validated string newtype with common trait implementations.
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value after validation.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(value))
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

validated_string!(
    /// A validated event identifier.
    ///
    /// Event IDs must be non-empty strings, assigned once at event creation
    /// and never reused. Uniqueness is enforced at the storage level.
    EventId, "event ID"
);

validated_string!(
    /// A validated user identifier.
    ///
    /// User IDs must be non-empty strings. The original casing is preserved
    /// for display; comparisons between users are case-insensitive via
    /// [`UserId::matching_key`].
    UserId, "user ID"
);

impl UserId {
    /// Returns the lower-cased form used when matching users.
    ///
    /// Two IDs that differ only in case refer to the same user.
    #[must_use]
    pub fn matching_key(&self) -> String {
        self.0.to_lowercase()
    }

    /// True when `other` identifies the same user, ignoring case.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}
