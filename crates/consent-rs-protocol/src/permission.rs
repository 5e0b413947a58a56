//! Ordered permission sets submitted for a single prompt.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Errors returned when building a permission set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionSetError {
    /// No identifiers were supplied.
    #[error("permission set must not be empty")]
    Empty,
    /// The same identifier appeared more than once.
    #[error("duplicate permission identifier: {0}")]
    Duplicate(String),
}

/// Ordered, non-empty sequence of distinct permission identifiers.
///
/// Order is preserved so that results can be reported per identifier in the
/// order the caller asked for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PermissionSet(Vec<String>);

impl PermissionSet {
    /// Build a set from identifiers, rejecting empty input and duplicates.
    pub fn new<I, S>(identifiers: I) -> Result<Self, PermissionSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identifiers: Vec<String> = identifiers.into_iter().map(Into::into).collect();
        if identifiers.is_empty() {
            return Err(PermissionSetError::Empty);
        }
        let mut seen = HashSet::with_capacity(identifiers.len());
        for identifier in &identifiers {
            if !seen.insert(identifier.as_str()) {
                return Err(PermissionSetError::Duplicate(identifier.clone()));
            }
        }
        Ok(Self(identifiers))
    }

    /// Number of identifiers in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a set built through [`PermissionSet::new`].
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the set names the given identifier.
    pub fn contains(&self, identifier: &str) -> bool {
        self.0.iter().any(|candidate| candidate == identifier)
    }

    /// Iterate identifiers in request order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Borrow the identifiers as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether `reported` lists exactly these identifiers in the same order.
    pub fn matches(&self, reported: &[String]) -> bool {
        self.0.as_slice() == reported
    }
}

impl TryFrom<Vec<String>> for PermissionSet {
    type Error = PermissionSetError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionSet> for Vec<String> {
    fn from(value: PermissionSet) -> Self {
        value.0
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}
