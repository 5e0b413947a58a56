//! Per-identifier grant outcomes delivered back to callers.

use crate::PermissionSet;
use serde::{Deserialize, Serialize};

/// Grant status for a single permission identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Permission identifier.
    pub permission: String,
    /// Whether the operating system granted it.
    pub granted: bool,
}

/// Ordered mapping of permission identifier to grant status.
///
/// Entries follow the order of the originating [`PermissionSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantResult {
    entries: Vec<PermissionGrant>,
}

impl GrantResult {
    /// Pair each requested identifier with the flag reported at the same index.
    ///
    /// Missing flags count as denied. An interrupted prompt reports no flags at
    /// all, which resolves every identifier as denied.
    pub fn from_flags(permissions: &PermissionSet, granted: &[bool]) -> Self {
        let entries = permissions
            .iter()
            .enumerate()
            .map(|(idx, permission)| PermissionGrant {
                permission: permission.to_string(),
                granted: granted.get(idx).copied().unwrap_or(false),
            })
            .collect();
        Self { entries }
    }

    /// Grant status for an identifier, or `None` if it was not requested.
    pub fn get(&self, permission: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|entry| entry.permission == permission)
            .map(|entry| entry.granted)
    }

    /// Whether the identifier was requested and granted.
    pub fn is_granted(&self, permission: &str) -> bool {
        self.get(permission).unwrap_or(false)
    }

    pub fn all_granted(&self) -> bool {
        self.entries.iter().all(|entry| entry.granted)
    }

    pub fn all_denied(&self) -> bool {
        self.entries.iter().all(|entry| !entry.granted)
    }

    /// Identifiers that were granted, in request order.
    pub fn granted(&self) -> Vec<&str> {
        self.filter_by(true)
    }

    /// Identifiers that were denied, in request order.
    pub fn denied(&self) -> Vec<&str> {
        self.filter_by(false)
    }

    /// Iterate entries in request order.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionGrant> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn filter_by(&self, granted: bool) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.granted == granted)
            .map(|entry| entry.permission.as_str())
            .collect()
    }
}
