//! Element identity.

use serde::{Deserialize, Serialize};

/// Opaque element identifier, shared by hosts and linear elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ElementId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
