//! Result of resolving one linear element.

use serde::{Deserialize, Serialize};
use super::ElementId;

/// Zero-or-one host for a linear element.
///
/// Transient: produced by the resolver, consumed by the propagator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostAssignment {
    Resolved(ElementId),
    Unresolved,
}

impl HostAssignment {
    pub fn host(&self) -> Option<ElementId> {
        match self {
            HostAssignment::Resolved(id) => Some(*id),
            HostAssignment::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, HostAssignment::Resolved(_))
    }
}

impl From<Option<ElementId>> for HostAssignment {
    fn from(host: Option<ElementId>) -> Self {
        match host {
            Some(id) => HostAssignment::Resolved(id),
            None => HostAssignment::Unresolved,
        }
    }
}
