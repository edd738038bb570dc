//! Attribute propagator — writes a resolution onto its linear element.
//!
//! Exactly one `PropagationMode` is active per deployment. The propagator
//! never switches mode per element, even when a host link is rejected.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::GeometryCache;
use crate::document::HostDocument;
use crate::model::{ElementId, HostAssignment, ParamValue, StorageType};
use crate::{Error, Result};

/// What a resolved linear element receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropagationMode {
    /// Set the element's host reference to the resolved host.
    HostLink,
    /// Copy the host's derived attribute into the element parameter `target`.
    AttributeCopy { target: String },
}

/// Why an attribute copy wrote nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The element has no parameter with the target name.
    MissingAttribute,
    /// The resolved host has no derived attribute value.
    NoDerivedValue,
    /// The target parameter does not store element ids.
    StorageMismatch,
    ReadOnly,
}

/// Outcome of propagating one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Propagation {
    /// Unresolved assignment; nothing to do.
    NoHost,
    Linked,
    AttributeSet,
    /// The element already carries the value.
    Unchanged,
    Skipped(SkipReason),
    /// The document refused the host link (grouped element).
    LinkRejected,
}

pub struct Propagator<'a> {
    mode: &'a PropagationMode,
}

impl<'a> Propagator<'a> {
    pub fn new(mode: &'a PropagationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> &PropagationMode {
        self.mode
    }

    /// Apply `assignment` to `element` inside the caller's transaction.
    ///
    /// Contained outcomes come back as `Ok`. Any other document error is
    /// returned and the caller must not commit.
    pub async fn apply<D: HostDocument>(
        &self,
        doc: &D,
        tx: &mut D::Tx,
        cache: &GeometryCache<D::Solid>,
        element: ElementId,
        assignment: HostAssignment,
    ) -> Result<Propagation> {
        let Some(host) = assignment.host() else {
            return Ok(Propagation::NoHost);
        };
        match self.mode {
            PropagationMode::HostLink => self.link(doc, tx, element, host).await,
            PropagationMode::AttributeCopy { target } => {
                self.copy(doc, tx, element, target, cache.derived(host)).await
            }
        }
    }

    async fn link<D: HostDocument>(
        &self,
        doc: &D,
        tx: &mut D::Tx,
        element: ElementId,
        host: ElementId,
    ) -> Result<Propagation> {
        if doc.host_of(tx, element).await? == Some(host) {
            return Ok(Propagation::Unchanged);
        }
        match doc.set_host_id(tx, element, host).await {
            Ok(()) => Ok(Propagation::Linked),
            Err(Error::HostLinkUnsupported(id)) => {
                warn!(element = %id, host = %host, "host link not supported for grouped element");
                Ok(Propagation::LinkRejected)
            }
            Err(e) => Err(e),
        }
    }

    async fn copy<D: HostDocument>(
        &self,
        doc: &D,
        tx: &mut D::Tx,
        element: ElementId,
        target: &str,
        derived: Option<ElementId>,
    ) -> Result<Propagation> {
        let Some(param) = doc.entity_parameter(tx, element, target).await? else {
            return Ok(Propagation::Skipped(SkipReason::MissingAttribute));
        };
        let Some(value) = derived else {
            return Ok(Propagation::Skipped(SkipReason::NoDerivedValue));
        };
        if param.storage_type != StorageType::ElementId {
            return Ok(Propagation::Skipped(SkipReason::StorageMismatch));
        }
        if param.element_id() == Some(value) {
            return Ok(Propagation::Unchanged);
        }
        if param.read_only {
            return Ok(Propagation::Skipped(SkipReason::ReadOnly));
        }
        match doc.set_entity_parameter(tx, element, target, ParamValue::ElementId(value)).await {
            Ok(()) => Ok(Propagation::AttributeSet),
            Err(Error::ReadOnlyParameter { .. }) => Ok(Propagation::Skipped(SkipReason::ReadOnly)),
            Err(e) => Err(e),
        }
    }
}
