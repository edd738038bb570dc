//! # Host Document Trait
//!
//! This is THE contract between the linker and the host CAD platform.
//! The document enumerates hosts and linear elements, exposes geometry and
//! parameters, and stages writes inside transactions it owns.
//!
//! ## Implementations
//!
//! | Document | Module | Description |
//! |----------|--------|-------------|
//! | `MemoryDocument` | `memory` | In-memory, transactional, for testing/embedding |

pub mod memory;

use async_trait::async_trait;
use crate::model::*;
use crate::tx::{Transaction, TxMode};
use crate::Result;

pub use memory::{MemoryDocument, MemoryTx};

// ============================================================================
// HostDocument Trait
// ============================================================================

/// The host platform contract.
///
/// Reads take `&Self::Tx`, writes take `&mut Self::Tx`. Writes are only
/// visible to other transactions after `commit_tx`.
#[async_trait]
pub trait HostDocument: Send + Sync + 'static {
    /// The transaction type for this document.
    type Tx: Transaction;

    /// The solid body type this document's geometry is expressed in.
    type Solid: Clone + std::fmt::Debug + Send + Sync;

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Begin a new transaction. `name` labels it in the host's undo history.
    async fn begin_tx(&self, mode: TxMode, name: &str) -> Result<Self::Tx>;

    /// Commit a transaction, applying all staged writes atomically.
    async fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    /// Roll back a transaction, discarding all staged writes.
    async fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Hosts
    // ========================================================================

    /// All host ids, in document scan order.
    async fn host_ids(&self, tx: &Self::Tx) -> Result<Vec<ElementId>>;

    /// Solid geometry objects of a host, in document order.
    ///
    /// Non-solid geometry objects are omitted. `Err` means extraction failed.
    async fn host_solids(&self, tx: &Self::Tx, id: ElementId) -> Result<Vec<Self::Solid>>;

    /// Look up a host parameter by name.
    async fn host_parameter(
        &self,
        tx: &Self::Tx,
        id: ElementId,
        name: &str,
    ) -> Result<Option<Parameter>>;

    // ========================================================================
    // Linear elements
    // ========================================================================

    /// All linear element ids, in document scan order.
    async fn linear_ids(&self, tx: &Self::Tx) -> Result<Vec<ElementId>>;

    /// Centerline curves of a linear element. May be empty.
    async fn centerline_curves(&self, tx: &Self::Tx, id: ElementId) -> Result<Vec<Curve>>;

    /// Look up a linear element parameter by name.
    async fn entity_parameter(
        &self,
        tx: &Self::Tx,
        id: ElementId,
        name: &str,
    ) -> Result<Option<Parameter>>;

    /// Set a linear element parameter's value.
    ///
    /// Fails with `Error::ReadOnlyParameter` for read-only parameters and
    /// `Error::NotFound` when the parameter is absent.
    async fn set_entity_parameter(
        &self,
        tx: &mut Self::Tx,
        id: ElementId,
        name: &str,
        value: ParamValue,
    ) -> Result<()>;

    /// Current host link of a linear element.
    async fn host_of(&self, tx: &Self::Tx, id: ElementId) -> Result<Option<ElementId>>;

    /// Link a linear element to a host.
    ///
    /// Fails with `Error::HostLinkUnsupported` for grouped elements.
    async fn set_host_id(&self, tx: &mut Self::Tx, id: ElementId, host: ElementId) -> Result<()>;

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of hosts.
    ///
    /// Default: counts `host_ids()`.
    async fn host_count(&self, tx: &Self::Tx) -> Result<u64> {
        Ok(self.host_ids(tx).await?.len() as u64)
    }

    /// Number of linear elements.
    ///
    /// Default: counts `linear_ids()`.
    async fn linear_count(&self, tx: &Self::Tx) -> Result<u64> {
        Ok(self.linear_ids(tx).await?.len() as u64)
    }
}
