//! In-memory host document.
//!
//! This is the reference implementation of `HostDocument`.
//! It keeps hosts and linear elements in scan-ordered vectors behind a
//! single RwLock.
//!
//! ## Semantics
//!
//! - **Staged writes**: `set_host_id()` and `set_entity_parameter()` are
//!   validated immediately but only recorded on the transaction. `commit_tx()`
//!   applies them in order; `rollback_tx()` drops them.
//! - **Read-your-writes**: reads through a transaction see that
//!   transaction's staged writes. Other transactions do not.
//! - **Grouped elements**: a linear element marked grouped rejects
//!   `set_host_id()` with `Error::HostLinkUnsupported`.
//! - **Broken hosts**: a host added with `add_broken_host()` fails geometry
//!   extraction.
//!
//! Use this document for:
//! - Testing the cache, resolver and propagator end to end
//! - Embedding the linker where the model is already in memory

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::kernel::Solid;
use crate::model::*;
use crate::tx::{Transaction, TxId, TxMode};
use crate::{Error, Result};
use super::HostDocument;

// ============================================================================
// Records
// ============================================================================

/// Geometry of a stored host.
#[derive(Debug, Clone)]
pub enum HostGeometry {
    Solids(Vec<Solid>),
    /// Extraction fails with this message.
    Broken(String),
}

/// A stored host element.
#[derive(Debug, Clone)]
pub struct HostRecord {
    pub id: ElementId,
    pub geometry: HostGeometry,
    pub parameters: HashMap<String, Parameter>,
}

/// A stored linear element.
#[derive(Debug, Clone)]
pub struct LinearRecord {
    pub id: ElementId,
    pub curves: Vec<Curve>,
    pub host: Option<ElementId>,
    pub grouped: bool,
    pub parameters: HashMap<String, Parameter>,
}

impl LinearRecord {
    pub fn parameter_value(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name).and_then(|p| p.value.as_ref())
    }
}

#[derive(Default)]
struct DocState {
    hosts: Vec<HostRecord>,
    host_index: HashMap<ElementId, usize>,
    linears: Vec<LinearRecord>,
    linear_index: HashMap<ElementId, usize>,
}

impl DocState {
    fn host(&self, id: ElementId) -> Result<&HostRecord> {
        self.host_index
            .get(&id)
            .map(|&i| &self.hosts[i])
            .ok_or_else(|| Error::NotFound(format!("Host {id}")))
    }

    fn linear(&self, id: ElementId) -> Result<&LinearRecord> {
        self.linear_index
            .get(&id)
            .map(|&i| &self.linears[i])
            .ok_or_else(|| Error::NotFound(format!("Linear element {id}")))
    }

    fn linear_mut(&mut self, id: ElementId) -> Result<&mut LinearRecord> {
        let i = *self
            .linear_index
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("Linear element {id}")))?;
        Ok(&mut self.linears[i])
    }

    fn apply(&mut self, write: StagedWrite) -> Result<()> {
        match write {
            StagedWrite::HostLink { element, host } => {
                self.linear_mut(element)?.host = Some(host);
            }
            StagedWrite::Parameter { element, name, value } => {
                let record = self.linear_mut(element)?;
                let param = record
                    .parameters
                    .get_mut(&name)
                    .ok_or_else(|| Error::NotFound(format!("Parameter '{name}' on {element}")))?;
                param.value = Some(value);
            }
        }
        Ok(())
    }
}

// ============================================================================
// MemoryDocument
// ============================================================================

/// In-memory host document.
#[derive(Clone)]
pub struct MemoryDocument {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    state: RwLock<DocState>,
    next_element_id: AtomicU64,
    next_tx_id: AtomicU64,
    fail_next_commit: AtomicBool,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                state: RwLock::new(DocState::default()),
                next_element_id: AtomicU64::new(1),
                next_tx_id: AtomicU64::new(1),
                fail_next_commit: AtomicBool::new(false),
            }),
        }
    }

    fn next_id(&self) -> ElementId {
        ElementId(self.inner.next_element_id.fetch_add(1, Ordering::Relaxed))
    }

    // ========================================================================
    // Population
    // ========================================================================

    /// Add a host whose geometry is `solids`. Appended to the scan order.
    pub fn add_host(&self, solids: Vec<Solid>) -> ElementId {
        self.push_host(HostGeometry::Solids(solids))
    }

    /// Add a host whose geometry extraction always fails.
    pub fn add_broken_host(&self, reason: impl Into<String>) -> ElementId {
        self.push_host(HostGeometry::Broken(reason.into()))
    }

    fn push_host(&self, geometry: HostGeometry) -> ElementId {
        let id = self.next_id();
        let mut state = self.inner.state.write();
        let i = state.hosts.len();
        state.hosts.push(HostRecord { id, geometry, parameters: HashMap::new() });
        state.host_index.insert(id, i);
        id
    }

    /// Define or replace a host parameter.
    pub fn set_host_parameter(&self, id: ElementId, param: Parameter) -> Result<()> {
        let mut state = self.inner.state.write();
        let i = *state
            .host_index
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("Host {id}")))?;
        state.hosts[i].parameters.insert(param.name.clone(), param);
        Ok(())
    }

    /// Add a linear element with the given centerline. Appended to the
    /// scan order.
    pub fn add_linear(&self, curves: Vec<Curve>) -> ElementId {
        let id = self.next_id();
        let mut state = self.inner.state.write();
        let i = state.linears.len();
        state.linears.push(LinearRecord {
            id,
            curves,
            host: None,
            grouped: false,
            parameters: HashMap::new(),
        });
        state.linear_index.insert(id, i);
        id
    }

    /// Define or replace a linear element parameter.
    pub fn define_parameter(&self, id: ElementId, param: Parameter) -> Result<()> {
        let mut state = self.inner.state.write();
        state.linear_mut(id)?.parameters.insert(param.name.clone(), param);
        Ok(())
    }

    /// Mark a linear element as a group member.
    pub fn set_grouped(&self, id: ElementId, grouped: bool) -> Result<()> {
        self.inner.state.write().linear_mut(id)?.grouped = grouped;
        Ok(())
    }

    /// Make the next `commit_tx()` fail and discard its writes.
    pub fn fail_next_commit(&self) {
        self.inner.fail_next_commit.store(true, Ordering::Relaxed);
    }

    // ========================================================================
    // Committed-state snapshots
    // ========================================================================

    /// Committed snapshot of a linear element.
    pub fn linear(&self, id: ElementId) -> Option<LinearRecord> {
        self.inner.state.read().linear(id).ok().cloned()
    }

    /// Committed snapshot of every linear element, in scan order.
    pub fn linears(&self) -> Vec<LinearRecord> {
        self.inner.state.read().linears.clone()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

#[derive(Debug, Clone)]
enum StagedWrite {
    HostLink { element: ElementId, host: ElementId },
    Parameter { element: ElementId, name: String, value: ParamValue },
}

/// In-memory transaction holding staged writes until commit.
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
    name: String,
    writes: Vec<StagedWrite>,
}

impl MemoryTx {
    /// Number of writes staged so far.
    pub fn staged(&self) -> usize {
        self.writes.len()
    }

    fn require_writable(&self) -> Result<()> {
        if self.is_writable() {
            Ok(())
        } else {
            Err(Error::TxError(format!("transaction '{}' is read-only", self.name)))
        }
    }

    fn staged_host(&self, element: ElementId) -> Option<ElementId> {
        self.writes.iter().rev().find_map(|w| match w {
            StagedWrite::HostLink { element: e, host } if *e == element => Some(*host),
            _ => None,
        })
    }

    fn staged_parameter(&self, element: ElementId, name: &str) -> Option<&ParamValue> {
        self.writes.iter().rev().find_map(|w| match w {
            StagedWrite::Parameter { element: e, name: n, value } if *e == element && n == name => {
                Some(value)
            }
            _ => None,
        })
    }
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode { self.mode }
    fn id(&self) -> TxId { self.id }
    fn name(&self) -> &str { &self.name }
}

// ============================================================================
// HostDocument impl
// ============================================================================

#[async_trait]
impl HostDocument for MemoryDocument {
    type Tx = MemoryTx;
    type Solid = Solid;

    async fn begin_tx(&self, mode: TxMode, name: &str) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(MemoryTx { id, mode, name: name.to_owned(), writes: Vec::new() })
    }

    async fn commit_tx(&self, tx: MemoryTx) -> Result<()> {
        if self.inner.fail_next_commit.swap(false, Ordering::Relaxed) {
            return Err(Error::TxError(format!("commit of '{}' failed", tx.name)));
        }
        let mut state = self.inner.state.write();
        // Validate first so a bad write leaves the document untouched.
        for write in &tx.writes {
            let element = match write {
                StagedWrite::HostLink { element, .. } | StagedWrite::Parameter { element, .. } => *element,
            };
            state.linear(element)?;
        }
        for write in tx.writes {
            state.apply(write)?;
        }
        Ok(())
    }

    async fn rollback_tx(&self, _tx: MemoryTx) -> Result<()> {
        Ok(())
    }

    // ========================================================================
    // Hosts
    // ========================================================================

    async fn host_ids(&self, _tx: &MemoryTx) -> Result<Vec<ElementId>> {
        Ok(self.inner.state.read().hosts.iter().map(|h| h.id).collect())
    }

    async fn host_solids(&self, _tx: &MemoryTx, id: ElementId) -> Result<Vec<Solid>> {
        let state = self.inner.state.read();
        match &state.host(id)?.geometry {
            HostGeometry::Solids(solids) => Ok(solids.clone()),
            HostGeometry::Broken(reason) => Err(Error::Geometry(reason.clone())),
        }
    }

    async fn host_parameter(
        &self,
        _tx: &MemoryTx,
        id: ElementId,
        name: &str,
    ) -> Result<Option<Parameter>> {
        Ok(self.inner.state.read().host(id)?.parameters.get(name).cloned())
    }

    // ========================================================================
    // Linear elements
    // ========================================================================

    async fn linear_ids(&self, _tx: &MemoryTx) -> Result<Vec<ElementId>> {
        Ok(self.inner.state.read().linears.iter().map(|l| l.id).collect())
    }

    async fn centerline_curves(&self, _tx: &MemoryTx, id: ElementId) -> Result<Vec<Curve>> {
        Ok(self.inner.state.read().linear(id)?.curves.clone())
    }

    async fn entity_parameter(
        &self,
        tx: &MemoryTx,
        id: ElementId,
        name: &str,
    ) -> Result<Option<Parameter>> {
        let state = self.inner.state.read();
        let Some(param) = state.linear(id)?.parameters.get(name) else {
            return Ok(None);
        };
        let mut param = param.clone();
        if let Some(staged) = tx.staged_parameter(id, name) {
            param.value = Some(staged.clone());
        }
        Ok(Some(param))
    }

    async fn set_entity_parameter(
        &self,
        tx: &mut MemoryTx,
        id: ElementId,
        name: &str,
        value: ParamValue,
    ) -> Result<()> {
        tx.require_writable()?;
        {
            let state = self.inner.state.read();
            let param = state
                .linear(id)?
                .parameters
                .get(name)
                .ok_or_else(|| Error::NotFound(format!("Parameter '{name}' on {id}")))?;
            if param.read_only {
                return Err(Error::ReadOnlyParameter { element: id, name: name.to_owned() });
            }
            if param.storage_type != value.storage_type() {
                return Err(Error::TypeError {
                    expected: param.storage_type.to_string(),
                    got: value.storage_type().to_string(),
                });
            }
        }
        tx.writes.push(StagedWrite::Parameter { element: id, name: name.to_owned(), value });
        Ok(())
    }

    async fn host_of(&self, tx: &MemoryTx, id: ElementId) -> Result<Option<ElementId>> {
        let committed = self.inner.state.read().linear(id)?.host;
        Ok(tx.staged_host(id).or(committed))
    }

    async fn set_host_id(&self, tx: &mut MemoryTx, id: ElementId, host: ElementId) -> Result<()> {
        tx.require_writable()?;
        {
            let state = self.inner.state.read();
            if state.linear(id)?.grouped {
                return Err(Error::HostLinkUnsupported(id));
            }
            state.host(host)?;
        }
        tx.writes.push(StagedWrite::HostLink { element: id, host });
        Ok(())
    }
}
