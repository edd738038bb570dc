//! # hostlink — Resolve hosts for linear elements
//!
//! For every linear element (a rebar) find the single volumetric host (a
//! wall) its centerline sits in, then write the result back: either a
//! direct host link or a copied host attribute such as the level id.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `HostDocument` and `SolidKernel` are the contracts with
//!    the CAD platform; the linker never sees their internals
//! 2. **Clean DTOs**: `ElementId`, `Curve`, `Parameter` cross all boundaries
//! 3. **First match wins**: hosts are tried in document order, no ranking
//! 4. **Contained failures**: bad hosts and bad probes never abort a batch
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hostlink::{Linker, LinkConfig, Curve, Xyz, MemoryDocument, ReferenceKernel, Solid};
//!
//! # async fn example() -> hostlink::Result<()> {
//! let doc = MemoryDocument::new();
//! let wall = doc.add_host(vec![Solid::cuboid(Xyz::new(-5.0, -0.5, 0.0), Xyz::new(5.0, 0.5, 3.0))]);
//! let bar = doc.add_linear(vec![Curve::line(Xyz::new(-4.0, 0.0, 1.0), Xyz::new(4.0, 0.0, 1.0))]);
//!
//! let linker = Linker::new(doc, ReferenceKernel::new(), LinkConfig::default().with_probe_radius(0.2))?;
//! let report = linker.execute().await?;
//! assert_eq!(report.links_set, 1);
//! # let _ = (wall, bar);
//! # Ok(())
//! # }
//! ```
//!
//! ## Implementations shipped
//!
//! | Seam | Implementation | Description |
//! |------|----------------|-------------|
//! | `HostDocument` | `MemoryDocument` | Transactional in-memory model |
//! | `SolidKernel` | `ReferenceKernel` | Analytic boxes and balls |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod tx;
pub mod document;
pub mod kernel;
pub mod config;
pub mod cache;
pub mod probe;
pub mod resolve;
pub mod propagate;
pub mod execution;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Aabb, Curve, CurveLoop, ElementId, Frame, HostAssignment,
    Parameter, ParamValue, StorageType, Xyz,
};

// ============================================================================
// Re-exports: Collaborators
// ============================================================================

pub use document::{HostDocument, MemoryDocument, MemoryTx};
pub use kernel::{ReferenceKernel, Solid, SolidKernel};
pub use tx::{Transaction, TxId, TxMode};

// ============================================================================
// Re-exports: Pipeline
// ============================================================================

pub use config::LinkConfig;
pub use cache::{CacheStats, GeometryCache};
pub use probe::{Probe, ProbeBuilder};
pub use resolve::{ResolveStats, Resolver};
pub use propagate::{Propagation, PropagationMode, Propagator, SkipReason};
pub use execution::{BatchReport, EntityOutcome, EntityReport};

// ============================================================================
// Top-level Linker handle
// ============================================================================

/// The primary entry point. A `Linker` pairs a document with its solid
/// kernel under one deployment configuration.
pub struct Linker<D, K>
where
    D: HostDocument,
    K: SolidKernel<Solid = D::Solid>,
{
    document: D,
    kernel: K,
    config: LinkConfig,
}

impl<D, K> Linker<D, K>
where
    D: HostDocument,
    K: SolidKernel<Solid = D::Solid>,
{
    /// Create a Linker. Fails if `config` is invalid.
    pub fn new(document: D, kernel: K, config: LinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { document, kernel, config })
    }

    /// Run one batch inside the caller's transaction.
    ///
    /// Nothing is committed; on `Err` the caller should roll back.
    pub async fn run(&self, tx: &mut D::Tx) -> Result<BatchReport> {
        execution::run_batch(&self.document, &self.kernel, &self.config, tx).await
    }

    /// Resolve every linear element without writing, in a read-only
    /// transaction that is rolled back afterwards.
    pub async fn preview(&self) -> Result<BatchReport> {
        let tx = self.document.begin_tx(TxMode::ReadOnly, &self.config.transaction_name).await?;
        let result = execution::resolve_batch(&self.document, &self.kernel, &self.config, &tx).await;
        self.document.rollback_tx(tx).await?;
        result
    }

    /// Begin a read-write transaction, run one batch, commit.
    ///
    /// All-or-nothing: if the batch fails the transaction is rolled back;
    /// if the commit fails the document is unchanged.
    pub async fn execute(&self) -> Result<BatchReport> {
        let mut tx = self.document.begin_tx(TxMode::ReadWrite, &self.config.transaction_name).await?;
        match self.run(&mut tx).await {
            Ok(report) => {
                self.document.commit_tx(tx).await?;
                Ok(report)
            }
            Err(e) => {
                self.document.rollback_tx(tx).await?;
                Err(e)
            }
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }
}

/// In-memory linker for testing and embedding.
impl Linker<MemoryDocument, ReferenceKernel> {
    pub fn in_memory(config: LinkConfig) -> Result<Self> {
        Self::new(MemoryDocument::new(), ReferenceKernel::new(), config)
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Degenerate frame: {0}")]
    DegenerateFrame(String),

    #[error("Host link not supported for element {0}")]
    HostLinkUnsupported(ElementId),

    #[error("Parameter '{name}' on element {element} is read-only")]
    ReadOnlyParameter { element: ElementId, name: String },

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transaction error: {0}")]
    TxError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
