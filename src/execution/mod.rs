//! Batch execution.
//!
//! Runs the pipeline against a document inside a caller-owned transaction:
//!
//! ```text
//! hosts ──► GeometryCache (once) ─┐
//!                                 ▼
//! linear ──► ProbeBuilder ──► Resolver ──► Propagator ──► staged writes
//! ```
//!
//! Per-element and per-host failures are contained and only show up in
//! the `BatchReport`. An `Err` from here means a document call failed outright;
//! the caller should roll back.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheStats, GeometryCache};
use crate::config::LinkConfig;
use crate::document::HostDocument;
use crate::kernel::SolidKernel;
use crate::model::{ElementId, HostAssignment};
use crate::probe::ProbeBuilder;
use crate::propagate::{Propagation, Propagator, SkipReason};
use crate::resolve::{ResolveStats, Resolver};
use crate::Result;

/// Terminal state of one linear element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityOutcome {
    /// No centerline curves; no probe built.
    MissingCenterline,
    /// The probe could not be constructed.
    ProbeFailed,
    /// No host matched.
    Unresolved,
    Linked,
    AttributeSet,
    Unchanged,
    Skipped(SkipReason),
    LinkRejected,
    /// Resolved in a read-only pass; nothing written.
    Resolved,
}

/// Per-element line of a batch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReport {
    pub id: ElementId,
    pub assignment: HostAssignment,
    pub outcome: EntityOutcome,
}

/// Batch statistics, in scan order for `entities`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub hosts: CacheStats,
    pub resolve: ResolveStats,
    pub entities_scanned: u64,
    pub missing_centerline: u64,
    pub probe_failures: u64,
    pub resolved: u64,
    pub unresolved: u64,
    pub links_set: u64,
    pub attributes_set: u64,
    pub unchanged: u64,
    pub skipped: u64,
    pub link_rejected: u64,
    pub execution_time_ms: u64,
    pub entities: Vec<EntityReport>,
}

impl BatchReport {
    /// Assignments in scan order.
    pub fn assignments(&self) -> Vec<(ElementId, HostAssignment)> {
        self.entities.iter().map(|e| (e.id, e.assignment)).collect()
    }

    /// Number of writes staged on the transaction.
    pub fn mutations(&self) -> u64 {
        self.links_set + self.attributes_set
    }

    pub fn entity(&self, id: ElementId) -> Option<&EntityReport> {
        self.entities.iter().find(|e| e.id == id)
    }

    fn record(&mut self, id: ElementId, assignment: HostAssignment, outcome: EntityOutcome) {
        match assignment {
            HostAssignment::Resolved(_) => self.resolved += 1,
            HostAssignment::Unresolved => self.unresolved += 1,
        }
        match outcome {
            EntityOutcome::MissingCenterline => self.missing_centerline += 1,
            EntityOutcome::ProbeFailed => self.probe_failures += 1,
            EntityOutcome::Linked => self.links_set += 1,
            EntityOutcome::AttributeSet => self.attributes_set += 1,
            EntityOutcome::Unchanged => self.unchanged += 1,
            EntityOutcome::Skipped(_) => self.skipped += 1,
            EntityOutcome::LinkRejected => self.link_rejected += 1,
            EntityOutcome::Unresolved | EntityOutcome::Resolved => {}
        }
        self.entities.push(EntityReport { id, assignment, outcome });
    }
}

/// Resolve every linear element and propagate the results into `tx`.
///
/// The transaction is neither committed nor rolled back here.
pub async fn run_batch<D, K>(
    doc: &D,
    kernel: &K,
    config: &LinkConfig,
    tx: &mut D::Tx,
) -> Result<BatchReport>
where
    D: HostDocument,
    K: SolidKernel<Solid = D::Solid>,
{
    let started = Instant::now();
    config.validate()?;

    let cache = GeometryCache::build(doc, kernel, tx, config.host_attribute.as_deref()).await?;
    let builder = ProbeBuilder::new(kernel, config.probe_radius)?;
    let resolver = Resolver::new(kernel, &cache).with_prefilter(config.bbox_prefilter);
    let propagator = Propagator::new(&config.mode);

    let mut report = BatchReport { hosts: cache.stats(), ..Default::default() };
    for id in doc.linear_ids(tx).await? {
        report.entities_scanned += 1;
        let curves = doc.centerline_curves(tx, id).await?;
        let probe = match builder.build_for(&curves) {
            Ok(Some(probe)) => probe,
            Ok(None) => {
                report.record(id, HostAssignment::Unresolved, EntityOutcome::MissingCenterline);
                continue;
            }
            Err(e) => {
                debug!(element = %id, error = %e, "probe construction failed");
                report.record(id, HostAssignment::Unresolved, EntityOutcome::ProbeFailed);
                continue;
            }
        };

        let assignment = resolver.resolve(&probe, &mut report.resolve);
        let outcome = match propagator.apply(doc, tx, &cache, id, assignment).await? {
            Propagation::NoHost => EntityOutcome::Unresolved,
            Propagation::Linked => EntityOutcome::Linked,
            Propagation::AttributeSet => EntityOutcome::AttributeSet,
            Propagation::Unchanged => EntityOutcome::Unchanged,
            Propagation::Skipped(reason) => EntityOutcome::Skipped(reason),
            Propagation::LinkRejected => EntityOutcome::LinkRejected,
        };
        report.record(id, assignment, outcome);
    }

    report.execution_time_ms = started.elapsed().as_millis() as u64;
    info!(
        hosts_cached = report.hosts.cached,
        hosts_excluded = report.hosts.degenerate + report.hosts.extraction_failed,
        entities = report.entities_scanned,
        resolved = report.resolved,
        unresolved = report.unresolved,
        mutations = report.mutations(),
        link_rejected = report.link_rejected,
        elapsed_ms = report.execution_time_ms,
        "host linking batch finished"
    );
    Ok(report)
}

/// Resolve every linear element without writing anything.
///
/// Accepts a read-only transaction. Outcomes are `Resolved`, `Unresolved`,
/// `MissingCenterline` or `ProbeFailed`.
pub async fn resolve_batch<D, K>(
    doc: &D,
    kernel: &K,
    config: &LinkConfig,
    tx: &D::Tx,
) -> Result<BatchReport>
where
    D: HostDocument,
    K: SolidKernel<Solid = D::Solid>,
{
    let started = Instant::now();
    config.validate()?;

    let cache = GeometryCache::build(doc, kernel, tx, config.host_attribute.as_deref()).await?;
    let builder = ProbeBuilder::new(kernel, config.probe_radius)?;
    let resolver = Resolver::new(kernel, &cache).with_prefilter(config.bbox_prefilter);

    let mut report = BatchReport { hosts: cache.stats(), ..Default::default() };
    for id in doc.linear_ids(tx).await? {
        report.entities_scanned += 1;
        let curves = doc.centerline_curves(tx, id).await?;
        let (assignment, outcome) = match builder.build_for(&curves) {
            Ok(Some(probe)) => match resolver.resolve(&probe, &mut report.resolve) {
                HostAssignment::Unresolved => (HostAssignment::Unresolved, EntityOutcome::Unresolved),
                resolved => (resolved, EntityOutcome::Resolved),
            },
            Ok(None) => (HostAssignment::Unresolved, EntityOutcome::MissingCenterline),
            Err(e) => {
                debug!(element = %id, error = %e, "probe construction failed");
                (HostAssignment::Unresolved, EntityOutcome::ProbeFailed)
            }
        };
        report.record(id, assignment, outcome);
    }

    report.execution_time_ms = started.elapsed().as_millis() as u64;
    Ok(report)
}
