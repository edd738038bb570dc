//! Intersection resolver.
//!
//! Scans the cache in insertion order and returns the FIRST host with a
//! solid whose exact intersection with the probe has positive volume.
//! There is no ranking by overlap or distance; earlier hosts win.
//!
//! A kernel error for a probe/host pair counts as "no intersection" and the
//! scan moves on. The optional bounds prefilter only skips pairs whose
//! bounds are disjoint, so it never changes the result.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{CachedSolid, GeometryCache};
use crate::kernel::SolidKernel;
use crate::model::HostAssignment;
use crate::probe::Probe;

/// Counters accumulated across `resolve` calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveStats {
    /// Exact booleans evaluated.
    pub exact_tests: u64,
    /// Pairs skipped because their bounds are disjoint.
    pub prefiltered: u64,
    /// Booleans the kernel failed to compute.
    pub failures: u64,
}

/// First-match resolver over a built cache.
pub struct Resolver<'a, K: SolidKernel> {
    kernel: &'a K,
    cache: &'a GeometryCache<K::Solid>,
    prefilter: bool,
}

impl<'a, K: SolidKernel> Resolver<'a, K> {
    pub fn new(kernel: &'a K, cache: &'a GeometryCache<K::Solid>) -> Self {
        Self { kernel, cache, prefilter: true }
    }

    pub fn with_prefilter(mut self, enabled: bool) -> Self {
        self.prefilter = enabled;
        self
    }

    /// Resolve one probe. Never fails; kernel errors are contained.
    pub fn resolve(&self, probe: &Probe<K::Solid>, stats: &mut ResolveStats) -> HostAssignment {
        for host in self.cache.iter() {
            if host.solids.iter().any(|s| self.hits(probe, s, stats)) {
                return HostAssignment::Resolved(host.id);
            }
        }
        HostAssignment::Unresolved
    }

    fn hits(&self, probe: &Probe<K::Solid>, solid: &CachedSolid<K::Solid>, stats: &mut ResolveStats) -> bool {
        if self.prefilter {
            if let (Some(p), Some(h)) = (&probe.bounds, &solid.bounds) {
                if !p.overlaps(h) {
                    stats.prefiltered += 1;
                    return false;
                }
            }
        }

        stats.exact_tests += 1;
        match self.kernel.intersect(&probe.solid, &solid.solid) {
            Ok(Some(common)) => self.kernel.volume(&common) > 0.0,
            Ok(None) => false,
            Err(e) => {
                stats.failures += 1;
                debug!(center = %probe.center, error = %e, "boolean intersection failed; treated as disjoint");
                false
            }
        }
    }
}
