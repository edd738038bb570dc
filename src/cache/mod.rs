//! Geometry cache — one pass over the hosts, then read-only for the batch.
//!
//! Hosts are kept in document scan order; that order is the resolver's
//! tie-break. A host is cached only if at least one of its solids encloses
//! positive volume.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::document::HostDocument;
use crate::kernel::SolidKernel;
use crate::model::{Aabb, ElementId};
use crate::Result;

/// One solid of a cached host.
#[derive(Debug, Clone)]
pub struct CachedSolid<S> {
    pub solid: S,
    pub volume: f64,
    pub bounds: Option<Aabb>,
}

/// A host eligible for matching.
#[derive(Debug, Clone)]
pub struct CachedHost<S> {
    pub id: ElementId,
    pub solids: SmallVec<[CachedSolid<S>; 1]>,
    /// Derived attribute to propagate, when the host has one.
    pub derived: Option<ElementId>,
}

/// Counters from building the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub scanned: u64,
    pub cached: u64,
    /// No solid with positive volume.
    pub degenerate: u64,
    /// Geometry extraction returned an error.
    pub extraction_failed: u64,
    pub duplicates: u64,
}

/// What `GeometryCache::insert` did with a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheInsert {
    Cached,
    Degenerate,
    Duplicate,
}

/// Scan-ordered host geometry, keyed by host id.
#[derive(Debug, Clone)]
pub struct GeometryCache<S> {
    hosts: Vec<CachedHost<S>>,
    index: HashMap<ElementId, usize>,
    stats: CacheStats,
}

impl<S> Default for GeometryCache<S> {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            index: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<S> GeometryCache<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every host of `doc` in document order.
    ///
    /// Per-host failures are contained: a host whose geometry cannot be
    /// extracted, or whose solids are all degenerate, is left out. Only a
    /// failure to enumerate the hosts is returned as an error.
    pub async fn build<D, K>(
        doc: &D,
        kernel: &K,
        tx: &D::Tx,
        host_attribute: Option<&str>,
    ) -> Result<Self>
    where
        D: HostDocument<Solid = S>,
        K: SolidKernel<Solid = S>,
    {
        let mut cache = Self::new();
        for id in doc.host_ids(tx).await? {
            let solids = match doc.host_solids(tx, id).await {
                Ok(solids) => solids,
                Err(e) => {
                    debug!(host = %id, error = %e, "host geometry extraction failed; excluded");
                    cache.stats.scanned += 1;
                    cache.stats.extraction_failed += 1;
                    continue;
                }
            };

            let derived = match host_attribute {
                Some(name) => match doc.host_parameter(tx, id, name).await {
                    Ok(param) => param.and_then(|p| p.element_id()),
                    Err(e) => {
                        debug!(host = %id, attribute = name, error = %e, "host attribute lookup failed");
                        None
                    }
                },
                None => None,
            };

            if cache.insert(kernel, id, solids, derived) == CacheInsert::Degenerate {
                debug!(host = %id, "host has no positive-volume solid; excluded");
            }
        }
        Ok(cache)
    }

    /// Add one host at the end of the scan order.
    ///
    /// Solids with non-positive (or non-finite) volume are dropped; if none
    /// remain the host is not cached. A repeated id keeps the first entry.
    pub fn insert<K>(
        &mut self,
        kernel: &K,
        id: ElementId,
        solids: impl IntoIterator<Item = S>,
        derived: Option<ElementId>,
    ) -> CacheInsert
    where
        K: SolidKernel<Solid = S>,
    {
        self.stats.scanned += 1;
        if self.index.contains_key(&id) {
            self.stats.duplicates += 1;
            return CacheInsert::Duplicate;
        }

        let solids: SmallVec<[CachedSolid<S>; 1]> = solids
            .into_iter()
            .filter_map(|solid| {
                let volume = kernel.volume(&solid);
                (volume.is_finite() && volume > 0.0).then(|| CachedSolid {
                    bounds: kernel.bounds(&solid),
                    solid,
                    volume,
                })
            })
            .collect();

        if solids.is_empty() {
            self.stats.degenerate += 1;
            return CacheInsert::Degenerate;
        }

        self.index.insert(id, self.hosts.len());
        self.hosts.push(CachedHost { id, solids, derived });
        self.stats.cached += 1;
        CacheInsert::Cached
    }

    pub fn get(&self, id: ElementId) -> Option<&CachedHost<S>> {
        self.index.get(&id).map(|&i| &self.hosts[i])
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index.contains_key(&id)
    }

    /// Derived attribute of a cached host.
    pub fn derived(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|h| h.derived)
    }

    /// Hosts in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &CachedHost<S>> {
        self.hosts.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.hosts.iter().map(|h| h.id)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{ReferenceKernel, Solid};
    use crate::model::Xyz;

    #[test]
    fn flat_host_is_degenerate() {
        let kernel = ReferenceKernel::new();
        let mut cache = GeometryCache::new();
        let flat = Solid::cuboid(Xyz::ZERO, Xyz::new(1.0, 1.0, 0.0));
        assert_eq!(cache.insert(&kernel, ElementId(1), [flat], None), CacheInsert::Degenerate);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().degenerate, 1);
    }

    #[test]
    fn degenerate_solids_are_dropped_but_host_kept() {
        let kernel = ReferenceKernel::new();
        let mut cache = GeometryCache::new();
        let solids = vec![
            Solid::ball(Xyz::ZERO, 0.0),
            Solid::cube(Xyz::ZERO, 2.0),
        ];
        assert_eq!(cache.insert(&kernel, ElementId(7), solids, Some(ElementId(30))), CacheInsert::Cached);
        let host = cache.get(ElementId(7)).unwrap();
        assert_eq!(host.solids.len(), 1);
        assert!((host.solids[0].volume - 8.0).abs() < 1e-12);
        assert_eq!(cache.derived(ElementId(7)), Some(ElementId(30)));
    }

    #[test]
    fn duplicate_keeps_first_and_order() {
        let kernel = ReferenceKernel::new();
        let mut cache = GeometryCache::new();
        cache.insert(&kernel, ElementId(2), [Solid::cube(Xyz::ZERO, 1.0)], None);
        cache.insert(&kernel, ElementId(1), [Solid::cube(Xyz::ONE, 1.0)], None);
        assert_eq!(
            cache.insert(&kernel, ElementId(2), [Solid::cube(Xyz::ONE, 5.0)], None),
            CacheInsert::Duplicate
        );
        assert_eq!(cache.ids().collect::<Vec<_>>(), vec![ElementId(2), ElementId(1)]);
        assert!((cache.get(ElementId(2)).unwrap().solids[0].volume - 1.0).abs() < 1e-12);
        assert_eq!(cache.stats().duplicates, 1);
    }
}
