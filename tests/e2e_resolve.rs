//! End-to-end tests for host resolution.
//!
//! Each test exercises: cache -> probe -> resolve against MemoryDocument
//! and ReferenceKernel, through `Linker::preview()` (read-only) or
//! `Linker::execute()`.

use pretty_assertions::assert_eq;

use hostlink::{
    Curve, EntityOutcome, HostAssignment, LinkConfig, Linker, MemoryDocument,
    ReferenceKernel, Solid, Xyz,
};

type MemLinker = Linker<MemoryDocument, ReferenceKernel>;

// ============================================================================
// Helpers
// ============================================================================

fn linker(radius: f64) -> MemLinker {
    Linker::in_memory(LinkConfig::default().with_probe_radius(radius)).unwrap()
}

/// A straight bar whose chord midpoint is `mid`.
fn bar_at(mid: Xyz) -> Vec<Curve> {
    vec![Curve::line(mid - Xyz::X, mid + Xyz::X)]
}

// ============================================================================
// 1. Probe inside a host resolves to it
// ============================================================================

#[tokio::test]
async fn test_probe_inside_host_resolves() {
    let linker = linker(3.0);
    let doc = linker.document();
    // 5 × 5 × 4 = 100 units³, centered at the origin.
    let wall = doc.add_host(vec![Solid::cuboid(Xyz::new(-2.5, -2.5, -2.0), Xyz::new(2.5, 2.5, 2.0))]);
    let bar = doc.add_linear(bar_at(Xyz::ZERO));

    let report = linker.preview().await.unwrap();
    assert_eq!(report.hosts.cached, 1);
    assert_eq!(report.assignments(), vec![(bar, HostAssignment::Resolved(wall))]);
    assert_eq!(report.entity(bar).unwrap().outcome, EntityOutcome::Resolved);
}

#[tokio::test]
async fn test_probe_fully_enclosed_resolves() {
    let linker = linker(3.0);
    let doc = linker.document();
    let wall = doc.add_host(vec![Solid::cube(Xyz::ZERO, 10.0)]);
    let bar = doc.add_linear(bar_at(Xyz::new(0.5, -0.5, 1.0)));

    let report = linker.preview().await.unwrap();
    assert_eq!(report.assignments(), vec![(bar, HostAssignment::Resolved(wall))]);
}

// ============================================================================
// 2. Disjoint probe stays unresolved and nothing is written
// ============================================================================

#[tokio::test]
async fn test_disjoint_probe_is_unresolved() {
    let linker = linker(1.0);
    let doc = linker.document();
    doc.add_host(vec![Solid::cube(Xyz::ZERO, 2.0)]);
    doc.add_host(vec![Solid::cube(Xyz::new(20.0, 0.0, 0.0), 2.0)]);
    let bar = doc.add_linear(bar_at(Xyz::new(10.0, 0.0, 0.0)));

    let report = linker.execute().await.unwrap();
    assert_eq!(report.unresolved, 1);
    assert_eq!(report.mutations(), 0);
    assert_eq!(report.entity(bar).unwrap().outcome, EntityOutcome::Unresolved);
    assert_eq!(doc.linear(bar).unwrap().host, None);
}

// ============================================================================
// 3. First host in scan order wins
// ============================================================================

#[tokio::test]
async fn test_first_host_in_scan_order_wins() {
    let linker = linker(1.0);
    let doc = linker.document();
    // The first host clips only a sliver of the probe; the second swallows it.
    let sliver = doc.add_host(vec![Solid::cuboid(Xyz::new(0.95, -5.0, -5.0), Xyz::new(5.0, 5.0, 5.0))]);
    let _big = doc.add_host(vec![Solid::cube(Xyz::ZERO, 50.0)]);
    let bar = doc.add_linear(bar_at(Xyz::ZERO));

    let report = linker.preview().await.unwrap();
    assert_eq!(report.assignments(), vec![(bar, HostAssignment::Resolved(sliver))]);
}

#[tokio::test]
async fn test_identical_hosts_first_wins() {
    let linker = linker(1.0);
    let doc = linker.document();
    let first = doc.add_host(vec![Solid::cube(Xyz::ZERO, 4.0)]);
    let second = doc.add_host(vec![Solid::cube(Xyz::ZERO, 4.0)]);
    assert!(first < second);
    let bar = doc.add_linear(bar_at(Xyz::ZERO));

    let report = linker.preview().await.unwrap();
    assert_eq!(report.entity(bar).unwrap().assignment, HostAssignment::Resolved(first));
}

// ============================================================================
// 4. Degenerate and broken hosts are excluded, never fatal
// ============================================================================

#[tokio::test]
async fn test_broken_host_is_excluded() {
    let linker = linker(1.0);
    let doc = linker.document();
    doc.add_broken_host("geometry extraction threw");
    let bar = doc.add_linear(bar_at(Xyz::ZERO));

    let report = linker.execute().await.unwrap();
    assert_eq!(report.hosts.extraction_failed, 1);
    assert_eq!(report.hosts.cached, 0);
    assert_eq!(report.entity(bar).unwrap().assignment, HostAssignment::Unresolved);
    assert_eq!(doc.linear(bar).unwrap().host, None);
}

#[tokio::test]
async fn test_zero_volume_host_is_excluded() {
    let linker = linker(1.0);
    let doc = linker.document();
    doc.add_host(vec![Solid::cuboid(Xyz::new(-5.0, -5.0, 0.0), Xyz::new(5.0, 5.0, 0.0))]);
    doc.add_host(Vec::new());
    let real = doc.add_host(vec![Solid::cube(Xyz::ZERO, 4.0)]);
    let bar = doc.add_linear(bar_at(Xyz::ZERO));

    let report = linker.preview().await.unwrap();
    assert_eq!(report.hosts.scanned, 3);
    assert_eq!(report.hosts.degenerate, 2);
    assert_eq!(report.entity(bar).unwrap().assignment, HostAssignment::Resolved(real));
}

// ============================================================================
// 5. Entities without a usable probe
// ============================================================================

#[tokio::test]
async fn test_missing_centerline_is_skipped() {
    let linker = linker(1.0);
    let doc = linker.document();
    doc.add_host(vec![Solid::cube(Xyz::ZERO, 4.0)]);
    let bare = doc.add_linear(Vec::new());

    let report = linker.execute().await.unwrap();
    assert_eq!(report.missing_centerline, 1);
    assert_eq!(report.resolve.exact_tests, 0);
    let line = report.entity(bare).unwrap();
    assert_eq!(line.assignment, HostAssignment::Unresolved);
    assert_eq!(line.outcome, EntityOutcome::MissingCenterline);
}

#[tokio::test]
async fn test_probe_outside_model_extent_fails_softly() {
    let linker = Linker::new(
        MemoryDocument::new(),
        ReferenceKernel::with_extent(1_000.0),
        LinkConfig::default().with_probe_radius(1.0),
    )
    .unwrap();
    let doc = linker.document();
    doc.add_host(vec![Solid::cube(Xyz::new(5_000.0, 0.0, 0.0), 10.0)]);
    let far = doc.add_linear(bar_at(Xyz::new(5_000.0, 0.0, 0.0)));
    let near = doc.add_linear(bar_at(Xyz::ZERO));

    let report = linker.execute().await.unwrap();
    assert_eq!(report.probe_failures, 1);
    assert_eq!(report.entity(far).unwrap().outcome, EntityOutcome::ProbeFailed);
    assert_eq!(report.entity(near).unwrap().outcome, EntityOutcome::Unresolved);
}

#[tokio::test]
async fn test_only_first_curve_is_probed() {
    let linker = linker(0.5);
    let doc = linker.document();
    let wall = doc.add_host(vec![Solid::cube(Xyz::ZERO, 2.0)]);
    // First leg sits in the wall; the long second leg runs far outside it.
    let bent = doc.add_linear(vec![
        Curve::line(Xyz::new(-0.5, 0.0, 0.0), Xyz::new(0.5, 0.0, 0.0)),
        Curve::line(Xyz::new(0.5, 0.0, 0.0), Xyz::new(0.5, 100.0, 0.0)),
    ]);
    // Only the second leg's midpoint would be inside.
    let reversed = doc.add_linear(vec![
        Curve::line(Xyz::new(0.5, 100.0, 0.0), Xyz::new(0.5, 200.0, 0.0)),
        Curve::line(Xyz::new(-0.5, 0.0, 0.0), Xyz::new(0.5, 0.0, 0.0)),
    ]);

    let report = linker.preview().await.unwrap();
    assert_eq!(report.entity(bent).unwrap().assignment, HostAssignment::Resolved(wall));
    assert_eq!(report.entity(reversed).unwrap().assignment, HostAssignment::Unresolved);
}

// ============================================================================
// 6. Kernel failures on one pair do not stop the scan
// ============================================================================

#[tokio::test]
async fn test_boolean_failure_falls_through_to_next_host() {
    let linker = linker(1.0);
    let doc = linker.document();
    // The reference kernel cannot intersect two balls.
    doc.add_host(vec![Solid::ball(Xyz::ZERO, 3.0)]);
    let wall = doc.add_host(vec![Solid::cube(Xyz::ZERO, 4.0)]);
    let bar = doc.add_linear(bar_at(Xyz::ZERO));

    let report = linker.execute().await.unwrap();
    assert_eq!(report.resolve.failures, 1);
    assert_eq!(report.entity(bar).unwrap().assignment, HostAssignment::Resolved(wall));
}

// ============================================================================
// 7. Determinism
// ============================================================================

#[tokio::test]
async fn test_repeated_runs_agree() {
    let linker = linker(0.5);
    let doc = linker.document();
    for i in 0..4 {
        doc.add_host(vec![Solid::cube(Xyz::new(i as f64 * 3.0, 0.0, 0.0), 3.5)]);
    }
    for i in 0..20 {
        doc.add_linear(bar_at(Xyz::new(i as f64 * 0.7 - 2.0, 0.0, 0.0)));
    }

    let first = linker.preview().await.unwrap();
    let second = linker.preview().await.unwrap();
    assert_eq!(first.assignments(), second.assignments());
    assert!(first.resolved > 0 && first.unresolved > 0);
}

#[tokio::test]
async fn test_prefilter_does_not_change_assignments() {
    let with = Linker::in_memory(LinkConfig::default().with_probe_radius(0.75)).unwrap();
    let doc = with.document().clone();
    for i in 0..6 {
        doc.add_host(vec![Solid::cube(Xyz::new(i as f64 * 2.0, (i % 2) as f64, 0.0), 2.5)]);
    }
    for i in 0..30 {
        doc.add_linear(bar_at(Xyz::new(i as f64 * 0.5 - 3.0, 0.25, 0.0)));
    }
    let without = Linker::new(
        doc,
        ReferenceKernel::new(),
        LinkConfig::default().with_probe_radius(0.75).with_bbox_prefilter(false),
    )
    .unwrap();

    let a = with.preview().await.unwrap();
    let b = without.preview().await.unwrap();
    assert_eq!(a.assignments(), b.assignments());
    assert!(a.resolve.prefiltered > 0);
    assert_eq!(b.resolve.prefiltered, 0);
}

#[tokio::test]
async fn test_empty_document() {
    let linker = linker(1.0);
    let report = linker.execute().await.unwrap();
    assert_eq!(report.entities_scanned, 0);
    assert_eq!(report.hosts.scanned, 0);
    assert!(report.entities.is_empty());
}
