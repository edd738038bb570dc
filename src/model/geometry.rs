//! Geometric primitives: points, curves, loops, frames, bounds.
//!
//! Coordinates are in the document's internal length unit. Nothing here
//! knows about solids; the kernel owns those.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A point or vector in model space.
pub type Xyz = DVec3;

/// Two vertices closer than this are considered coincident.
pub const VERTEX_TOLERANCE: f64 = 1e-6;

// ============================================================================
// Curve
// ============================================================================

/// A bounded curve: a line segment or a circular arc.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Curve {
    Line { start: Xyz, end: Xyz },
    /// Arc from `start` to `end` passing through `through`.
    Arc { start: Xyz, end: Xyz, through: Xyz },
}

impl Curve {
    pub fn line(start: Xyz, end: Xyz) -> Self {
        Curve::Line { start, end }
    }

    pub fn arc(start: Xyz, end: Xyz, through: Xyz) -> Self {
        Curve::Arc { start, end, through }
    }

    pub fn start(&self) -> Xyz {
        match self {
            Curve::Line { start, .. } | Curve::Arc { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Xyz {
        match self {
            Curve::Line { end, .. } | Curve::Arc { end, .. } => *end,
        }
    }

    /// Midpoint of the chord: `(start + end) / 2`.
    ///
    /// For an arc this is NOT a point on the curve. It is the point the
    /// linker probes.
    pub fn chord_midpoint(&self) -> Xyz {
        (self.start() + self.end()) / 2.0
    }

    /// Center and radius of an arc's circle. `None` for lines and for
    /// collinear arc points.
    pub fn circle(&self) -> Option<(Xyz, f64)> {
        let Curve::Arc { start, end, through } = *self else {
            return None;
        };
        let ab = through - start;
        let ac = end - start;
        let n = ab.cross(ac);
        let n2 = n.length_squared();
        if n2 <= f64::EPSILON * ab.length_squared() * ac.length_squared() {
            return None;
        }
        let center = start + (ac.length_squared() * n.cross(ab) + ab.length_squared() * ac.cross(n)) / (2.0 * n2);
        Some((center, (start - center).length()))
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Curve::Line { start, end } => start.is_finite() && end.is_finite(),
            Curve::Arc { start, end, through } => {
                start.is_finite() && end.is_finite() && through.is_finite()
            }
        }
    }
}

// ============================================================================
// CurveLoop
// ============================================================================

/// A closed, ordered chain of curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveLoop {
    curves: Vec<Curve>,
}

impl CurveLoop {
    /// Build a loop. Each curve must end where the next starts, and the last
    /// must end where the first starts.
    pub fn new(curves: Vec<Curve>) -> Result<Self> {
        let Some(first) = curves.first() else {
            return Err(Error::Geometry("curve loop is empty".into()));
        };
        let mut prev_end = first.end();
        for (i, curve) in curves.iter().enumerate().skip(1) {
            if prev_end.distance(curve.start()) > VERTEX_TOLERANCE {
                return Err(Error::Geometry(format!("curve loop is discontinuous at curve {i}")));
            }
            prev_end = curve.end();
        }
        if prev_end.distance(first.start()) > VERTEX_TOLERANCE {
            return Err(Error::Geometry("curve loop is not closed".into()));
        }
        Ok(Self { curves })
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

// ============================================================================
// Frame
// ============================================================================

/// A local coordinate system: origin plus three basis vectors.
///
/// Revolutions sweep about the axis through `origin` along `basis_z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub origin: Xyz,
    pub basis_x: Xyz,
    pub basis_y: Xyz,
    pub basis_z: Xyz,
}

impl Frame {
    pub fn new(origin: Xyz, basis_x: Xyz, basis_y: Xyz, basis_z: Xyz) -> Self {
        Self { origin, basis_x, basis_y, basis_z }
    }

    /// True when all three basis vectors are unit length and pairwise
    /// orthogonal within `tolerance`.
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let unit = |v: Xyz| v.is_finite() && (v.length() - 1.0).abs() <= tolerance;
        unit(self.basis_x)
            && unit(self.basis_y)
            && unit(self.basis_z)
            && self.basis_x.dot(self.basis_y).abs() <= tolerance
            && self.basis_y.dot(self.basis_z).abs() <= tolerance
            && self.basis_z.dot(self.basis_x).abs() <= tolerance
    }
}

// ============================================================================
// Aabb
// ============================================================================

/// Axis-aligned bounding box. `min <= max` componentwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Xyz,
    pub max: Xyz,
}

impl Aabb {
    /// Box spanning two corners in any order.
    pub fn new(a: Xyz, b: Xyz) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    pub fn from_center(center: Xyz, half_extents: Xyz) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn extents(&self) -> Xyz {
        self.max - self.min
    }

    pub fn center(&self) -> Xyz {
        (self.min + self.max) / 2.0
    }

    pub fn volume(&self) -> f64 {
        let e = self.extents();
        e.x * e.y * e.z
    }

    /// Closed-interval overlap test. Touching boxes overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// The overlap region, or `None` if it has no interior.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        min.cmplt(max).all().then_some(Aabb { min, max })
    }

    /// Closest point of the box to `p`.
    pub fn clamp(&self, p: Xyz) -> Xyz {
        p.clamp(self.min, self.max)
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}
