//! Reference solid kernel.
//!
//! Analytic stand-in for a B-rep engine. It is enough to drive the linker
//! end to end without a CAD host.
//!
//! ## Limitations
//!
//! - **Three body kinds**: axis-aligned cuboids, balls, and a ball clipped
//!   to a box (the result of `ball ∩ cuboid`).
//! - **Partial booleans**: `cuboid ∩ cuboid` and `ball ∩ cuboid` only. Any
//!   other pair returns `Error::Geometry`.
//! - **One revolve shape**: a half-disc profile (diameter on the axis, arc
//!   off it) swept a full turn. That is exactly the probe the linker builds.
//! - **Numeric clip volume**: the volume of a clipped ball is integrated over
//!   Z slices; each slice uses the exact circle/rectangle area.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::model::{Aabb, Curve, CurveLoop, Frame, Xyz, VERTEX_TOLERANCE};
use crate::{Error, Result};
use super::SolidKernel;

/// Largest coordinate magnitude the kernel accepts for a frame origin.
pub const DEFAULT_MODEL_EXTENT: f64 = 1.0e5;

/// Simpson sub-intervals used to integrate a clipped ball.
const CLIP_SLICES: usize = 256;

const ANGLE_TOLERANCE: f64 = 1e-9;
const FRAME_TOLERANCE: f64 = 1e-9;

// ============================================================================
// Solid
// ============================================================================

/// A reference solid body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Solid {
    Cuboid(Aabb),
    Ball { center: Xyz, radius: f64 },
    /// The part of a ball inside `bounds`.
    Clipped { center: Xyz, radius: f64, bounds: Aabb },
}

impl Solid {
    pub fn cuboid(a: Xyz, b: Xyz) -> Self {
        Solid::Cuboid(Aabb::new(a, b))
    }

    /// Cube of edge `size` centered on `center`.
    pub fn cube(center: Xyz, size: f64) -> Self {
        Solid::Cuboid(Aabb::from_center(center, Xyz::splat(size / 2.0)))
    }

    pub fn ball(center: Xyz, radius: f64) -> Self {
        Solid::Ball { center, radius }
    }

    fn is_finite(&self) -> bool {
        match self {
            Solid::Cuboid(b) => b.is_finite(),
            Solid::Ball { center, radius } => center.is_finite() && radius.is_finite(),
            Solid::Clipped { center, radius, bounds } => {
                center.is_finite() && radius.is_finite() && bounds.is_finite()
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Solid::Cuboid(_) => "cuboid",
            Solid::Ball { .. } => "ball",
            Solid::Clipped { .. } => "clipped ball",
        }
    }
}

// ============================================================================
// ReferenceKernel
// ============================================================================

/// Analytic reference kernel.
#[derive(Debug, Clone)]
pub struct ReferenceKernel {
    extent: f64,
}

impl ReferenceKernel {
    pub fn new() -> Self {
        Self { extent: DEFAULT_MODEL_EXTENT }
    }

    /// Kernel accepting frame origins up to `extent` on any axis.
    pub fn with_extent(extent: f64) -> Self {
        Self { extent }
    }
}

impl Default for ReferenceKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl SolidKernel for ReferenceKernel {
    type Solid = Solid;

    fn volume(&self, solid: &Solid) -> f64 {
        match solid {
            Solid::Cuboid(b) => b.volume().max(0.0),
            Solid::Ball { radius, .. } if *radius > 0.0 => 4.0 / 3.0 * PI * radius.powi(3),
            Solid::Ball { .. } => 0.0,
            Solid::Clipped { center, radius, bounds } => clipped_ball_volume(*center, *radius, bounds),
        }
    }

    fn intersect(&self, a: &Solid, b: &Solid) -> Result<Option<Solid>> {
        if !a.is_finite() || !b.is_finite() {
            return Err(Error::Geometry("non-finite solid in boolean".into()));
        }
        match (a, b) {
            (Solid::Cuboid(x), Solid::Cuboid(y)) => Ok(x.intersection(y).map(Solid::Cuboid)),
            (Solid::Ball { center, radius }, Solid::Cuboid(bx))
            | (Solid::Cuboid(bx), Solid::Ball { center, radius }) => {
                Ok(clip_ball(*center, *radius, bx))
            }
            _ => Err(Error::Geometry(format!(
                "unsupported boolean: {} ∩ {}",
                a.kind(),
                b.kind()
            ))),
        }
    }

    fn revolve(
        &self,
        frame: &Frame,
        profile: &[CurveLoop],
        start_angle: f64,
        end_angle: f64,
    ) -> Result<Solid> {
        if !self.can_define_geometry(frame) {
            return Err(Error::DegenerateFrame(format!("origin {}", frame.origin)));
        }
        if ((end_angle - start_angle).abs() - TAU).abs() > ANGLE_TOLERANCE {
            return Err(Error::Geometry("only full revolutions are supported".into()));
        }
        let [profile] = profile else {
            return Err(Error::Geometry(format!("expected one profile loop, got {}", profile.len())));
        };

        let axis_distance = |p: Xyz| {
            let v = p - frame.origin;
            (v - frame.basis_z * v.dot(frame.basis_z)).length()
        };

        let mut ball = None;
        for curve in profile.curves() {
            match curve {
                Curve::Line { start, end } => {
                    if axis_distance(*start) > VERTEX_TOLERANCE || axis_distance(*end) > VERTEX_TOLERANCE {
                        return Err(Error::Geometry("profile line is off the revolution axis".into()));
                    }
                }
                Curve::Arc { .. } => {
                    if ball.is_some() {
                        return Err(Error::Geometry("profile has more than one arc".into()));
                    }
                    let (center, radius) = curve
                        .circle()
                        .ok_or_else(|| Error::Geometry("profile arc is collinear".into()))?;
                    if axis_distance(center) > VERTEX_TOLERANCE {
                        return Err(Error::Geometry("profile arc is not centered on the axis".into()));
                    }
                    ball = Some(Solid::Ball { center, radius });
                }
            }
        }
        ball.ok_or_else(|| Error::Geometry("profile has no arc".into()))
    }

    fn can_define_geometry(&self, frame: &Frame) -> bool {
        frame.origin.is_finite()
            && frame.origin.abs().max_element() <= self.extent
            && frame.is_orthonormal(FRAME_TOLERANCE)
            && frame.basis_x.cross(frame.basis_y).dot(frame.basis_z) > 0.0
    }

    fn bounds(&self, solid: &Solid) -> Option<Aabb> {
        match solid {
            Solid::Cuboid(b) => Some(*b),
            Solid::Ball { center, radius } => Some(Aabb::from_center(*center, Xyz::splat(radius.abs()))),
            Solid::Clipped { bounds, .. } => Some(*bounds),
        }
    }
}

// ============================================================================
// Ball ∩ box
// ============================================================================

fn clip_ball(center: Xyz, radius: f64, bx: &Aabb) -> Option<Solid> {
    if radius <= 0.0 || bx.volume() <= 0.0 {
        return None;
    }
    if bx.clamp(center).distance(center) >= radius {
        return None;
    }
    let ball_bounds = Aabb::from_center(center, Xyz::splat(radius));
    let bounds = ball_bounds.intersection(bx)?;
    if bounds == ball_bounds {
        return Some(Solid::Ball { center, radius });
    }
    Some(Solid::Clipped { center, radius, bounds })
}

fn clipped_ball_volume(center: Xyz, radius: f64, bounds: &Aabb) -> f64 {
    let lo = bounds.min.z.max(center.z - radius);
    let hi = bounds.max.z.min(center.z + radius);
    if radius <= 0.0 || lo >= hi {
        return 0.0;
    }
    let x0 = bounds.min.x - center.x;
    let x1 = bounds.max.x - center.x;
    let y0 = bounds.min.y - center.y;
    let y1 = bounds.max.y - center.y;
    let slice = |z: f64| {
        let dz = z - center.z;
        let rho = (radius * radius - dz * dz).max(0.0).sqrt();
        disk_rect_area(rho, x0, x1, y0, y1)
    };

    // Composite Simpson over [lo, hi].
    let h = (hi - lo) / CLIP_SLICES as f64;
    let mut sum = slice(lo) + slice(hi);
    for i in 1..CLIP_SLICES {
        let w = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += w * slice(lo + h * i as f64);
    }
    (sum * h / 3.0).max(0.0)
}

/// Area of the disk of radius `rho` at the origin within `[x0,x1]×[y0,y1]`.
fn disk_rect_area(rho: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    if rho <= 0.0 {
        return 0.0;
    }
    let a = |x: f64, y: f64| signed_quadrant_area(rho, x, y);
    (a(x1, y1) - a(x0, y1) - a(x1, y0) + a(x0, y0)).max(0.0)
}

/// Signed area of the disk within the rectangle spanned by the origin and
/// `(x, y)`. Odd in each argument.
fn signed_quadrant_area(rho: f64, x: f64, y: f64) -> f64 {
    let sign = x.signum() * y.signum();
    let x = x.abs().min(rho);
    let y = y.abs().min(rho);
    if x == 0.0 || y == 0.0 {
        return 0.0;
    }
    if x * x + y * y <= rho * rho {
        return sign * x * y;
    }
    // Antiderivative of sqrt(rho² - t²).
    let s = |t: f64| 0.5 * (t * (rho * rho - t * t).max(0.0).sqrt() + rho * rho * (t / rho).clamp(-1.0, 1.0).asin());
    let xa = (rho * rho - y * y).max(0.0).sqrt();
    sign * (y * xa + s(x) - s(xa))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * b.abs().max(1e-12)
    }

    #[test]
    fn disk_inside_rect_has_full_area() {
        let area = disk_rect_area(1.0, -2.0, 2.0, -2.0, 2.0);
        assert!(close(area, PI, 1e-12));
    }

    #[test]
    fn half_disk_area() {
        let area = disk_rect_area(1.0, 0.0, 2.0, -2.0, 2.0);
        assert!(close(area, PI / 2.0, 1e-12));
    }

    #[test]
    fn clipped_half_ball_volume() {
        let kernel = ReferenceKernel::new();
        let ball = Solid::ball(Xyz::ZERO, 1.0);
        let half_space = Solid::cuboid(Xyz::new(0.0, -5.0, -5.0), Xyz::new(5.0, 5.0, 5.0));
        let clip = kernel.intersect(&ball, &half_space).unwrap().unwrap();
        assert!(matches!(clip, Solid::Clipped { .. }));
        let expected = 2.0 / 3.0 * PI;
        assert!(close(kernel.volume(&clip), expected, 1e-3));
    }

    #[test]
    fn ball_inside_box_stays_ball() {
        let kernel = ReferenceKernel::new();
        let ball = Solid::ball(Xyz::ZERO, 1.0);
        let bx = Solid::cube(Xyz::ZERO, 10.0);
        assert_eq!(kernel.intersect(&bx, &ball).unwrap(), Some(ball));
    }

    #[test]
    fn tangent_ball_does_not_intersect() {
        let kernel = ReferenceKernel::new();
        let ball = Solid::ball(Xyz::new(-1.0, 0.5, 0.5), 1.0);
        let bx = Solid::cuboid(Xyz::ZERO, Xyz::ONE);
        assert_eq!(kernel.intersect(&ball, &bx).unwrap(), None);
    }

    #[test]
    fn ball_ball_is_unsupported() {
        let kernel = ReferenceKernel::new();
        let a = Solid::ball(Xyz::ZERO, 1.0);
        let b = Solid::ball(Xyz::X, 1.0);
        assert!(matches!(kernel.intersect(&a, &b), Err(Error::Geometry(_))));
    }

    #[test]
    fn cuboid_intersection_volume() {
        let kernel = ReferenceKernel::new();
        let a = Solid::cuboid(Xyz::ZERO, Xyz::splat(2.0));
        let b = Solid::cuboid(Xyz::ONE, Xyz::splat(3.0));
        let both = kernel.intersect(&a, &b).unwrap().unwrap();
        assert!(close(kernel.volume(&both), 1.0, 1e-12));
    }

    #[test]
    fn revolve_half_disc_makes_ball() {
        let kernel = ReferenceKernel::new();
        let c = Xyz::new(3.0, -1.0, 2.0);
        let r = 0.5;
        let top = c + Xyz::Y * r;
        let bottom = c - Xyz::Y * r;
        let profile = CurveLoop::new(vec![
            Curve::line(top, bottom),
            Curve::arc(bottom, top, c + Xyz::X * r),
        ])
        .unwrap();
        let frame = Frame::new(c, Xyz::X, -Xyz::Z, Xyz::Y);
        let solid = kernel.revolve(&frame, &[profile], 0.0, TAU).unwrap();
        match solid {
            Solid::Ball { center, radius } => {
                assert!(center.distance(c) < 1e-9);
                assert!(close(radius, r, 1e-9));
            }
            other => panic!("expected ball, got {other:?}"),
        }
    }

    #[test]
    fn frame_beyond_extent_is_rejected() {
        let kernel = ReferenceKernel::with_extent(100.0);
        let frame = Frame::new(Xyz::new(101.0, 0.0, 0.0), Xyz::X, -Xyz::Z, Xyz::Y);
        assert!(!kernel.can_define_geometry(&frame));
        let left_handed = Frame::new(Xyz::ZERO, Xyz::X, Xyz::Z, Xyz::Y);
        assert!(!kernel.can_define_geometry(&left_handed));
    }
}
