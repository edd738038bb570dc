//! Probe builder — a small ball standing in for a linear element.
//!
//! The probe is centered on the chord midpoint of the element's FIRST
//! centerline curve. Later curves are ignored, even for bent bars.
//!
//! ```text
//!              p + rŶ
//!               |\
//!               | )   half-disc in the XY plane,
//!             p |  )  p + rX̂    revolved 2π about Ŷ through p
//!               | )
//!               |/
//!              p − rŶ
//! ```

use std::f64::consts::TAU;

use crate::kernel::SolidKernel;
use crate::model::{Aabb, Curve, CurveLoop, Frame, Xyz};
use crate::{Error, Result};

/// A probe solid for one linear element. Never shared between elements.
#[derive(Debug, Clone)]
pub struct Probe<S> {
    pub center: Xyz,
    pub radius: f64,
    pub solid: S,
    pub bounds: Option<Aabb>,
}

/// Representative point of a centerline: the chord midpoint of the first
/// curve, or `None` when there are no curves.
pub fn representative_point(curves: &[Curve]) -> Option<Xyz> {
    curves.first().map(Curve::chord_midpoint)
}

/// Builds probe balls of a fixed radius.
#[derive(Debug)]
pub struct ProbeBuilder<'k, K> {
    kernel: &'k K,
    radius: f64,
}

impl<'k, K: SolidKernel> ProbeBuilder<'k, K> {
    pub fn new(kernel: &'k K, radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::Config(format!("probe radius must be positive and finite, got {radius}")));
        }
        Ok(Self { kernel, radius })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Revolution frame at `center`: basis `(X̂, −Ẑ, Ŷ)`, so the axis is Ŷ.
    pub fn frame(center: Xyz) -> Frame {
        Frame::new(center, Xyz::X, -Xyz::Z, Xyz::Y)
    }

    /// Closed half-disc profile: the diameter on the axis, then the arc
    /// back through `center + r·X̂`.
    pub fn profile(center: Xyz, radius: f64) -> Result<CurveLoop> {
        let top = center + Xyz::Y * radius;
        let bottom = center - Xyz::Y * radius;
        CurveLoop::new(vec![
            Curve::line(top, bottom),
            Curve::arc(bottom, top, center + Xyz::X * radius),
        ])
    }

    /// Build the probe around `center`.
    ///
    /// Fails with `Error::DegenerateFrame` when the kernel cannot construct
    /// geometry there, or with the kernel's error when the revolve fails.
    pub fn build(&self, center: Xyz) -> Result<Probe<K::Solid>> {
        let frame = Self::frame(center);
        if !self.kernel.can_define_geometry(&frame) {
            return Err(Error::DegenerateFrame(format!("cannot define geometry at {center}")));
        }
        let profile = Self::profile(center, self.radius)?;
        let solid = self.kernel.revolve(&frame, &[profile], 0.0, TAU)?;
        let bounds = self.kernel.bounds(&solid);
        Ok(Probe { center, radius: self.radius, solid, bounds })
    }

    /// Build the probe for a centerline. `Ok(None)` when it has no curves.
    pub fn build_for(&self, curves: &[Curve]) -> Result<Option<Probe<K::Solid>>> {
        representative_point(curves).map(|p| self.build(p)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{ReferenceKernel, Solid};

    #[test]
    fn first_curve_midpoint_only() {
        let curves = [
            Curve::line(Xyz::ZERO, Xyz::new(2.0, 0.0, 0.0)),
            Curve::line(Xyz::new(2.0, 0.0, 0.0), Xyz::new(2.0, 10.0, 0.0)),
        ];
        assert_eq!(representative_point(&curves), Some(Xyz::new(1.0, 0.0, 0.0)));
        assert_eq!(representative_point(&[]), None);
    }

    #[test]
    fn probe_is_ball_of_configured_radius() {
        let kernel = ReferenceKernel::new();
        let builder = ProbeBuilder::new(&kernel, 0.25).unwrap();
        let probe = builder.build(Xyz::new(5.0, 6.0, 7.0)).unwrap();
        match probe.solid {
            Solid::Ball { center, radius } => {
                assert!(center.distance(Xyz::new(5.0, 6.0, 7.0)) < 1e-9);
                assert!((radius - 0.25).abs() < 1e-9);
            }
            other => panic!("expected ball, got {other:?}"),
        }
        assert!(probe.bounds.is_some());
    }

    #[test]
    fn non_finite_center_is_degenerate() {
        let kernel = ReferenceKernel::new();
        let builder = ProbeBuilder::new(&kernel, 1.0).unwrap();
        let err = builder.build(Xyz::new(f64::NAN, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, Error::DegenerateFrame(_)));
    }

    #[test]
    fn empty_centerline_builds_nothing() {
        let kernel = ReferenceKernel::new();
        let builder = ProbeBuilder::new(&kernel, 1.0).unwrap();
        assert!(builder.build_for(&[]).unwrap().is_none());
    }

    #[test]
    fn bad_radius_is_rejected() {
        let kernel = ReferenceKernel::new();
        assert!(ProbeBuilder::new(&kernel, 0.0).is_err());
        assert!(ProbeBuilder::new(&kernel, -1.0).is_err());
        assert!(ProbeBuilder::new(&kernel, f64::INFINITY).is_err());
    }
}
