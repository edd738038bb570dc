//! # Solid Kernel Trait
//!
//! The contract between the linker and whatever B-rep engine the host
//! platform ships. The linker never inspects a solid; it only asks the
//! kernel for volumes, booleans and revolutions.
//!
//! ## Implementations
//!
//! | Kernel | Module | Description |
//! |--------|--------|-------------|
//! | `ReferenceKernel` | `reference` | Analytic boxes and balls for testing/embedding |

pub mod reference;

use crate::model::{Aabb, CurveLoop, Frame};
use crate::Result;

pub use reference::{ReferenceKernel, Solid};

/// Exact solid operations supplied by the host platform.
///
/// Every method is synchronous and side-effect free.
pub trait SolidKernel: Send + Sync {
    /// The kernel's solid body type.
    type Solid: Clone + std::fmt::Debug + Send + Sync;

    /// Enclosed volume. Zero for degenerate bodies.
    fn volume(&self, solid: &Self::Solid) -> f64;

    /// Boolean intersection. `Ok(None)` when the bodies do not meet.
    ///
    /// `Err` means the kernel could not compute the result (ill-conditioned
    /// or unsupported geometry), not that the bodies are disjoint.
    fn intersect(&self, a: &Self::Solid, b: &Self::Solid) -> Result<Option<Self::Solid>>;

    /// Revolve closed profile loops about `frame`'s origin and Z axis
    /// through `start_angle..end_angle` radians.
    fn revolve(
        &self,
        frame: &Frame,
        profile: &[CurveLoop],
        start_angle: f64,
        end_angle: f64,
    ) -> Result<Self::Solid>;

    /// Whether `frame` is usable for constructing geometry.
    fn can_define_geometry(&self, frame: &Frame) -> bool;

    /// Conservative axis-aligned bounds, if cheaply known.
    ///
    /// Default returns `None`, which disables bound-based prefiltering.
    fn bounds(&self, _solid: &Self::Solid) -> Option<Aabb> {
        None
    }
}
