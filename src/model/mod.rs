//! # Element Model
//!
//! Clean DTOs shared by the document, the kernel and the linking pipeline.
//! These types cross every boundary: document ↔ cache ↔ resolver ↔ caller.
//!
//! Design rule: NO kernel solids here. Solids are an associated type of
//! `SolidKernel` so a real CAD adaptor never converts its B-reps.
//! This module is pure data — no I/O, no state, no async.

pub mod element;
pub mod geometry;
pub mod param;
pub mod assignment;

pub use element::ElementId;
pub use geometry::{Aabb, Curve, CurveLoop, Frame, Xyz, VERTEX_TOLERANCE};
pub use param::{Parameter, ParamValue, StorageType};
pub use assignment::HostAssignment;
