//! Ray bouncing inside the unit disk
//!
//! Coordinates are disk units: the outline is the unit circle around the
//! origin of the plane, and every user shape is expected to start inside it.

pub mod edit;
pub mod obstacle;
pub mod pattern;
pub mod ray;
pub mod sdf;
pub mod tracer;

pub use edit::{Handle, HandleTarget, Tool};
pub use obstacle::{Arc, Capture, Curve, HandleKind, Line, Obstacle};
pub use pattern::{ObserverId, Pattern};
pub use ray::{Ray, RaySnapshot};
pub use tracer::{Touch, Trace};
