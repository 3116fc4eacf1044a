//! Layout model
//!
//! Channels, geometry primitives and the assembled layout document. All of
//! it is a pure function of the generator configuration.

pub mod channel;
pub mod document;
pub mod geometry;

pub use channel::{
    phase_fidelity, Channel, MIN_ENERGY_RECOVERY, PHASE_FIDELITY_MAX, PHASE_FIDELITY_MIN,
};
pub use document::LayoutDocument;
pub use geometry::{Bounds, Component, Point, Polygon, Rgb};
