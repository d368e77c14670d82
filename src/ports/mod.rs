//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the pipeline and the artifacts produced by the training job.

mod model;
mod scaler;

pub use model::Model;
pub use scaler::Scaler;
