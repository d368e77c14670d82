//! Application layer: Use cases and services.
//!
//! Composes the domain types with the model and scaler ports into the single
//! prediction use case both adapters call.

pub mod pipeline;

pub use pipeline::{decode, encode, scale, PredictionService};
