//! Adapters layer: Concrete implementations of ports and outer surfaces.
//!
//! - `artifacts`: JSON-exported model, scaler and encoding table
//! - `http`: axum router for `POST /predict`
//! - `sanitize`: patient-data filtering for logs

pub mod artifacts;
pub mod http;
pub mod sanitize;

pub use artifacts::{ArtifactBundle, ArtifactError};
