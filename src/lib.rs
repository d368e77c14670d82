//! # Tensio
//!
//! Hypertension risk prediction from a pre-trained classifier.
//!
//! This crate provides:
//! - A preprocessing pipeline that encodes a ten-attribute patient record,
//!   scales it and decodes the model's class index into a label
//! - An HTTP front end (`POST /predict`)
//! - An interactive terminal form
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (record schema, encoding table, prediction)
//! - `ports`: Trait definitions for the model and scaler artifacts
//! - `adapters`: Concrete implementations (JSON artifacts, axum, log sanitizer)
//! - `application`: The prediction pipeline
//! - `tui`: Terminal form

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ports;
pub mod tui;

pub use application::PredictionService;
pub use domain::{EncodingTable, PipelineError, Prediction, RawRecord};

/// Result type for Tensio operations
pub type Result<T> = std::result::Result<T, TensioError>;

/// Main error type for Tensio
#[derive(Debug, thiserror::Error)]
pub enum TensioError {
    #[error("Prediction failed: {0}")]
    Pipeline(#[from] domain::PipelineError),

    #[error("Artifact loading failed: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
