//! Scaler port: Trait for the pre-fit feature scaler.
//!
//! The scaler is an opaque artifact fitted elsewhere; the pipeline only knows
//! how many features it expects and how to apply it.

use crate::domain::{FeatureVector, PipelineError, ScaledFeatureVector};

/// A stateless, pre-fit feature transform.
pub trait Scaler: Send + Sync {
    /// Number of features the scaler was fitted on.
    fn n_features(&self) -> usize;

    /// Apply the transform to one feature vector.
    ///
    /// Implementations must return a vector of the same length and order.
    ///
    /// # Errors
    /// Returns `PipelineError::Scaling` if `features` has the wrong length.
    fn transform(&self, features: &FeatureVector) -> Result<ScaledFeatureVector, PipelineError>;
}
