//! Model port: Trait for the pre-trained classifier.

use crate::domain::{PipelineError, ScaledFeatureVector};

/// A pre-trained classifier consumed read-only.
pub trait Model: Send + Sync {
    /// Number of features the model was trained on.
    fn n_features(&self) -> usize;

    /// Class values the model can emit, in its internal order.
    fn classes(&self) -> &[i64];

    /// Predict the class index for one scaled feature vector.
    ///
    /// The returned value is a position in the outcome category sequence of
    /// the encoding table; it is not range-checked here.
    ///
    /// # Errors
    /// Returns `PipelineError::Artifact` if the model cannot evaluate the
    /// input.
    fn predict(&self, features: &ScaledFeatureVector) -> Result<i64, PipelineError>;
}
