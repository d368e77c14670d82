//! Pre-fit scalers exported from the training job.

use serde::{Deserialize, Serialize};

use super::ArtifactError;
use crate::domain::{FeatureVector, PipelineError, ScaledFeatureVector};
use crate::ports::Scaler;

/// Scaler parameters as exported to JSON, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    /// `x' = (x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },

    /// `x' = x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl ScalerArtifact {
    /// Check parameter shapes and values.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the parameter arrays are empty,
    /// differ in length, or contain non-finite values.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let (offsets, scale) = self.params();
        if offsets.is_empty() {
            return Err(ArtifactError::Invalid("scaler has no features".into()));
        }
        if offsets.len() != scale.len() {
            return Err(ArtifactError::Invalid(format!(
                "scaler parameter lengths differ ({} vs {})",
                offsets.len(),
                scale.len()
            )));
        }
        if offsets.iter().chain(scale).any(|v| !v.is_finite()) {
            return Err(ArtifactError::Invalid(
                "scaler parameters must be finite".into(),
            ));
        }
        Ok(())
    }

    fn params(&self) -> (&[f64], &[f64]) {
        match self {
            Self::Standard { mean, scale } => (mean.as_slice(), scale.as_slice()),
            Self::MinMax { min, scale } => (min.as_slice(), scale.as_slice()),
        }
    }
}

impl Scaler for ScalerArtifact {
    fn n_features(&self) -> usize {
        self.params().0.len()
    }

    fn transform(&self, features: &FeatureVector) -> Result<ScaledFeatureVector, PipelineError> {
        if features.len() != self.n_features() {
            return Err(PipelineError::Scaling {
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        let x = features.as_slice();
        let out = match self {
            Self::Standard { mean, scale } => x
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(&v, (&m, &s))| {
                    // Constant columns were fitted with a zero scale.
                    let s = if s == 0.0 { 1.0 } else { s };
                    (v - m) / s
                })
                .collect(),
            Self::MinMax { min, scale } => x
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(&v, (&lo, &s))| v * s + lo)
                .collect(),
        };
        Ok(ScaledFeatureVector::new(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_transform() {
        let scaler = ScalerArtifact::Standard {
            mean: vec![10.0, 0.0, 5.0],
            scale: vec![2.0, 1.0, 0.0],
        };
        let out = scaler
            .transform(&FeatureVector::new(vec![14.0, -3.0, 7.0]))
            .expect("Should scale");
        assert_eq!(out.as_slice(), &[2.0, -3.0, 2.0]);
    }

    #[test]
    fn test_min_max_transform() {
        let scaler = ScalerArtifact::MinMax {
            min: vec![-1.0, 0.0],
            scale: vec![0.5, 0.1],
        };
        let out = scaler
            .transform(&FeatureVector::new(vec![4.0, 10.0]))
            .expect("Should scale");
        assert!((out.as_slice()[0] - 1.0).abs() < 1e-12);
        assert!((out.as_slice()[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_rejects_wrong_length() {
        let scaler = ScalerArtifact::Standard {
            mean: vec![0.0; 10],
            scale: vec![1.0; 10],
        };
        let err = scaler
            .transform(&FeatureVector::new(vec![0.0; 4]))
            .expect_err("wrong length");
        assert_eq!(
            err,
            PipelineError::Scaling {
                expected: 10,
                actual: 4
            }
        );
    }

    #[test]
    fn test_parse_and_validate() {
        let scaler: ScalerArtifact =
            serde_json::from_str(r#"{"kind": "standard", "mean": [1.0, 2.0], "scale": [1.0]}"#)
                .expect("valid json");
        assert!(scaler.validate().is_err());

        let scaler: ScalerArtifact =
            serde_json::from_str(r#"{"kind": "min_max", "min": [0.0], "scale": [2.0]}"#)
                .expect("valid json");
        assert!(scaler.validate().is_ok());
        assert_eq!(scaler.n_features(), 1);

        assert!(serde_json::from_str::<ScalerArtifact>(r#"{"kind": "robust"}"#).is_err());
    }
}
