//! Preprocessing pipeline: record → features → scaled features → label.
//!
//! `predict(record) = decode(model.predict(scale(encode(record))))` is the
//! whole of the business logic shared by the HTTP and form adapters.

use std::sync::Arc;

use crate::domain::{
    Attribute, AttributeValue, EncodingTable, FeatureVector, PipelineError, Prediction, RawRecord,
    ScaledFeatureVector, FEATURE_COUNT,
};
use crate::ports::{Model, Scaler};

/// Encode a record into the fixed-order feature vector.
///
/// Numeric attributes pass through unchanged; categorical attributes become
/// their position in the encoding table.
///
/// # Errors
/// Returns `PipelineError::Validation` for an unknown categorical label or a
/// non-finite numeric value.
pub fn encode(record: &RawRecord, table: &EncodingTable) -> Result<FeatureVector, PipelineError> {
    let mut values = Vec::with_capacity(FEATURE_COUNT);
    for attribute in Attribute::ALL {
        let value = match record.value(attribute) {
            AttributeValue::Numeric(x) if x.is_finite() => x,
            AttributeValue::Numeric(x) => {
                return Err(PipelineError::Validation(format!(
                    "{attribute}: {x} is not a finite number"
                )));
            }
            AttributeValue::Categorical(label) => table.code_of(attribute, label)? as f64,
        };
        values.push(value);
    }
    Ok(FeatureVector::new(values))
}

/// Apply the pre-fit scaler.
///
/// # Errors
/// Returns `PipelineError::Scaling` if the vector length differs from what
/// the scaler was fitted on, and `PipelineError::Artifact` if the scaler
/// returns a vector of a different length.
pub fn scale<S>(features: &FeatureVector, scaler: &S) -> Result<ScaledFeatureVector, PipelineError>
where
    S: Scaler + ?Sized,
{
    if features.len() != scaler.n_features() {
        return Err(PipelineError::Scaling {
            expected: scaler.n_features(),
            actual: features.len(),
        });
    }

    let scaled = scaler.transform(features)?;
    if scaled.len() != features.len() {
        return Err(PipelineError::Artifact(format!(
            "Scaler returned {} values for {} features",
            scaled.len(),
            features.len()
        )));
    }
    Ok(scaled)
}

/// Decode a model class index into its outcome label.
///
/// # Errors
/// Returns `PipelineError::Decoding` if the index is out of range.
pub fn decode(index: i64, table: &EncodingTable) -> Result<String, PipelineError> {
    table.outcome_label(index).map(str::to_owned)
}

/// Runs the composed pipeline against shared, immutable artifacts.
///
/// Cloning the service is cheap; every clone shares the same handles.
pub struct PredictionService<M, S>
where
    M: Model,
    S: Scaler,
{
    model: Arc<M>,
    scaler: Arc<S>,
    table: Arc<EncodingTable>,
}

impl<M, S> Clone for PredictionService<M, S>
where
    M: Model,
    S: Scaler,
{
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            scaler: Arc::clone(&self.scaler),
            table: Arc::clone(&self.table),
        }
    }
}

impl<M, S> PredictionService<M, S>
where
    M: Model,
    S: Scaler,
{
    /// Create a new prediction service over already loaded artifacts.
    pub fn new(model: Arc<M>, scaler: Arc<S>, table: Arc<EncodingTable>) -> Self {
        Self {
            model,
            scaler,
            table,
        }
    }

    #[must_use]
    pub fn table(&self) -> &EncodingTable {
        &self.table
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run the full pipeline on one record.
    ///
    /// # Errors
    /// Returns the first `PipelineError` raised by any stage.
    pub fn predict(&self, record: &RawRecord) -> Result<Prediction, PipelineError> {
        let features = encode(record, &self.table)?;
        tracing::trace!("Encoded {} features", features.len());

        let scaled = scale(&features, self.scaler.as_ref())?;
        let index = self.model.predict(&scaled)?;
        let label = decode(index, &self.table)?;

        tracing::debug!("Prediction complete: class={index}, label={label}");
        Ok(Prediction::new(label, index))
    }

    /// Parse a JSON record and run the full pipeline on it.
    ///
    /// # Errors
    /// Returns `PipelineError::Validation` if the body is not a valid record,
    /// otherwise as [`PredictionService::predict`].
    pub fn predict_json(&self, body: &[u8]) -> Result<Prediction, PipelineError> {
        let record = RawRecord::from_json(body)?;
        self.predict(&record)
    }
}
