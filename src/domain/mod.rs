//! Domain layer: Core business types and logic.
//!
//! Pure types describing the input schema, the encoding table and the
//! prediction result. Nothing here touches the filesystem or the network.

pub mod encoding;
mod error;
mod prediction;
mod record;

pub use encoding::{EncodingTable, SchemaError, OUTCOME_ATTRIBUTE};
pub use error::{ErrorKind, PipelineError};
pub use prediction::Prediction;
pub use record::{
    Attribute, AttributeKind, AttributeValue, FeatureVector, RawRecord, ScaledFeatureVector,
    FEATURE_COUNT,
};
