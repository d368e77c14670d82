//! Decoded model output.

use serde::{Deserialize, Serialize};

/// Result of one prediction: the outcome label and the raw class index it
/// was decoded from.
///
/// Serializes to the HTTP response shape
/// `{"prediction": "...", "encoded_prediction": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "prediction")]
    pub label: String,

    #[serde(rename = "encoded_prediction")]
    pub encoded: i64,
}

impl Prediction {
    #[must_use]
    pub fn new(label: impl Into<String>, encoded: i64) -> Self {
        Self {
            label: label.into(),
            encoded,
        }
    }

    /// Whether the model predicted anything other than the first outcome
    /// category (`"No"` in the shipped table).
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.encoded != 0
    }
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (class {})", self.label, self.encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(Prediction::new("Yes", 1)).unwrap();
        assert_eq!(json, serde_json::json!({"prediction": "Yes", "encoded_prediction": 1}));
    }

    #[test]
    fn test_positive_outcome() {
        assert!(!Prediction::new("No", 0).is_positive());
        assert!(Prediction::new("Yes", 1).is_positive());
    }
}
