//! Categorical encoding table.
//!
//! Maps each categorical attribute to its ordered label sequence; a label's
//! position is its integer code. The outcome entry is only ever used to
//! decode model output.

use std::collections::BTreeMap;

use super::error::PipelineError;
use super::record::Attribute;

/// Table key of the model's target column.
pub const OUTCOME_ATTRIBUTE: &str = "Has_Hypertension";

/// The encoding metadata does not match the fixed input schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Encoding metadata is not an object of string arrays: {0}")]
    Malformed(String),

    #[error("Encoding metadata has no entry for {0}")]
    MissingAttribute(String),

    #[error("Encoding metadata entry {0} has no categories")]
    EmptyCategories(String),

    #[error("Encoding metadata entry {attribute} lists {label:?} more than once")]
    DuplicateLabel { attribute: String, label: String },

    #[error("Encoding metadata has an entry for numeric attribute {0}")]
    NumericAttributeEncoded(String),
}

/// Validated, immutable encoding table.
///
/// Construction checks the table against the schema once, so lookups during
/// a request only fail on bad input, never on table drift.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingTable {
    categories: BTreeMap<Attribute, Vec<String>>,
    outcome: Vec<String>,
}

impl EncodingTable {
    /// Parse and validate the JSON encoding metadata document.
    ///
    /// # Errors
    /// Returns `SchemaError` if the document is malformed or does not cover
    /// the schema.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let entries: BTreeMap<String, Vec<String>> =
            serde_json::from_str(json).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        Self::from_entries(entries)
    }

    /// Build the table from raw name → labels entries.
    ///
    /// # Errors
    /// Returns `SchemaError` if a categorical attribute or the outcome is
    /// missing or empty, a sequence repeats a label, or a numeric attribute
    /// has an entry.
    pub fn from_entries(mut entries: BTreeMap<String, Vec<String>>) -> Result<Self, SchemaError> {
        for (name, labels) in &entries {
            let mut seen = std::collections::BTreeSet::new();
            for label in labels {
                if !seen.insert(label.as_str()) {
                    return Err(SchemaError::DuplicateLabel {
                        attribute: name.clone(),
                        label: label.clone(),
                    });
                }
            }
        }

        let outcome = entries
            .remove(OUTCOME_ATTRIBUTE)
            .ok_or_else(|| SchemaError::MissingAttribute(OUTCOME_ATTRIBUTE.to_string()))?;
        if outcome.is_empty() {
            return Err(SchemaError::EmptyCategories(OUTCOME_ATTRIBUTE.to_string()));
        }

        let mut categories = BTreeMap::new();
        for attribute in Attribute::categorical() {
            let labels = entries
                .remove(attribute.name())
                .ok_or_else(|| SchemaError::MissingAttribute(attribute.name().to_string()))?;
            if labels.is_empty() {
                return Err(SchemaError::EmptyCategories(attribute.name().to_string()));
            }
            categories.insert(attribute, labels);
        }

        for name in entries.keys() {
            match Attribute::from_name(name) {
                Some(attribute) if !attribute.is_categorical() => {
                    return Err(SchemaError::NumericAttributeEncoded(name.clone()));
                }
                _ => tracing::warn!("Ignoring encoding entry {name:?}: not an input attribute"),
            }
        }

        Ok(Self {
            categories,
            outcome,
        })
    }

    /// Category labels for `attribute`; empty for numeric attributes.
    #[must_use]
    pub fn categories(&self, attribute: Attribute) -> &[String] {
        self.categories
            .get(&attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Integer code of `value` within `attribute`'s sequence.
    ///
    /// # Errors
    /// Returns `PipelineError::Validation` if the label is unknown.
    pub fn code_of(&self, attribute: Attribute, value: &str) -> Result<usize, PipelineError> {
        let labels = self.categories(attribute);
        labels.iter().position(|l| l == value).ok_or_else(|| {
            PipelineError::validation(format!(
                "{attribute}: {value:?} is not one of {}",
                labels.join(", ")
            ))
        })
    }

    /// Label at `code` within `attribute`'s sequence.
    #[must_use]
    pub fn label_of(&self, attribute: Attribute, code: usize) -> Option<&str> {
        self.categories(attribute).get(code).map(String::as_str)
    }

    #[must_use]
    pub fn outcome_categories(&self) -> &[String] {
        &self.outcome
    }

    /// Decode a model class index into its outcome label.
    ///
    /// # Errors
    /// Returns `PipelineError::Decoding` if `index` is negative or past the
    /// end of the outcome sequence.
    pub fn outcome_label(&self, index: i64) -> Result<&str, PipelineError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.outcome.get(i))
            .map(String::as_str)
            .ok_or(PipelineError::Decoding {
                index,
                len: self.outcome.len(),
            })
    }
}
