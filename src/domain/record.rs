//! Patient record schema and the numeric vectors derived from it.
//!
//! The ten attributes and their order are fixed; the model was trained on
//! exactly this column layout.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::PipelineError;

/// Number of features the pipeline feeds to the scaler and model.
pub const FEATURE_COUNT: usize = 10;

/// Whether an attribute is used as-is or looked up in the encoding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Numeric,
    Categorical,
}

/// One column of the input schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Age,
    SaltIntake,
    StressScore,
    BpHistory,
    SleepDuration,
    Bmi,
    Medication,
    FamilyHistory,
    ExerciseLevel,
    SmokingStatus,
}

impl Attribute {
    /// All attributes in feature-vector order.
    pub const ALL: [Attribute; FEATURE_COUNT] = [
        Self::Age,
        Self::SaltIntake,
        Self::StressScore,
        Self::BpHistory,
        Self::SleepDuration,
        Self::Bmi,
        Self::Medication,
        Self::FamilyHistory,
        Self::ExerciseLevel,
        Self::SmokingStatus,
    ];

    /// Wire name, as used in JSON records and the encoding table.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::SaltIntake => "Salt_Intake",
            Self::StressScore => "Stress_Score",
            Self::BpHistory => "BP_History",
            Self::SleepDuration => "Sleep_Duration",
            Self::Bmi => "BMI",
            Self::Medication => "Medication",
            Self::FamilyHistory => "Family_History",
            Self::ExerciseLevel => "Exercise_Level",
            Self::SmokingStatus => "Smoking_Status",
        }
    }

    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::BpHistory
            | Self::Medication
            | Self::FamilyHistory
            | Self::ExerciseLevel
            | Self::SmokingStatus => AttributeKind::Categorical,
            _ => AttributeKind::Numeric,
        }
    }

    #[must_use]
    pub fn is_categorical(&self) -> bool {
        self.kind() == AttributeKind::Categorical
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Categorical attributes, in feature-vector order.
    pub fn categorical() -> impl Iterator<Item = Attribute> {
        Self::ALL.into_iter().filter(Attribute::is_categorical)
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of a single attribute, borrowed from a [`RawRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue<'a> {
    Numeric(f64),
    Categorical(&'a str),
}

/// One subject's input, exactly as submitted.
///
/// Deserialization rejects missing attributes, `null`, wrong JSON types and
/// unknown keys, so a `RawRecord` always carries all ten attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRecord {
    #[serde(rename = "Age")]
    pub age: f64,
    #[serde(rename = "Salt_Intake")]
    pub salt_intake: f64,
    #[serde(rename = "Stress_Score")]
    pub stress_score: f64,
    #[serde(rename = "BP_History")]
    pub bp_history: String,
    #[serde(rename = "Sleep_Duration")]
    pub sleep_duration: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "Medication")]
    pub medication: String,
    #[serde(rename = "Family_History")]
    pub family_history: String,
    #[serde(rename = "Exercise_Level")]
    pub exercise_level: String,
    #[serde(rename = "Smoking_Status")]
    pub smoking_status: String,
}

impl RawRecord {
    /// Parse a record from a JSON request body.
    ///
    /// # Errors
    /// Returns `PipelineError::Validation` for anything that is not a
    /// complete ten-attribute JSON object.
    pub fn from_json(body: &[u8]) -> Result<Self, PipelineError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| PipelineError::validation(format!("malformed JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Parse a record from an already decoded JSON value.
    ///
    /// Shape is checked attribute by attribute before deserializing, so
    /// messages name the offending attribute and never quote its value.
    ///
    /// # Errors
    /// Same conditions as [`RawRecord::from_json`].
    pub fn from_value(value: Value) -> Result<Self, PipelineError> {
        let Value::Object(object) = &value else {
            return Err(PipelineError::validation(
                "expected a JSON object of attributes",
            ));
        };

        if let Some(key) = object.keys().find(|k| Attribute::from_name(k).is_none()) {
            return Err(PipelineError::validation(format!("unknown attribute {key:?}")));
        }

        for attribute in Attribute::ALL {
            match (attribute.kind(), object.get(attribute.name())) {
                (_, None) => {
                    return Err(PipelineError::validation(format!(
                        "missing attribute {attribute}"
                    )));
                }
                (AttributeKind::Numeric, Some(Value::Number(_)))
                | (AttributeKind::Categorical, Some(Value::String(_))) => {}
                (AttributeKind::Numeric, Some(_)) => {
                    return Err(PipelineError::validation(format!(
                        "attribute {attribute} must be a number"
                    )));
                }
                (AttributeKind::Categorical, Some(_)) => {
                    return Err(PipelineError::validation(format!(
                        "attribute {attribute} must be a string"
                    )));
                }
            }
        }

        serde_json::from_value(value).map_err(|e| PipelineError::validation(e.to_string()))
    }

    #[must_use]
    pub fn value(&self, attribute: Attribute) -> AttributeValue<'_> {
        match attribute {
            Attribute::Age => AttributeValue::Numeric(self.age),
            Attribute::SaltIntake => AttributeValue::Numeric(self.salt_intake),
            Attribute::StressScore => AttributeValue::Numeric(self.stress_score),
            Attribute::BpHistory => AttributeValue::Categorical(&self.bp_history),
            Attribute::SleepDuration => AttributeValue::Numeric(self.sleep_duration),
            Attribute::Bmi => AttributeValue::Numeric(self.bmi),
            Attribute::Medication => AttributeValue::Categorical(&self.medication),
            Attribute::FamilyHistory => AttributeValue::Categorical(&self.family_history),
            Attribute::ExerciseLevel => AttributeValue::Categorical(&self.exercise_level),
            Attribute::SmokingStatus => AttributeValue::Categorical(&self.smoking_status),
        }
    }
}

/// Numeric encoding of a [`RawRecord`], in [`Attribute::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Feature vector after the scaler's transform. Same length and order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledFeatureVector(Vec<f64>);

impl ScaledFeatureVector {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scenario_json() -> serde_json::Value {
        json!({
            "Age": 45,
            "Salt_Intake": 8.0,
            "Stress_Score": 5,
            "BP_History": "Normal",
            "Sleep_Duration": 7.0,
            "BMI": 25.0,
            "Medication": "No",
            "Family_History": "No",
            "Exercise_Level": "Moderate",
            "Smoking_Status": "Non-Smoker"
        })
    }

    #[test]
    fn test_attribute_order_and_names() {
        let names: Vec<&str> = Attribute::ALL.iter().map(Attribute::name).collect();
        assert_eq!(
            names,
            [
                "Age",
                "Salt_Intake",
                "Stress_Score",
                "BP_History",
                "Sleep_Duration",
                "BMI",
                "Medication",
                "Family_History",
                "Exercise_Level",
                "Smoking_Status"
            ]
        );
        assert_eq!(Attribute::categorical().count(), 5);
        assert_eq!(Attribute::from_name("BMI"), Some(Attribute::Bmi));
        assert_eq!(Attribute::from_name("Has_Hypertension"), None);
    }

    #[test]
    fn test_parse_accepts_integers_for_numeric_fields() {
        let record = RawRecord::from_value(scenario_json()).expect("Should parse");
        assert!((record.age - 45.0).abs() < f64::EPSILON);
        assert_eq!(record.value(Attribute::BpHistory), AttributeValue::Categorical("Normal"));
    }

    #[test]
    fn test_parse_rejects_missing_attribute() {
        let mut value = scenario_json();
        value.as_object_mut().unwrap().remove("BMI");
        let err = RawRecord::from_value(value).expect_err("BMI is required");
        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(err.to_string().contains("BMI"));
    }

    #[test]
    fn test_parse_rejects_extraneous_attribute() {
        let mut value = scenario_json();
        value
            .as_object_mut()
            .unwrap()
            .insert("Cholesterol".into(), json!(200));
        let err = RawRecord::from_value(value).expect_err("unknown key");
        assert!(err.to_string().contains("Cholesterol"));
    }

    #[test]
    fn test_parse_rejects_wrong_types_and_null() {
        let cases = [
            ("Age", json!("forty"), "forty"),
            ("Medication", json!(0), "0"),
            ("Sleep_Duration", serde_json::Value::Null, "null"),
            ("BMI", json!(true), "true"),
        ];
        for (name, bad, quoted) in cases {
            let mut value = scenario_json();
            value.as_object_mut().unwrap()[name] = bad;
            let err = RawRecord::from_value(value).expect_err("wrong type");
            let message = err.to_string();
            assert!(matches!(err, PipelineError::Validation(_)));
            assert!(message.contains(name), "{message}");
            assert!(!message.contains(quoted), "{message}");
        }
    }

    #[test]
    fn test_wrong_type_in_body_names_attribute_without_value() {
        let body = scenario_json().to_string().replace("45", "\"forty\"");
        let err = RawRecord::from_json(body.as_bytes()).expect_err("string age");
        assert_eq!(err.to_string(), "Invalid record: attribute Age must be a number");
    }

    #[test]
    fn test_parse_rejects_non_object_bodies() {
        assert!(RawRecord::from_json(b"[1, 2, 3]").is_err());
        assert!(RawRecord::from_json(b"not json").is_err());
        assert!(RawRecord::from_json(b"").is_err());
    }
}
