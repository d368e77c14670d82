//! Artifact adapter: loads the model, scaler and encoding table exported by
//! the training job.
//!
//! # Integrity
//!
//! - If `manifest.json` is present, every artifact must be bound by it and
//!   match its SHA-256 digest before it is parsed
//! - With `TENSIO_REQUIRE_MANIFEST=true`, a missing manifest refuses start-up
//!
//! # Consistency
//!
//! The three artifacts are produced together, so they are also checked
//! together: both the scaler and the model must expect the ten-feature
//! schema, and every class the model can emit must decode through the
//! outcome entry of the encoding table. Any failure here is fatal at start-up.

mod manifest;
mod model;
mod scaler;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;

pub use manifest::{sha256_hex, ArtifactManifest, MANIFEST_FILE};
pub use model::{DecisionTree, LogisticRegression, ModelArtifact, RandomForest};
pub use scaler::ScalerArtifact;

use crate::application::PredictionService;
use crate::config::ArtifactConfig;
use crate::domain::{EncodingTable, SchemaError, FEATURE_COUNT};
use crate::ports::{Model, Scaler};

/// Errors raised while loading artifacts. All of them are fatal at start-up.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid artifact: {0}")]
    Invalid(String),

    #[error("Encoding table rejected: {0}")]
    Schema(#[from] SchemaError),

    #[error("Artifact integrity check failed: {0}")]
    Integrity(String),

    #[error("Artifacts do not fit together: {0}")]
    Mismatch(String),
}

/// The three immutable artifact handles shared by every request.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub model: Arc<ModelArtifact>,
    pub scaler: Arc<ScalerArtifact>,
    pub table: Arc<EncodingTable>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<(T, String), ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok((value, sha256_hex(&bytes)))
}

impl ArtifactBundle {
    /// Load, verify and cross-check the artifacts named by `config`.
    ///
    /// # Errors
    /// Returns `ArtifactError` if any file is missing, unreadable, fails its
    /// manifest digest, is malformed, or does not fit the other artifacts.
    pub fn load(config: &ArtifactConfig) -> Result<Self, ArtifactError> {
        let dir = config.dir.as_path();
        tracing::info!("Loading artifacts from {:?}", dir);

        match ArtifactManifest::read(dir)? {
            Some(manifest) => {
                manifest.verify(dir, &config.file_names())?;
                tracing::info!(
                    "Artifact manifest verified ({} files, created_at={:?})",
                    manifest.files.len(),
                    manifest.created_at
                );
            }
            None if config.require_manifest => {
                return Err(ArtifactError::Integrity(format!(
                    "{MANIFEST_FILE} not found in {dir:?} and TENSIO_REQUIRE_MANIFEST is set"
                )));
            }
            None => tracing::warn!("No {MANIFEST_FILE} in {:?}; loading unverified artifacts", dir),
        }

        let encoders_path = config.encoders_path();
        let json = std::fs::read_to_string(&encoders_path).map_err(|source| ArtifactError::Io {
            path: encoders_path.clone(),
            source,
        })?;
        let table = EncodingTable::from_json_str(&json)?;
        tracing::info!(
            "Loaded encoding table from {:?} (sha256={}, outcome={:?})",
            encoders_path,
            sha256_hex(json.as_bytes()),
            table.outcome_categories()
        );

        let scaler_path = config.scaler_path();
        let (scaler, scaler_hash): (ScalerArtifact, _) = read_json(&scaler_path)?;
        tracing::info!(
            "Loaded scaler from {:?} (sha256={}, n_features={})",
            scaler_path,
            scaler_hash,
            scaler.n_features()
        );

        let model_path = config.model_path();
        let (model, model_hash): (ModelArtifact, _) = read_json(&model_path)?;
        tracing::info!(
            "Loaded {} from {:?} (sha256={}, n_features={}, classes={:?})",
            model.describe(),
            model_path,
            model_hash,
            model.n_features(),
            model.classes()
        );

        Self::from_parts(model, scaler, table)
    }

    /// Assemble a bundle from already parsed artifacts, running the
    /// structural and cross-artifact checks.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the model or scaler is malformed,
    /// and `ArtifactError::Mismatch` if the artifacts disagree on the feature
    /// count or the model can emit an undecodable class.
    pub fn from_parts(
        model: ModelArtifact,
        scaler: ScalerArtifact,
        table: EncodingTable,
    ) -> Result<Self, ArtifactError> {
        scaler.validate()?;
        model.validate()?;

        if scaler.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::Mismatch(format!(
                "scaler expects {} features, schema has {FEATURE_COUNT}",
                scaler.n_features()
            )));
        }
        if model.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::Mismatch(format!(
                "model expects {} features, schema has {FEATURE_COUNT}",
                model.n_features()
            )));
        }
        if let Some(class) = model
            .classes()
            .iter()
            .find(|&&c| table.outcome_label(c).is_err())
        {
            return Err(ArtifactError::Mismatch(format!(
                "model class {class} has no label among {:?}",
                table.outcome_categories()
            )));
        }

        Ok(Self {
            model: Arc::new(model),
            scaler: Arc::new(scaler),
            table: Arc::new(table),
        })
    }

    /// Wrap the handles in the prediction service.
    #[must_use]
    pub fn into_service(self) -> PredictionService<ModelArtifact, ScalerArtifact> {
        PredictionService::new(self.model, self.scaler, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::tests::scenario_record;
    use crate::domain::encoding::tests::{scenario_table, SCENARIO_TABLE};
    use crate::domain::Prediction;
    use std::fs;
    use tempfile::tempdir;

    fn shipped() -> ArtifactConfig {
        ArtifactConfig {
            dir: PathBuf::from("artifacts"),
            ..ArtifactConfig::default()
        }
    }

    fn copy_shipped(dir: &Path) -> ArtifactConfig {
        let source = shipped();
        for name in source.file_names() {
            fs::copy(source.dir.join(name), dir.join(name)).expect("copy artifact");
        }
        ArtifactConfig {
            dir: dir.to_path_buf(),
            ..ArtifactConfig::default()
        }
    }

    fn identity_scaler(n: usize) -> ScalerArtifact {
        ScalerArtifact::Standard {
            mean: vec![0.0; n],
            scale: vec![1.0; n],
        }
    }

    fn constant_forest(n_features: usize, classes: Vec<i64>) -> ModelArtifact {
        let n_classes = classes.len();
        ModelArtifact::RandomForest(RandomForest {
            n_features,
            classes,
            trees: vec![DecisionTree {
                children_left: vec![-1],
                children_right: vec![-1],
                feature: vec![-2],
                threshold: vec![-2.0],
                value: vec![vec![1.0; n_classes]],
            }],
        })
    }

    #[test]
    fn test_load_shipped_artifacts() {
        let bundle = ArtifactBundle::load(&shipped()).expect("Shipped artifacts should load");
        assert_eq!(bundle.scaler.n_features(), FEATURE_COUNT);
        assert_eq!(bundle.table.outcome_categories(), ["No", "Yes"]);
    }

    #[test]
    fn test_shipped_model_on_scenario_record() {
        let service = ArtifactBundle::load(&shipped()).expect("load").into_service();
        let prediction = service.predict(&scenario_record()).expect("Should predict");
        assert_eq!(prediction, Prediction::new("No", 0));
    }

    #[test]
    fn test_shipped_model_on_high_risk_record() {
        let service = ArtifactBundle::load(&shipped()).expect("load").into_service();
        let mut record = scenario_record();
        record.age = 70.0;
        record.salt_intake = 12.0;
        record.bp_history = "High".into();
        record.bmi = 33.0;
        let prediction = service.predict(&record).expect("Should predict");
        assert_eq!(prediction, Prediction::new("Yes", 1));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let config = ArtifactConfig {
            dir: PathBuf::from("does-not-exist"),
            ..ArtifactConfig::default()
        };
        assert!(matches!(
            ArtifactBundle::load(&config),
            Err(ArtifactError::Io { .. })
        ));
    }

    #[test]
    fn test_manifest_is_enforced_when_required() {
        let temp = tempdir().expect("tempdir");
        let mut config = copy_shipped(temp.path());
        config.require_manifest = true;
        assert!(matches!(
            ArtifactBundle::load(&config),
            Err(ArtifactError::Integrity(_))
        ));

        ArtifactManifest::build(temp.path(), &config.file_names())
            .expect("build")
            .write(temp.path())
            .expect("write");
        ArtifactBundle::load(&config).expect("Verified artifacts should load");
    }

    #[test]
    fn test_tampered_artifact_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let config = copy_shipped(temp.path());
        ArtifactManifest::build(temp.path(), &config.file_names())
            .expect("build")
            .write(temp.path())
            .expect("write");

        fs::write(config.encoders_path(), SCENARIO_TABLE.replace("Smoker\"]", "Vaper\"]"))
            .expect("tamper");
        assert!(matches!(
            ArtifactBundle::load(&config),
            Err(ArtifactError::Integrity(_))
        ));
    }

    #[test]
    fn test_malformed_model_file() {
        let temp = tempdir().expect("tempdir");
        let config = copy_shipped(temp.path());
        fs::write(config.model_path(), br#"{"kind": "svm"}"#).expect("write");
        assert!(matches!(
            ArtifactBundle::load(&config),
            Err(ArtifactError::Parse { .. })
        ));
    }

    #[test]
    fn test_from_parts_rejects_malformed_artifacts() {
        let broken = ModelArtifact::RandomForest(RandomForest {
            n_features: FEATURE_COUNT,
            classes: vec![0, 1],
            trees: vec![DecisionTree {
                children_left: vec![5],
                children_right: vec![6],
                feature: vec![0],
                threshold: vec![0.5],
                value: vec![vec![1.0, 1.0]],
            }],
        });
        assert!(matches!(
            ArtifactBundle::from_parts(broken, identity_scaler(FEATURE_COUNT), scenario_table()),
            Err(ArtifactError::Invalid(_))
        ));

        let ragged = ScalerArtifact::Standard {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; 3],
        };
        assert!(matches!(
            ArtifactBundle::from_parts(
                constant_forest(FEATURE_COUNT, vec![0, 1]),
                ragged,
                scenario_table()
            ),
            Err(ArtifactError::Invalid(_))
        ));
    }

    #[test]
    fn test_cross_checks() {
        assert!(matches!(
            ArtifactBundle::from_parts(
                constant_forest(FEATURE_COUNT, vec![0, 1]),
                identity_scaler(9),
                scenario_table()
            ),
            Err(ArtifactError::Mismatch(_))
        ));
        assert!(matches!(
            ArtifactBundle::from_parts(
                constant_forest(8, vec![0, 1]),
                identity_scaler(FEATURE_COUNT),
                scenario_table()
            ),
            Err(ArtifactError::Mismatch(_))
        ));
        assert!(matches!(
            ArtifactBundle::from_parts(
                constant_forest(FEATURE_COUNT, vec![0, 1, 2]),
                identity_scaler(FEATURE_COUNT),
                scenario_table()
            ),
            Err(ArtifactError::Mismatch(_))
        ));
        assert!(ArtifactBundle::from_parts(
            constant_forest(FEATURE_COUNT, vec![0, 1]),
            identity_scaler(FEATURE_COUNT),
            scenario_table()
        )
        .is_ok());
    }
}
