//! Pre-trained classifiers exported from the training job.
//!
//! Tree arrays follow the layout of scikit-learn's `tree_` attribute so the
//! export script can dump them without reshaping: parallel per-node arrays,
//! `-1` marking a leaf's missing children, and per-node class weights.

use serde::{Deserialize, Serialize};

use super::ArtifactError;
use crate::domain::{PipelineError, ScaledFeatureVector};
use crate::ports::Model;

const LEAF: i64 = -1;

/// One decision tree in parallel-array form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Class weights per node; only leaves are read.
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("tree arrays differ in length".into());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(format!("node {node} has exactly one child"));
                }
                let weights = &self.value[node];
                if weights.len() != n_classes {
                    return Err(format!(
                        "leaf {node} has {} class weights, expected {n_classes}",
                        weights.len()
                    ));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0)
                    || weights.iter().sum::<f64>() <= 0.0
                {
                    return Err(format!("leaf {node} has invalid class weights"));
                }
                continue;
            }

            // Children always come after their parent, which rules out cycles.
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has out-of-order child {child}"));
                }
            }
            if !usize::try_from(self.feature[node]).is_ok_and(|f| f < n_features) {
                return Err(format!(
                    "node {node} splits on unknown feature {}",
                    self.feature[node]
                ));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {node} has a non-finite threshold"));
            }
        }
        Ok(())
    }

    /// Class probabilities of the leaf reached by `x`.
    fn leaf_probabilities(&self, x: &[f64]) -> Vec<f64> {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if x[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let weights = &self.value[node];
        let total: f64 = weights.iter().sum();
        weights.iter().map(|w| w / total).collect()
    }
}

/// Forest of decision trees voting by averaged leaf probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub classes: Vec<i64>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    fn probabilities(&self, x: &[f64]) -> Vec<f64> {
        let mut sum = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.leaf_probabilities(x)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        sum.into_iter().map(|p| p / n).collect()
    }
}

/// Linear classifier; one coefficient row for binary problems, one per class
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub n_features: usize,
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LogisticRegression {
    fn decision(&self, x: &[f64]) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect()
    }
}

/// Model parameters as exported to JSON, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl ModelArtifact {
    /// Check structural consistency of the exported parameters.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.n_features() == 0 {
            return Err(ArtifactError::Invalid("model has no features".into()));
        }
        if self.classes().is_empty() {
            return Err(ArtifactError::Invalid("model has no classes".into()));
        }

        match self {
            Self::RandomForest(forest) => {
                if forest.trees.is_empty() {
                    return Err(ArtifactError::Invalid("forest has no trees".into()));
                }
                for (i, tree) in forest.trees.iter().enumerate() {
                    tree.validate(forest.n_features, forest.classes.len())
                        .map_err(|e| ArtifactError::Invalid(format!("tree {i}: {e}")))?;
                }
            }
            Self::LogisticRegression(lr) => {
                let rows = if lr.classes.len() == 2 { 1 } else { lr.classes.len() };
                if lr.coef.len() != rows || lr.intercept.len() != rows {
                    return Err(ArtifactError::Invalid(format!(
                        "logistic regression over {} classes needs {rows} coefficient rows",
                        lr.classes.len()
                    )));
                }
                if lr.coef.iter().any(|row| row.len() != lr.n_features) {
                    return Err(ArtifactError::Invalid(
                        "coefficient row length differs from n_features".into(),
                    ));
                }
                if lr.coef.iter().flatten().chain(&lr.intercept).any(|v| !v.is_finite()) {
                    return Err(ArtifactError::Invalid(
                        "logistic regression parameters must be finite".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Short human-readable description for logs and the form header.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::RandomForest(f) => format!("random forest ({} trees)", f.trees.len()),
            Self::LogisticRegression(_) => "logistic regression".to_string(),
        }
    }
}

/// Index of the largest value; the first one wins on ties.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

impl Model for ModelArtifact {
    fn n_features(&self) -> usize {
        match self {
            Self::RandomForest(f) => f.n_features,
            Self::LogisticRegression(lr) => lr.n_features,
        }
    }

    fn classes(&self) -> &[i64] {
        match self {
            Self::RandomForest(f) => &f.classes,
            Self::LogisticRegression(lr) => &lr.classes,
        }
    }

    fn predict(&self, features: &ScaledFeatureVector) -> Result<i64, PipelineError> {
        let x = features.as_slice();
        if x.len() != self.n_features() {
            return Err(PipelineError::Artifact(format!(
                "model expects {} features, got {}",
                self.n_features(),
                x.len()
            )));
        }

        let position = match self {
            Self::RandomForest(forest) => argmax(&forest.probabilities(x)),
            Self::LogisticRegression(lr) => {
                let scores = lr.decision(x);
                if lr.classes.len() == 2 {
                    usize::from(scores[0] > 0.0)
                } else {
                    argmax(&scores)
                }
            }
        };

        Ok(self.classes()[position])
    }
}
