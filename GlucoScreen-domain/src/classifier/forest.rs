use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::entities::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use super::{ClassifierError, ModelInfo, RiskClassifier};

/// Serialized form of the ensemble
#[derive(Debug, Deserialize)]
struct ForestArtifact {
    name: String,
    version: String,
    feature_names: Vec<String>,
    trees: Vec<TreeArtifact>,
}

#[derive(Debug, Deserialize)]
struct TreeArtifact {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Node {
    /// Go left when `x[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class weights; normalized at load time
    Leaf { value: [f64; 2] },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root to a leaf. Children always have a larger index than
    /// their parent, so the walk terminates.
    fn evaluate(&self, x: &[f64]) -> [f64; 2] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Split { feature, threshold, left, right } => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { value } => return *value,
            }
        }
    }
}

/// Tree-ensemble classifier averaging each tree's leaf distribution
#[derive(Debug, Clone)]
pub struct ForestClassifier {
    name: String,
    version: String,
    trees: Vec<Tree>,
}

impl ForestClassifier {
    /// Load and validate a model artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        info!("Loading classifier model from {}", path.display());

        let json = std::fs::read_to_string(path)
            .map_err(|e| ClassifierError::Io(format!("{}: {}", path.display(), e)))?;

        let model = Self::from_json_str(&json)?;
        info!(
            "Loaded classifier {} v{} with {} trees",
            model.name,
            model.version,
            model.trees.len()
        );
        Ok(model)
    }

    /// Parse and validate a model artifact
    pub fn from_json_str(json: &str) -> Result<Self, ClassifierError> {
        let artifact: ForestArtifact = serde_json::from_str(json)
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        if artifact.feature_names.len() != FEATURE_COUNT
            || artifact.feature_names.iter().zip(FEATURE_NAMES.iter()).any(|(a, b)| a != b)
        {
            return Err(ClassifierError::InvalidModel(format!(
                "feature_names {:?} do not match expected order {:?}",
                artifact.feature_names, FEATURE_NAMES
            )));
        }

        if artifact.trees.is_empty() {
            return Err(ClassifierError::InvalidModel("model has no trees".to_string()));
        }

        let mut trees = Vec::with_capacity(artifact.trees.len());
        for (t, tree) in artifact.trees.into_iter().enumerate() {
            trees.push(validate_tree(t, tree)?);
        }

        Ok(Self {
            name: artifact.name,
            version: artifact.version,
            trees,
        })
    }
}

fn validate_tree(t: usize, tree: TreeArtifact) -> Result<Tree, ClassifierError> {
    if tree.nodes.is_empty() {
        return Err(ClassifierError::InvalidModel(format!("tree {} has no nodes", t)));
    }

    let count = tree.nodes.len();
    let mut nodes = Vec::with_capacity(count);

    for (i, node) in tree.nodes.into_iter().enumerate() {
        match node {
            Node::Split { feature, threshold, left, right } => {
                if feature >= FEATURE_COUNT {
                    return Err(ClassifierError::InvalidModel(format!(
                        "tree {} node {}: feature index {} out of range", t, i, feature
                    )));
                }
                if !threshold.is_finite() {
                    return Err(ClassifierError::InvalidModel(format!(
                        "tree {} node {}: threshold is not finite", t, i
                    )));
                }
                for child in [left, right] {
                    if child >= count || child <= i {
                        return Err(ClassifierError::InvalidModel(format!(
                            "tree {} node {}: child index {} must be in ({}, {})", t, i, child, i, count
                        )));
                    }
                }
                nodes.push(Node::Split { feature, threshold, left, right });
            }
            Node::Leaf { value } => {
                let sum = value[0] + value[1];
                if value.iter().any(|v| !v.is_finite() || *v < 0.0) || sum <= 0.0 {
                    return Err(ClassifierError::InvalidModel(format!(
                        "tree {} node {}: leaf weights must be non-negative with a positive sum", t, i
                    )));
                }
                nodes.push(Node::Leaf { value: [value[0] / sum, value[1] / sum] });
            }
        }
    }

    Ok(Tree { nodes })
}

impl RiskClassifier for ForestClassifier {
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ClassifierError> {
        let x = features.as_slice();
        if let Some(i) = x.iter().position(|v| !v.is_finite()) {
            return Err(ClassifierError::InvalidInput(format!(
                "feature {} is not a finite number", FEATURE_NAMES[i]
            )));
        }

        let (mut p0, mut p1) = (0.0, 0.0);
        for tree in &self.trees {
            let [a, b] = tree.evaluate(x);
            p0 += a;
            p1 += b;
        }

        let n = self.trees.len() as f64;
        let proba = [p0 / n, p1 / n];
        debug!("Classifier probabilities: {:?}", proba);
        Ok(proba)
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.name.clone(),
            version: self.version.clone(),
            tree_count: self.trees.len(),
        }
    }
}
