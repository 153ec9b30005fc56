//! Random forest classifier
//!
//! Trees are stored as flat node arrays. A split sends `x[feature] <= threshold`
//! to `left`, everything else to `right`. Leaves carry per-class weights
//! (sample counts or fractions) which are normalized into probabilities.

use serde::{Deserialize, Serialize};

use super::{check_dimension, Classifier, InferenceError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub classes: Vec<String>,
    pub trees: Vec<Tree>,
}

impl Tree {
    /// Structural check. Children must come after their parent, which
    /// guarantees every walk terminates at a leaf.
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        let len = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { feature, threshold, left, right } => {
                    if *feature >= n_features {
                        return Err(format!("node {}: feature {} out of range", i, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {}: non-finite threshold", i));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= len {
                            return Err(format!("node {}: invalid child index {}", i, child));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "node {}: leaf has {} class weights, expected {}",
                            i,
                            value.len(),
                            n_classes
                        ));
                    }
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(format!("node {}: leaf weights must be finite and non-negative", i));
                    }
                    let total: f64 = value.iter().sum();
                    if !total.is_finite() || total <= 0.0 {
                        return Err(format!("node {}: leaf weights must sum to a finite positive value", i));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf(&self, x: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split { feature, threshold, left, right } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { value } => return value,
            }
        }
    }
}

impl RandomForest {
    pub fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("n_features must be positive".to_string());
        }
        if self.classes.is_empty() {
            return Err("no classes".to_string());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }

        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| format!("tree {}: {}", t, e))?;
        }
        Ok(())
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Mean of the normalized leaf distributions over all trees.
    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_dimension(self.n_features, x)?;
        if self.trees.is_empty() {
            return Err(InferenceError::EmptyOutput);
        }

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf(x);
            let total: f64 = leaf.iter().sum();
            for (p, w) in proba.iter_mut().zip(leaf) {
                *p += w / total;
            }
        }

        let n = self.trees.len() as f64;
        for p in proba.iter_mut() {
            *p /= n;
        }
        Ok(proba)
    }
}
