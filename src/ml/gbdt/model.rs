use serde::{Deserialize, Serialize};

use super::BoosterParams;

/// Current model format version.
pub const MODEL_VERSION: i64 = 1;

/// One node of a regression tree; the root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Route `feature <= threshold` (or a missing value) left, the rest right.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Raw-score contribution, already scaled by the learning rate.
    Leaf { value: f64 },
}

/// Regression tree stored as a flat node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Raw-score contribution of this tree for a feature row.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        while let Some(node) = self.nodes.get(idx) {
            match *node {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(feature).copied().unwrap_or(0.0);
                    idx = if !value.is_finite() || value <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
        0.0
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(TreeNode::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    fn validate(&self, feature_len: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Leaf { value } if !value.is_finite() => {
                    return Err(format!("Leaf {idx} has a non-finite value"));
                }
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if feature >= feature_len {
                        return Err(format!(
                            "Node {idx} splits on feature {feature} but only {feature_len} exist"
                        ));
                    }
                    // Children must come after their parent, which rules out cycles.
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("Node {idx} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { .. } => {}
            }
        }
        Ok(())
    }
}

/// Boosted tree ensemble for binary classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    /// Model format version.
    pub model_version: i64,
    /// Number of values per feature row.
    pub feature_len: usize,
    /// Hyperparameters the model was trained with.
    pub params: BoosterParams,
    /// Initial raw score (log-odds of the positive class prior).
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl GbdtModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {MODEL_VERSION})",
                self.model_version
            ));
        }
        if self.feature_len == 0 {
            return Err("Model expects no features".to_string());
        }
        if !self.base_score.is_finite() {
            return Err("base_score must be finite".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_len)
                .map_err(|err| format!("Tree {tree_idx}: {err}"))?;
        }
        Ok(())
    }

    /// Parse and validate a model from JSON bytes.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, String> {
        let model: Self = serde_json::from_slice(bytes).map_err(|err| err.to_string())?;
        model.validate()?;
        Ok(model)
    }

    /// Raw log-odds score for a feature row.
    pub fn predict_raw(&self, features: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |raw, tree| raw + tree.predict(features))
    }

    /// Probability of the positive class, in [0, 1].
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.predict_raw(features))
    }

    /// Predicted label: 1 when the positive probability exceeds 0.5.
    pub fn predict_class(&self, features: &[f64]) -> u8 {
        u8::from(self.predict_proba(features) > 0.5)
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(raw: f64) -> f64 {
    if raw >= 0.0 {
        1.0 / (1.0 + (-raw).exp())
    } else {
        let e = raw.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(threshold: f64, left: f64, right: f64) -> Tree {
        Tree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: left },
                TreeNode::Leaf { value: right },
            ],
        }
    }

    fn model(trees: Vec<Tree>) -> GbdtModel {
        GbdtModel {
            model_version: MODEL_VERSION,
            feature_len: 2,
            params: BoosterParams::default(),
            base_score: 0.0,
            trees,
        }
    }

    #[test]
    fn tree_routes_missing_left() {
        let tree = stump(0.5, -1.0, 2.0);
        assert_eq!(tree.predict(&[0.5]), -1.0);
        assert_eq!(tree.predict(&[0.6]), 2.0);
        assert_eq!(tree.predict(&[f64::NAN]), -1.0);
        assert_eq!(tree.predict(&[f64::INFINITY]), -1.0);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn probabilities_are_bounded() {
        let model = model(vec![stump(0.0, -40.0, 40.0), stump(0.0, -40.0, 40.0)]);
        for row in [[-1.0, 0.0], [1.0, 0.0], [f64::NAN, 0.0]] {
            let p = model.predict_proba(&row);
            assert!((0.0..=1.0).contains(&p));
        }
        assert_eq!(model.predict_class(&[1.0, 0.0]), 1);
        assert_eq!(model.predict_class(&[-1.0, 0.0]), 0);
    }

    #[test]
    fn validate_rejects_backward_children() {
        let mut tree = stump(0.0, 0.0, 0.0);
        tree.nodes[0] = TreeNode::Split {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 2,
        };
        assert!(model(vec![tree]).validate().is_err());
        assert!(model(vec![stump(0.0, 1.0, 2.0)]).validate().is_ok());
    }

    #[test]
    fn json_round_trip_preserves_predictions() {
        let original = model(vec![stump(0.25, -0.3, 0.7)]);
        let bytes = serde_json::to_vec(&original).unwrap();
        let loaded = GbdtModel::from_json_bytes(&bytes).unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.predict_raw(&[1.0, 0.0]), 0.7);
    }
}
