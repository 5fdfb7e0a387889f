use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::model::{GbdtModel, MODEL_VERSION, Tree, TreeNode, sigmoid};

/// Hyperparameters for tree boosting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    /// Maximum depth of each tree.
    pub max_depth: usize,
    /// Shrinkage applied to every leaf value.
    pub learning_rate: f64,
    /// Number of boosting rounds.
    pub n_estimators: usize,
    /// Probability of keeping each row in a round.
    pub subsample: f64,
    /// L2 penalty on leaf weights.
    pub reg_lambda: f64,
    /// Minimum hessian sum required on each side of a split.
    pub min_child_weight: f64,
    /// Maximum number of histogram bins per feature.
    pub max_bins: usize,
    /// Seed for row subsampling.
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            learning_rate: 0.3,
            n_estimators: 100,
            subsample: 1.0,
            reg_lambda: 1.0,
            min_child_weight: 1.0,
            max_bins: 64,
            seed: 42,
        }
    }
}

/// Train a binary classifier on row-major `x` with 0/1 labels `y`.
pub fn train_gbdt(x: &[Vec<f64>], y: &[u8], params: &BoosterParams) -> Result<GbdtModel, String> {
    if x.len() != y.len() {
        return Err("Mismatched X/Y lengths".to_string());
    }
    if x.is_empty() {
        return Err("Empty dataset".to_string());
    }
    let feature_len = x[0].len();
    if feature_len == 0 {
        return Err("Rows have no features".to_string());
    }
    if x.iter().any(|row| row.len() != feature_len) {
        return Err("Rows have inconsistent feature counts".to_string());
    }
    if y.iter().any(|&label| label > 1) {
        return Err("Labels must be 0 or 1".to_string());
    }
    if !(params.subsample > 0.0 && params.subsample <= 1.0) {
        return Err(format!("subsample must be in (0, 1], got {}", params.subsample));
    }

    let n = x.len();
    let cuts: Vec<Vec<f64>> = (0..feature_len)
        .map(|j| feature_cuts(x, j, params.max_bins))
        .collect();
    let binned = bin_columns(x, &cuts);

    let positives = y.iter().filter(|&&label| label == 1).count() as f64;
    let prior = (positives / n as f64).clamp(1e-6, 1.0 - 1e-6);
    let base_score = (prior / (1.0 - prior)).ln();
    let mut raw = vec![base_score; n];

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut grad = vec![0.0f64; n];
    let mut hess = vec![0.0f64; n];
    let mut trees = Vec::with_capacity(params.n_estimators);
    for _round in 0..params.n_estimators {
        for i in 0..n {
            let p = sigmoid(raw[i]);
            grad[i] = p - f64::from(y[i]);
            hess[i] = (p * (1.0 - p)).max(1e-16);
        }
        let rows = sample_rows(n, params.subsample, &mut rng);
        let mut builder = TreeBuilder {
            binned: &binned,
            cuts: &cuts,
            grad: &grad,
            hess: &hess,
            params,
            nodes: Vec::new(),
        };
        builder.build(rows, 0);
        let tree = Tree {
            nodes: builder.nodes,
        };
        for (i, row) in x.iter().enumerate() {
            raw[i] += tree.predict(row);
        }
        trees.push(tree);
    }

    Ok(GbdtModel {
        model_version: MODEL_VERSION,
        feature_len,
        params: params.clone(),
        base_score,
        trees,
    })
}

/// Candidate split thresholds for one feature, ascending and unique.
fn feature_cuts(x: &[Vec<f64>], feature: usize, max_bins: usize) -> Vec<f64> {
    let mut values: Vec<f64> = x
        .iter()
        .map(|row| row[feature])
        .filter(|v| v.is_finite())
        .collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    if values.len() < 2 {
        return Vec::new();
    }
    let max_bins = max_bins.clamp(2, u16::MAX as usize);
    // The largest value never separates anything, so it is not a cut.
    let candidates = &values[..values.len() - 1];
    if candidates.len() < max_bins {
        return candidates.to_vec();
    }
    let mut cuts: Vec<f64> = (1..max_bins)
        .map(|k| candidates[(k * candidates.len() / max_bins).min(candidates.len() - 1)])
        .collect();
    cuts.dedup();
    cuts
}

/// Column-major bin indices; bin `b` holds values in `(cuts[b-1], cuts[b]]`.
fn bin_columns(x: &[Vec<f64>], cuts: &[Vec<f64>]) -> Vec<Vec<u16>> {
    cuts.iter()
        .enumerate()
        .map(|(j, feature_cuts)| {
            x.iter()
                .map(|row| bin_value(row[j], feature_cuts))
                .collect()
        })
        .collect()
}

fn bin_value(value: f64, cuts: &[f64]) -> u16 {
    if !value.is_finite() {
        return 0;
    }
    cuts.partition_point(|&cut| cut < value) as u16
}

fn sample_rows(n: usize, subsample: f64, rng: &mut StdRng) -> Vec<usize> {
    if subsample >= 1.0 {
        return (0..n).collect();
    }
    let rows: Vec<usize> = (0..n).filter(|_| rng.random::<f64>() < subsample).collect();
    if rows.is_empty() { (0..n).collect() } else { rows }
}

struct TreeBuilder<'a> {
    binned: &'a [Vec<u16>],
    cuts: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a BoosterParams,
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Copy)]
struct SplitChoice {
    gain: f64,
    feature: usize,
    bin: usize,
}

impl TreeBuilder<'_> {
    fn build(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let idx = self.nodes.len();
        let (g_sum, h_sum) = self.sums(&rows);
        self.nodes.push(TreeNode::Leaf {
            value: self.leaf_value(g_sum, h_sum),
        });
        if depth >= self.params.max_depth || rows.len() < 2 {
            return idx;
        }
        let Some(split) = self.best_split(&rows, g_sum, h_sum) else {
            return idx;
        };
        let column = &self.binned[split.feature];
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&row| usize::from(column[row]) <= split.bin);
        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[idx] = TreeNode::Split {
            feature: split.feature,
            threshold: self.cuts[split.feature][split.bin],
            left,
            right,
        };
        idx
    }

    fn sums(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter().fold((0.0, 0.0), |(g, h), &row| {
            (g + self.grad[row], h + self.hess[row])
        })
    }

    fn leaf_value(&self, g_sum: f64, h_sum: f64) -> f64 {
        -g_sum / (h_sum + self.params.reg_lambda) * self.params.learning_rate
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.reg_lambda)
    }

    fn best_split(&self, rows: &[usize], g_sum: f64, h_sum: f64) -> Option<SplitChoice> {
        let parent = self.score(g_sum, h_sum);
        let mut best: Option<SplitChoice> = None;
        for (feature, feature_cuts) in self.cuts.iter().enumerate() {
            if feature_cuts.is_empty() {
                continue;
            }
            let bins = feature_cuts.len() + 1;
            let mut hist_g = vec![0.0f64; bins];
            let mut hist_h = vec![0.0f64; bins];
            let column = &self.binned[feature];
            for &row in rows {
                let b = usize::from(column[row]);
                hist_g[b] += self.grad[row];
                hist_h[b] += self.hess[row];
            }
            let mut left_g = 0.0f64;
            let mut left_h = 0.0f64;
            for bin in 0..bins - 1 {
                left_g += hist_g[bin];
                left_h += hist_h[bin];
                let right_g = g_sum - left_g;
                let right_h = h_sum - left_h;
                if left_h < self.params.min_child_weight || right_h < self.params.min_child_weight
                {
                    continue;
                }
                let gain = self.score(left_g, left_h) + self.score(right_g, right_h) - parent;
                if gain > 1e-12 && best.is_none_or(|current| gain > current.gain) {
                    best = Some(SplitChoice { gain, feature, bin });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let v = i as f64;
            x.push(vec![v, (i % 3) as f64]);
            y.push(u8::from(i >= 20));
        }
        (x, y)
    }

    #[test]
    fn learns_a_threshold() {
        let (x, y) = separable();
        let params = BoosterParams {
            max_depth: 2,
            n_estimators: 30,
            learning_rate: 0.3,
            ..BoosterParams::default()
        };
        let model = train_gbdt(&x, &y, &params).unwrap();
        model.validate().unwrap();
        for (row, &label) in x.iter().zip(&y) {
            assert_eq!(model.predict_class(row), label);
        }
        assert!(model.trees.iter().all(|tree| tree.depth() <= 2));
    }

    #[test]
    fn same_seed_same_model() {
        let (x, y) = separable();
        let params = BoosterParams {
            subsample: 0.8,
            n_estimators: 10,
            ..BoosterParams::default()
        };
        let a = train_gbdt(&x, &y, &params).unwrap();
        let b = train_gbdt(&x, &y, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cuts_respect_bin_budget() {
        let x: Vec<Vec<f64>> = (0..1000).map(|i| vec![i as f64]).collect();
        let cuts = feature_cuts(&x, 0, 16);
        assert!(cuts.len() <= 15);
        assert!(cuts.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(feature_cuts(&[vec![1.0], vec![1.0]], 0, 16), Vec::<f64>::new());
    }

    #[test]
    fn bins_agree_with_thresholds() {
        let cuts = vec![1.0, 2.0, 4.0];
        for (value, bin) in [(0.5, 0), (1.0, 0), (1.5, 1), (4.0, 2), (9.0, 3), (f64::NAN, 0)] {
            assert_eq!(bin_value(value, &cuts), bin, "{value}");
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert!(train_gbdt(&[], &[], &BoosterParams::default()).is_err());
        assert!(train_gbdt(&[vec![1.0]], &[2], &BoosterParams::default()).is_err());
        let params = BoosterParams {
            subsample: 0.0,
            ..BoosterParams::default()
        };
        assert!(train_gbdt(&[vec![1.0]], &[1], &params).is_err());
    }
}
