//! Exhaustive hyperparameter search with stratified cross-validation.
//!
//! Every (candidate, fold) pair is trained independently on the rayon pool the
//! caller runs in. Scores are gathered in grid order before picking a winner,
//! so the result does not depend on how many threads ran the search.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::gbdt::{BoosterParams, GbdtModel, train_gbdt};
use super::metrics::f1_score;
use super::split::{Fold, stratified_k_fold, take_rows};

/// Values tried for each searched hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub learning_rate: Vec<f64>,
    pub max_depth: Vec<usize>,
    pub n_estimators: Vec<usize>,
    pub subsample: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            learning_rate: vec![0.01, 0.1, 0.2],
            max_depth: vec![3, 5, 7],
            n_estimators: vec![50, 100, 200],
            subsample: vec![0.8, 1.0],
        }
    }
}

impl ParamGrid {
    /// Every combination, parameters in name order with the last varying fastest.
    pub fn candidates(&self, base: &BoosterParams) -> Vec<BoosterParams> {
        let mut out = Vec::with_capacity(self.len());
        for &learning_rate in &self.learning_rate {
            for &max_depth in &self.max_depth {
                for &n_estimators in &self.n_estimators {
                    for &subsample in &self.subsample {
                        out.push(BoosterParams {
                            learning_rate,
                            max_depth,
                            n_estimators,
                            subsample,
                            ..base.clone()
                        });
                    }
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.learning_rate.len() * self.max_depth.len() * self.n_estimators.len() * self.subsample.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cross-validated score of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: BoosterParams,
    pub fold_f1: Vec<f64>,
    pub mean_f1: f64,
}

/// Outcome of a search: every candidate's score and the refitted winner.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub scores: Vec<CandidateScore>,
    /// Index into `scores` of the winning candidate.
    pub best_index: usize,
    /// Winner retrained on all rows passed to the search.
    pub best_model: GbdtModel,
}

impl SearchResult {
    pub fn best(&self) -> &CandidateScore {
        &self.scores[self.best_index]
    }
}

/// Search `grid` with `folds`-fold stratified cross-validation, maximizing F1.
///
/// Ties go to the earliest candidate in grid order.
pub fn grid_search(
    x: &[Vec<f64>],
    y: &[u8],
    grid: &ParamGrid,
    base: &BoosterParams,
    folds: usize,
) -> Result<SearchResult, String> {
    if grid.is_empty() {
        return Err("Parameter grid is empty".to_string());
    }
    let candidates = grid.candidates(base);
    let splits: Vec<Fold> = stratified_k_fold(y, folds)?;
    tracing::info!(
        "Fitting {folds} folds for each of {} candidates, totalling {} fits",
        candidates.len(),
        candidates.len() * folds
    );

    let jobs: Vec<(usize, usize)> = (0..candidates.len())
        .flat_map(|c| (0..splits.len()).map(move |f| (c, f)))
        .collect();
    let fold_scores: Vec<f64> = jobs
        .par_iter()
        .map(|&(c, f)| score_fold(x, y, &candidates[c], &splits[f]))
        .collect::<Result<_, String>>()?;

    let scores: Vec<CandidateScore> = candidates
        .into_iter()
        .zip(fold_scores.chunks(splits.len()))
        .map(|(params, fold_f1)| CandidateScore {
            mean_f1: fold_f1.iter().sum::<f64>() / fold_f1.len() as f64,
            fold_f1: fold_f1.to_vec(),
            params,
        })
        .collect();

    let mut best_index = 0usize;
    for (idx, score) in scores.iter().enumerate() {
        if score.mean_f1 > scores[best_index].mean_f1 {
            best_index = idx;
        }
    }
    let best = &scores[best_index];
    tracing::debug!("Best cross-validated F1 {:.4} with {:?}", best.mean_f1, best.params);

    let best_model = train_gbdt(x, y, &best.params)?;
    Ok(SearchResult {
        scores,
        best_index,
        best_model,
    })
}

fn score_fold(x: &[Vec<f64>], y: &[u8], params: &BoosterParams, fold: &Fold) -> Result<f64, String> {
    let (train, validation) = fold;
    let train_x = take_rows(x, train);
    let train_y = take_rows(y, train);
    let model = train_gbdt(&train_x, &train_y, params)?;
    let truth = take_rows(y, validation);
    let predicted: Vec<u8> = validation
        .iter()
        .map(|&row| model.predict_class(&x[row]))
        .collect();
    Ok(f1_score(&truth, &predicted))
}
