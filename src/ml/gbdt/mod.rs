//! Deterministic gradient-boosted decision-tree classifier for binary labels.
//!
//! Supports:
//! - Logistic loss with second-order (gradient/hessian) leaf weights.
//! - Depth-limited trees grown over quantile-binned feature histograms.
//! - Seeded per-round row subsampling.
//! - JSON model export/load.
//!
//! Non-finite feature values are treated as missing and always routed to the
//! left child, both while training and while predicting.

mod model;
mod train;

pub use model::{GbdtModel, Tree, TreeNode, sigmoid};
pub use train::{BoosterParams, train_gbdt};
