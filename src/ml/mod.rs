//! Machine learning building blocks for the trending classifier.
//!
//! Everything here is deterministic for a given seed so that training runs can
//! be reproduced bit for bit.

pub mod gbdt;
pub mod grid_search;
pub mod metrics;
pub mod smote;
pub mod split;
