//! Synthetic minority oversampling.
//!
//! New minority rows are interpolated between a minority row and one of its
//! nearest minority neighbours until both classes have the same count. The
//! original rows come first, synthetic rows are appended.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Oversampling settings.
#[derive(Debug, Clone)]
pub struct Smote {
    /// Neighbours considered per minority row.
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }
}

impl Smote {
    /// Rebalance `x`/`y` to a 1:1 class ratio.
    pub fn fit_resample(
        &self,
        x: &[Vec<f64>],
        y: &[u8],
    ) -> Result<(Vec<Vec<f64>>, Vec<u8>), String> {
        if x.len() != y.len() {
            return Err("Mismatched X/Y lengths".to_string());
        }
        let positives = y.iter().filter(|&&label| label == 1).count();
        let negatives = y.len() - positives;
        if positives == 0 || negatives == 0 {
            return Err(format!(
                "Oversampling needs both classes (got {negatives} negative, {positives} positive)"
            ));
        }
        let mut out_x = x.to_vec();
        let mut out_y = y.to_vec();
        if positives == negatives {
            return Ok((out_x, out_y));
        }
        let (minority_label, deficit) = if positives < negatives {
            (1u8, negatives - positives)
        } else {
            (0u8, positives - negatives)
        };
        let minority: Vec<&[f64]> = x
            .iter()
            .zip(y)
            .filter(|&(_, &label)| label == minority_label)
            .map(|(row, _)| row.as_slice())
            .collect();
        if minority.len() < 2 {
            return Err(format!(
                "Oversampling needs at least 2 minority rows, got {}",
                minority.len()
            ));
        }
        let k = self.k_neighbors.clamp(1, minority.len() - 1);
        if k < self.k_neighbors {
            tracing::debug!(
                "Only {} minority rows; using {k} neighbours instead of {}",
                minority.len(),
                self.k_neighbors
            );
        }
        let neighbors = nearest_neighbors(&minority, k);

        let mut rng = StdRng::seed_from_u64(self.seed);
        for _ in 0..deficit {
            let pick = rng.random_range(0..minority.len() * k);
            let base = minority[pick / k];
            let neighbor = minority[neighbors[pick / k][pick % k]];
            let step = rng.random::<f64>();
            let synthetic = base
                .iter()
                .zip(neighbor)
                .map(|(&a, &b)| a + step * (b - a))
                .collect();
            out_x.push(synthetic);
            out_y.push(minority_label);
        }
        Ok((out_x, out_y))
    }
}

/// For each row, indices of its `k` closest other rows (ties broken by index).
fn nearest_neighbors(rows: &[&[f64]], k: usize) -> Vec<Vec<usize>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let mut distances: Vec<(f64, usize)> = rows
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, other)| (squared_distance(row, other), j))
                .collect();
            distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            distances.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| x - y)
        .filter(|diff| diff.is_finite())
        .map(|diff| diff * diff)
        .sum()
}
