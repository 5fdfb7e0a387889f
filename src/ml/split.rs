//! Seeded train/test splits and stratified k-fold partitions.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_fraction)` rows.
///
/// Returns `(train, test)` row indices.
pub fn train_test_split(
    n: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), String> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(format!("test_fraction must be in (0, 1), got {test_fraction}"));
    }
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(format!(
            "Cannot split {n} rows into non-empty train and test sets"
        ));
    }
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// One cross-validation fold as `(train, validation)` row indices.
pub type Fold = (Vec<usize>, Vec<usize>);

/// Partition rows into `k` folds keeping each fold's class mix close to the whole.
///
/// Rows of each class are dealt out in their original order as contiguous
/// blocks whose sizes differ by at most one.
pub fn stratified_k_fold(y: &[u8], k: usize) -> Result<Vec<Fold>, String> {
    if k < 2 {
        return Err(format!("Need at least 2 folds, got {k}"));
    }
    let mut fold_of = vec![0usize; y.len()];
    for class in [0u8, 1u8] {
        let members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == class).collect();
        if members.len() < k {
            return Err(format!(
                "Class {class} has {} rows, fewer than the {k} folds",
                members.len()
            ));
        }
        let base = members.len() / k;
        let extra = members.len() % k;
        let mut cursor = 0usize;
        for fold in 0..k {
            let size = base + usize::from(fold < extra);
            for &row in &members[cursor..cursor + size] {
                fold_of[row] = fold;
            }
            cursor += size;
        }
    }
    Ok((0..k)
        .map(|fold| {
            let (validation, train): (Vec<usize>, Vec<usize>) =
                (0..y.len()).partition(|&row| fold_of[row] == fold);
            (train, validation)
        })
        .collect())
}

/// Gather the rows at `indices`.
pub fn take_rows<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&idx| values[idx].clone()).collect()
}
