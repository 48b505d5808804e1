//! Multi-class softmax gradient boosting over decision stumps.
//!
//! Each round fits one stump per class against the softmax residuals,
//! searching binned feature thresholds for the best SSE reduction. Row and
//! feature subsampling are seeded, so a given parameter set always yields
//! the same model.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;

use super::model::{GbdtFaceModel, Stump, softmax};

/// Training hyperparameters for stump boosting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GbdtParams {
    /// Number of boosting rounds.
    pub rounds: usize,
    /// Learning rate applied per round.
    pub learning_rate: f64,
    /// Number of bins used for split search.
    pub bins: usize,
    /// Fraction of rows sampled per round, in (0, 1].
    pub subsample: f64,
    /// Fraction of features considered per round, in (0, 1].
    pub colsample: f64,
    /// Minimum samples required on each side of a split.
    pub min_leaf_weight: usize,
    /// Minimum SSE reduction for a split to be kept; splits below this
    /// collapse into a constant leaf.
    pub min_split_loss: f64,
    /// Seed for row/feature sampling.
    pub seed: u64,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            rounds: 600,
            learning_rate: 0.02,
            bins: 32,
            subsample: 1.0,
            colsample: 1.0,
            min_leaf_weight: 1,
            min_split_loss: 0.0,
            seed: crate::RANDOM_SEED,
        }
    }
}

impl std::fmt::Display for GbdtParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rounds={} lr={} bins={} subsample={} colsample={} min_leaf_weight={} min_split_loss={}",
            self.rounds,
            self.learning_rate,
            self.bins,
            self.subsample,
            self.colsample,
            self.min_leaf_weight,
            self.min_split_loss
        )
    }
}

/// Train a multi-class stump-GBDT model using softmax gradient boosting.
pub fn train_gbdt(
    encodings: &[Vec<f64>],
    labels: &[usize],
    classes: &[String],
    params: &GbdtParams,
) -> Result<GbdtFaceModel, String> {
    if encodings.len() != labels.len() {
        return Err("Mismatched X/Y lengths".to_string());
    }
    if encodings.is_empty() {
        return Err("Empty training set".to_string());
    }
    let n_classes = classes.len();
    if n_classes < 2 {
        return Err("Need at least 2 classes".to_string());
    }
    if !(params.subsample > 0.0 && params.subsample <= 1.0) {
        return Err(format!("subsample {} must be in (0, 1]", params.subsample));
    }
    if !(params.colsample > 0.0 && params.colsample <= 1.0) {
        return Err(format!("colsample {} must be in (0, 1]", params.colsample));
    }

    let n = encodings.len();
    let dim = encodings[0].len();
    if encodings.iter().any(|row| row.len() != dim) {
        return Err("Inconsistent encoding dimensions".to_string());
    }

    let (mins, maxs) = compute_feature_min_max(encodings, dim);
    let binned = bin_features(encodings, &mins, &maxs, params.bins);

    let priors = class_priors(labels, n_classes);
    let init_raw: Vec<f64> = priors.iter().map(|&p| (p.max(1e-6)).ln()).collect();
    let mut raw = vec![init_raw.clone(); n];

    let mut rng = StdRng::seed_from_u64(params.seed);
    let row_sample_n = ((n as f64) * params.subsample).floor().max(1.0) as usize;
    let feature_sample_n = ((dim as f64) * params.colsample).floor().max(1.0) as usize;

    let mut rounds_out: Vec<Vec<Stump>> = Vec::with_capacity(params.rounds);
    for _round in 0..params.rounds {
        let rows: Vec<usize> = if row_sample_n < n {
            let mut sampled = sample(&mut rng, n, row_sample_n).into_vec();
            sampled.sort_unstable();
            sampled
        } else {
            (0..n).collect()
        };
        let features: Vec<usize> = if feature_sample_n < dim {
            let mut sampled = sample(&mut rng, dim, feature_sample_n).into_vec();
            sampled.sort_unstable();
            sampled
        } else {
            (0..dim).collect()
        };

        let probs: Vec<Vec<f64>> = raw.iter().map(|r| softmax(r)).collect();

        let mut stumps_for_round = Vec::with_capacity(n_classes);
        for class_idx in 0..n_classes {
            let residuals: Vec<f64> = rows
                .iter()
                .map(|&i| {
                    let target = if labels[i] == class_idx { 1.0 } else { 0.0 };
                    target - probs[i][class_idx]
                })
                .collect();

            let stump = fit_best_stump(
                &binned,
                encodings,
                &mins,
                &maxs,
                &rows,
                &features,
                &residuals,
                params,
            );
            for (i, row_raw) in raw.iter_mut().enumerate() {
                row_raw[class_idx] += params.learning_rate * stump.predict(&encodings[i]);
            }
            stumps_for_round.push(stump);
        }
        rounds_out.push(stumps_for_round);
    }

    Ok(GbdtFaceModel {
        model_version: 1,
        encoding_dim: dim,
        classes: classes.to_vec(),
        learning_rate: params.learning_rate,
        init_raw,
        stumps: rounds_out,
    })
}

fn class_priors(labels: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for &label in labels {
        if label < n_classes {
            counts[label] += 1;
        }
    }
    let total = labels.len().max(1) as f64;
    counts.into_iter().map(|c| c as f64 / total).collect()
}

fn compute_feature_min_max(encodings: &[Vec<f64>], dim: usize) -> (Vec<f64>, Vec<f64>) {
    let mut mins = vec![f64::INFINITY; dim];
    let mut maxs = vec![f64::NEG_INFINITY; dim];
    for row in encodings {
        for (j, &v) in row.iter().take(dim).enumerate() {
            if v.is_finite() {
                mins[j] = mins[j].min(v);
                maxs[j] = maxs[j].max(v);
            }
        }
    }
    for j in 0..dim {
        if !mins[j].is_finite() || !maxs[j].is_finite() {
            mins[j] = 0.0;
            maxs[j] = 0.0;
        }
        if mins[j] == maxs[j] {
            maxs[j] = mins[j] + 1.0;
        }
    }
    (mins, maxs)
}

fn bin_features(encodings: &[Vec<f64>], mins: &[f64], maxs: &[f64], bins: usize) -> Vec<Vec<u8>> {
    let bins = bins.clamp(2, 256) as f64;
    let mut out: Vec<Vec<u8>> = Vec::with_capacity(encodings.len());
    for row in encodings {
        let mut binned = Vec::with_capacity(mins.len());
        for (j, &min) in mins.iter().enumerate() {
            let max = maxs[j];
            let v = row.get(j).copied().unwrap_or(0.0);
            let t = if max > min {
                ((v - min) / (max - min)).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let b = (t * (bins - 1.0)).round() as u8;
            binned.push(b);
        }
        out.push(binned);
    }
    out
}

/// Constant stump used when no split clears the gain/leaf-weight gates.
fn constant_stump(value: f64) -> Stump {
    Stump {
        feature_index: 0,
        threshold: f64::INFINITY,
        left_value: value,
        right_value: value,
    }
}

#[allow(clippy::too_many_arguments)]
fn fit_best_stump(
    binned: &[Vec<u8>],
    encodings: &[Vec<f64>],
    mins: &[f64],
    maxs: &[f64],
    rows: &[usize],
    features: &[usize],
    residuals: &[f64],
    params: &GbdtParams,
) -> Stump {
    let bins = params.bins.clamp(2, 256);

    let mut best = BestSplit::default();
    for &feature_idx in features {
        let split = best_split_for_feature(
            binned,
            residuals,
            rows,
            feature_idx,
            bins,
            params.min_leaf_weight,
        );
        if split.score < best.score {
            best = split;
        }
    }

    let mean = residuals.iter().sum::<f64>() / residuals.len().max(1) as f64;
    if !best.score.is_finite() {
        return constant_stump(mean);
    }

    // Gate on SSE reduction relative to the unsplit node.
    let sum: f64 = residuals.iter().sum();
    let sum_sq: f64 = residuals.iter().map(|r| r * r).sum();
    let parent_sse = sum_sq - sum * sum / residuals.len().max(1) as f64;
    if parent_sse - best.score < params.min_split_loss {
        return constant_stump(mean);
    }

    let feature_idx = best.feature_index;
    let threshold = threshold_for_bin(mins[feature_idx], maxs[feature_idx], best.split_bin, bins);
    let (left_value, right_value) =
        leaf_means_for_threshold(encodings, residuals, rows, feature_idx, threshold);
    Stump {
        feature_index: feature_idx as u16,
        threshold,
        left_value,
        right_value,
    }
}

#[derive(Debug, Clone)]
struct BestSplit {
    score: f64,
    feature_index: usize,
    split_bin: usize,
}

impl Default for BestSplit {
    fn default() -> Self {
        Self {
            score: f64::INFINITY,
            feature_index: 0,
            split_bin: 0,
        }
    }
}

fn best_split_for_feature(
    binned: &[Vec<u8>],
    residuals: &[f64],
    rows: &[usize],
    feature_idx: usize,
    bins: usize,
    min_leaf_weight: usize,
) -> BestSplit {
    let mut counts = vec![0u32; bins];
    let mut sums = vec![0f64; bins];
    let mut sums_sq = vec![0f64; bins];
    for (pos, &row_idx) in rows.iter().enumerate() {
        let b = binned[row_idx].get(feature_idx).copied().unwrap_or(0) as usize;
        let r = residuals[pos];
        counts[b] += 1;
        sums[b] += r;
        sums_sq[b] += r * r;
    }
    let total_count: u32 = counts.iter().sum();
    if total_count == 0 {
        return BestSplit::default();
    }
    let total_sum: f64 = sums.iter().sum();
    let total_sum_sq: f64 = sums_sq.iter().sum();
    let min_leaf = min_leaf_weight.max(1) as u32;

    let mut best_score = f64::INFINITY;
    let mut best_bin = 0usize;
    let mut found = false;

    let mut left_count = 0u32;
    let mut left_sum = 0f64;
    let mut left_sum_sq = 0f64;

    for split_bin in 0..(bins - 1) {
        left_count += counts[split_bin];
        left_sum += sums[split_bin];
        left_sum_sq += sums_sq[split_bin];
        let right_count = total_count - left_count;
        if left_count < min_leaf || right_count < min_leaf {
            continue;
        }
        let right_sum = total_sum - left_sum;
        let right_sum_sq = total_sum_sq - left_sum_sq;
        let left_sse = left_sum_sq - (left_sum * left_sum) / left_count as f64;
        let right_sse = right_sum_sq - (right_sum * right_sum) / right_count as f64;
        let score = left_sse + right_sse;
        if score < best_score {
            best_score = score;
            best_bin = split_bin;
            found = true;
        }
    }

    if !found {
        return BestSplit::default();
    }
    BestSplit {
        score: best_score,
        feature_index: feature_idx,
        split_bin: best_bin,
    }
}

fn threshold_for_bin(min: f64, max: f64, split_bin: usize, bins: usize) -> f64 {
    let bins_f = bins as f64;
    let t = ((split_bin + 1) as f64) / bins_f;
    min + t * (max - min)
}

fn leaf_means_for_threshold(
    encodings: &[Vec<f64>],
    residuals: &[f64],
    rows: &[usize],
    feature_idx: usize,
    threshold: f64,
) -> (f64, f64) {
    let mut left_sum = 0.0f64;
    let mut left_count = 0u32;
    let mut right_sum = 0.0f64;
    let mut right_count = 0u32;
    for (pos, &row_idx) in rows.iter().enumerate() {
        let v = encodings[row_idx].get(feature_idx).copied().unwrap_or(0.0);
        if v <= threshold {
            left_sum += residuals[pos];
            left_count += 1;
        } else {
            right_sum += residuals[pos];
            right_count += 1;
        }
    }
    let left_mean = if left_count == 0 {
        0.0
    } else {
        left_sum / left_count as f64
    };
    let right_mean = if right_count == 0 {
        0.0
    } else {
        right_sum / right_count as f64
    };
    (left_mean, right_mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two separable clusters along feature 0, a third along feature 1.
    fn clustered_data() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..12 {
            let jitter = (i as f64) * 0.01;
            x.push(vec![3.0 + jitter, 0.0, jitter]);
            y.push(0);
            x.push(vec![-3.0 - jitter, 0.0, -jitter]);
            y.push(1);
            x.push(vec![0.0, 3.0 + jitter, jitter]);
            y.push(2);
        }
        let classes = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
        (x, y, classes)
    }

    fn small_params() -> GbdtParams {
        GbdtParams {
            rounds: 40,
            learning_rate: 0.3,
            bins: 16,
            ..GbdtParams::default()
        }
    }

    #[test]
    fn boosting_separates_clusters() {
        let (x, y, classes) = clustered_data();
        let model = train_gbdt(&x, &y, &classes, &small_params()).unwrap();
        model.validate().unwrap();
        let correct = model
            .predict(&x)
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| p == t)
            .count();
        assert!(correct as f64 / y.len() as f64 > 0.95);
    }

    #[test]
    fn subsampling_is_deterministic_per_seed() {
        let (x, y, classes) = clustered_data();
        let params = GbdtParams {
            subsample: 0.8,
            colsample: 0.7,
            seed: 42,
            ..small_params()
        };
        let a = train_gbdt(&x, &y, &classes, &params).unwrap();
        let b = train_gbdt(&x, &y, &classes, &params).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );

        let other_seed = GbdtParams {
            seed: 43,
            ..params
        };
        let c = train_gbdt(&x, &y, &classes, &other_seed).unwrap();
        assert_ne!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&c).unwrap()
        );
    }

    #[test]
    fn subsampled_training_still_learns() {
        let (x, y, classes) = clustered_data();
        let params = GbdtParams {
            subsample: 0.6,
            colsample: 0.6,
            min_leaf_weight: 2,
            ..small_params()
        };
        let model = train_gbdt(&x, &y, &classes, &params).unwrap();
        let correct = model
            .predict(&x)
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| p == t)
            .count();
        assert!(correct as f64 / y.len() as f64 > 0.9);
    }

    #[test]
    fn huge_split_loss_gate_collapses_to_priors() {
        let (x, y, classes) = clustered_data();
        let params = GbdtParams {
            min_split_loss: 1e12,
            ..small_params()
        };
        let model = train_gbdt(&x, &y, &classes, &params).unwrap();
        for round in &model.stumps {
            for stump in round {
                assert_eq!(stump.left_value, stump.right_value);
            }
        }
    }

    #[test]
    fn rejects_invalid_fractions() {
        let (x, y, classes) = clustered_data();
        let params = GbdtParams {
            subsample: 0.0,
            ..small_params()
        };
        assert!(train_gbdt(&x, &y, &classes, &params).is_err());
        let params = GbdtParams {
            colsample: 1.5,
            ..small_params()
        };
        assert!(train_gbdt(&x, &y, &classes, &params).is_err());
    }
}
