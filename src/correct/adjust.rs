//! Adjusted p-value (q-value) computation.
//!
//! All three procedures return q-values in the caller's original order and
//! cap at 1.0. Inputs are assumed validated (finite, in [0, 1]); the planner
//! rejects anything else before calling in here.

/// Bonferroni family-wise correction: q[i] = min(1, p[i] * n).
pub fn bonferroni(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len() as f64;
    p_values.iter().map(|&p| (p * n).min(1.0)).collect()
}

/// Benjamini-Hochberg step-up FDR correction.
///
/// For rank k (ascending p-values), the adjusted value is
/// `min over j >= k of min(1, p_(j) * n / j)`, enforced by a running
/// minimum from the largest rank down.
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    step_up(p_values, p_values.len() as f64)
}

/// Benjamini-Yekutieli step-up FDR correction.
///
/// Identical to Benjamini-Hochberg except the correction factor is
/// `n * H(n)` (H the harmonic sum), which makes it valid under arbitrary
/// dependence between the tests.
pub fn benjamini_yekutieli(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len();
    let harmonic: f64 = (1..=n).map(|i| 1.0 / i as f64).sum();
    step_up(p_values, n as f64 * harmonic)
}

/// Shared step-up core: q_(k) = min over j >= k of min(1, p_(j) * factor / j).
fn step_up(p_values: &[f64], factor: f64) -> Vec<f64> {
    let n = p_values.len();
    if n == 0 {
        return vec![];
    }

    // Sort indices by ascending p-value
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Running minimum from the largest rank down
    let mut q_values = vec![0.0; n];
    let mut cummin = 1.0_f64;
    for (i, &orig_idx) in indices.iter().enumerate().rev() {
        let rank = (i + 1) as f64;
        let adjusted = (p_values[orig_idx] * factor / rank).min(1.0);
        cummin = cummin.min(adjusted);
        q_values[orig_idx] = cummin;
    }

    q_values
}
