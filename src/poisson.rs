use crate::factorial::Factorial;

/// Probability of exactly `k` events for a Poisson rate `lambda`. A non-positive rate assigns no
/// probability to any count.
#[inline]
pub fn univariate(k: u8, lambda: f64, factorial: &impl Factorial) -> f64 {
    if lambda.is_nan() || lambda <= 0.0 {
        return 0.0;
    }
    lambda.powi(k as i32) * f64::exp(-lambda) / factorial.get(k)
}

/// Natural log of [`univariate`]; negative infinity for a non-positive rate.
#[inline]
pub fn log_univariate(k: u8, lambda: f64, factorial: &impl Factorial) -> f64 {
    if lambda.is_nan() || lambda <= 0.0 {
        return f64::NEG_INFINITY;
    }
    k as f64 * lambda.ln() - lambda - factorial.get(k).ln()
}

/// Probabilities of `0..=max_k` events.
pub fn pmf(lambda: f64, max_k: u8, factorial: &impl Factorial) -> Vec<f64> {
    (0..=max_k).map(|k| univariate(k, lambda, factorial)).collect()
}

/// Weights of `0..=max_k` events proportional to their probabilities, scaled so that the likeliest
/// count has weight 1. Unlike [`pmf`], the weights do not vanish when every retained count is
/// individually improbable. A non-positive rate gives all zeros.
pub fn scaled_pmf(lambda: f64, max_k: u8, factorial: &impl Factorial) -> Vec<f64> {
    let logs: Vec<_> = (0..=max_k).map(|k| log_univariate(k, lambda, factorial)).collect();
    let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![0.0; logs.len()];
    }
    logs.into_iter().map(|log| (log - max).exp()).collect()
}
