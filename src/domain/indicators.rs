//! Rolling indicators derived from a close-price series.
//!
//! These feed reward shaping and policy observations. All functions return a
//! value per input element, padding the warmup region the same way the
//! feature pipeline does: returns pad with 0.0, momentum with 1.0, rolling
//! std with 0.0.

/// Per-bar simple returns: r[i] = (p[i] - p[i-1]) / p[i-1], r[0] = 0.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(prices.len());
    for i in 0..prices.len() {
        if i == 0 || prices[i - 1] == 0.0 {
            out.push(0.0);
        } else {
            out.push((prices[i] - prices[i - 1]) / prices[i - 1]);
        }
    }
    out
}

/// Momentum ratio: m[i] = p[i] / p[i-period], 1.0 during warmup.
pub fn momentum_ratio(prices: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(prices.len());
    for i in 0..prices.len() {
        if i < period || prices[i - period] == 0.0 {
            out.push(1.0);
        } else {
            out.push(prices[i] / prices[i - period]);
        }
    }
    out
}

/// Rolling population standard deviation over a trailing window.
///
/// Each element is the std of `values[max(0, i+1-window)..=i]`, so the warmup
/// region uses the shorter prefix (one element gives 0.0).
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window);
        out.push(population_std(&values[start..=i]));
    }
    out
}

/// Population standard deviation of a slice; 0.0 for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    variance.sqrt()
}
