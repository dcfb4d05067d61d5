//! Residual autocorrelation diagnostics
//!
//! Pure functions over ordered residual sequences. The Durbin-Watson
//! statistic is `Σ(e_t − e_{t−1})²` over `t = 2..n` divided by `Σ e_t²` over
//! the whole series, so a constant series yields exactly 0 and a strictly
//! alternating one approaches 4 as it grows.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{ResilienceError, Result};

/// Classification of a Durbin-Watson statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Autocorrelation {
    /// Statistic below the lower bound
    Positive,
    /// Statistic within the bounds
    None,
    /// Statistic above the upper bound
    Negative,
}

impl fmt::Display for Autocorrelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Positive => "positive autocorrelation",
            Self::None => "no significant autocorrelation",
            Self::Negative => "negative autocorrelation",
        };
        f.write_str(label)
    }
}

/// Decision bounds for classifying the statistic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurbinWatsonBounds {
    /// Below this, positive autocorrelation
    pub lower: f64,
    /// Above this, negative autocorrelation
    pub upper: f64,
}

impl Default for DurbinWatsonBounds {
    fn default() -> Self {
        Self {
            lower: 1.5,
            upper: 2.5,
        }
    }
}

impl DurbinWatsonBounds {
    /// Classify a statistic
    pub fn classify(&self, statistic: f64) -> Autocorrelation {
        if statistic < self.lower {
            Autocorrelation::Positive
        } else if statistic > self.upper {
            Autocorrelation::Negative
        } else {
            Autocorrelation::None
        }
    }
}

/// Durbin-Watson statistic with its classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurbinWatson {
    /// The statistic, in `[0, 4]`
    pub statistic: f64,
    /// Classification under the bounds used
    pub autocorrelation: Autocorrelation,
}

/// Durbin-Watson statistic with the default bounds
pub fn durbin_watson(residuals: &[f64]) -> Result<DurbinWatson> {
    durbin_watson_with_bounds(residuals, DurbinWatsonBounds::default())
}

/// Durbin-Watson statistic with caller-chosen bounds.
///
/// Fails with `InsufficientData` for fewer than two residuals or when every
/// residual is zero.
pub fn durbin_watson_with_bounds(
    residuals: &[f64],
    bounds: DurbinWatsonBounds,
) -> Result<DurbinWatson> {
    if residuals.len() < 2 {
        return Err(ResilienceError::insufficient_data(format!(
            "durbin-watson needs at least 2 residuals, got {}",
            residuals.len()
        )));
    }
    let numerator: f64 = residuals
        .windows(2)
        .map(|w| (w[1] - w[0]) * (w[1] - w[0]))
        .sum();
    let denominator: f64 = residuals.iter().map(|e| e * e).sum();
    if denominator == 0.0 {
        return Err(ResilienceError::insufficient_data(
            "durbin-watson denominator is zero",
        ));
    }
    let statistic = numerator / denominator;
    Ok(DurbinWatson {
        statistic,
        autocorrelation: bounds.classify(statistic),
    })
}

/// Sample autocorrelation for lags `0..=max_lag`.
///
/// Uses the biased estimator (divides every lag by the lag-0 sum), so the
/// result at lag 0 is 1. Fails with `InsufficientData` if `max_lag` is not
/// below the series length or the series has zero variance.
pub fn autocorrelation(residuals: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    let n = residuals.len();
    if n < 2 || max_lag >= n {
        return Err(ResilienceError::insufficient_data(format!(
            "autocorrelation to lag {max_lag} needs more than {max_lag} residuals, got {n}"
        )));
    }
    let mean = residuals.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = residuals.iter().map(|e| e - mean).collect();
    let c0: f64 = centered.iter().map(|e| e * e).sum();
    if c0 == 0.0 {
        return Err(ResilienceError::insufficient_data(
            "autocorrelation of a constant series is undefined",
        ));
    }
    Ok((0..=max_lag)
        .map(|lag| {
            centered
                .iter()
                .zip(&centered[lag..])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / c0
        })
        .collect())
}
