//! Linear trend of recent 1RM estimates.
//!
//! Fits an ordinary least squares line against session index and projects
//! the value for the next session.

use serde::Serialize;

use crate::formulas::round_to_precision;

/// Number of most recent estimates fed into the regression.
pub const TREND_WINDOW: usize = 5;

/// Direction of the fitted slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Trend direction plus projected 1RM for the next session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendResult {
    pub trend: Trend,
    pub next_one_rm: f64,
}

/// Returns the last `TREND_WINDOW` values, oldest first.
pub fn recent_window(history: &[f64]) -> &[f64] {
    &history[history.len().saturating_sub(TREND_WINDOW)..]
}

/// Fits a trend line over chronologically ordered estimates.
///
/// With fewer than 2 points there is no slope: the result is `Stable`
/// with the single value (or 0 for an empty sequence).
pub fn compute_trend(recent: &[f64]) -> TrendResult {
    if recent.len() < 2 {
        return TrendResult {
            trend: Trend::Stable,
            next_one_rm: recent.first().copied().unwrap_or(0.0),
        };
    }

    let n = recent.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_xx) = recent.iter().enumerate().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sxx), (i, &y)| {
            let x = i as f64;
            (sx + x, sy + y, sxy + x * y, sxx + x * x)
        },
    );

    // Denominator is non-zero for n >= 2 distinct indices
    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;

    let trend = if slope > 0.0 {
        Trend::Up
    } else if slope < 0.0 {
        Trend::Down
    } else {
        Trend::Stable
    };

    TrendResult {
        trend,
        next_one_rm: round_to_precision(slope * n + intercept),
    }
}
