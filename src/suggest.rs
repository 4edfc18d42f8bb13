//! Next-workout suggestions for progressive overload.
//!
//! Searches a bounded grid of (weight, sets, reps) and keeps the
//! combinations whose estimated 1RM lands just above the current one.

use serde::Serialize;

use crate::domain::{CountRange, ExerciseParameters};
use crate::error::EstimationError;
use crate::formulas::estimate_completed;

/// Lower edge of the weight search window, relative to current 1RM.
pub const WEIGHT_WINDOW_LOW: f64 = 0.7;

/// Upper edge of the weight search window, relative to current 1RM.
pub const WEIGHT_WINDOW_HIGH: f64 = 1.3;

/// Largest accepted estimated 1RM, relative to current 1RM (5% increase).
pub const MAX_INCREASE_RATIO: f64 = 1.05;

/// Maximum number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 10;

/// Largest (weight, sets, reps) grid searched in one call.
pub const MAX_GRID_CELLS: usize = 100_000;

/// Tolerance for accumulated float error when stepping through weights.
const STEP_EPSILON: f64 = 1e-9;

/// A proposed next workout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkoutSuggestion {
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    pub estimated_one_rm: f64,
}

fn validate_range(name: &'static str, range: CountRange) -> Result<(), EstimationError> {
    if range.is_valid() {
        Ok(())
    } else {
        Err(EstimationError::InvalidRange {
            name,
            min: range.min,
            max: range.max,
        })
    }
}

fn range_len(range: CountRange) -> f64 {
    (range.max - range.min) as f64 + 1.0
}

/// Snaps a weight to the nearest multiple of `increment`.
fn snap_to_increment(weight: f64, increment: f64) -> f64 {
    (weight / increment).round() * increment
}

/// Suggests next-workout combinations that raise the estimated 1RM a little.
///
/// Weights are searched from `max(70% of current, minimum weight)` to 130%
/// of current, in steps of the weight increment. A candidate is kept when
/// `current < estimate <= current × 1.05`. Results are sorted ascending by
/// estimate and capped at `MAX_SUGGESTIONS`.
///
/// A non-positive `current_one_rm` is not an error; it simply yields no
/// suggestions.
///
/// # Errors
/// Returns `InvalidRange` for an inverted or zero-based set/rep range and
/// `InvalidIncrement` for a non-positive weight step, and `GridTooLarge`
/// when the search would visit more than `MAX_GRID_CELLS` candidates.
pub fn suggest_next_workouts(
    current_one_rm: f64,
    params: &ExerciseParameters,
) -> Result<Vec<WorkoutSuggestion>, EstimationError> {
    validate_range("sets", params.sets_range)?;
    validate_range("reps", params.reps_range)?;

    let increment = params.weight_increment;
    if !increment.is_finite() || increment <= 0.0 {
        return Err(EstimationError::InvalidIncrement(increment));
    }

    let start = (current_one_rm * WEIGHT_WINDOW_LOW).max(params.minimum_weight);
    let end = current_one_rm * WEIGHT_WINDOW_HIGH;
    let ceiling = current_one_rm * MAX_INCREASE_RATIO;

    let mut suggestions = Vec::new();

    if !(start.is_finite() && end.is_finite()) || start > end {
        return Ok(suggestions);
    }

    let steps = ((end - start) / increment + STEP_EPSILON).floor();
    let cells = (steps + 1.0) * range_len(params.sets_range) * range_len(params.reps_range);
    if cells > MAX_GRID_CELLS as f64 {
        return Err(EstimationError::GridTooLarge {
            cells,
            limit: MAX_GRID_CELLS,
        });
    }
    let steps = steps as u64;

    for step in 0..=steps {
        let weight = snap_to_increment(start + step as f64 * increment, increment);
        if weight < params.minimum_weight {
            continue;
        }

        for sets in params.sets_range.min..=params.sets_range.max {
            for reps in params.reps_range.min..=params.reps_range.max {
                let estimated_one_rm = estimate_completed(weight, reps, sets)?;

                if estimated_one_rm > current_one_rm && estimated_one_rm <= ceiling {
                    suggestions.push(WorkoutSuggestion {
                        sets,
                        reps,
                        weight,
                        estimated_one_rm,
                    });
                }
            }
        }
    }

    suggestions.sort_by(|a, b| a.estimated_one_rm.total_cmp(&b.estimated_one_rm));
    suggestions.truncate(MAX_SUGGESTIONS);

    log::debug!(
        "{} suggestions for current 1RM {:.2} ({} weight steps)",
        suggestions.len(),
        current_one_rm,
        steps + 1
    );

    Ok(suggestions)
}
