//! Estimated one-rep-max formula for logged sets.

use crate::error::EstimationError;

/// Capacity added per target rep, as a fraction of the working weight.
pub const REP_FACTOR: f64 = 0.025;

/// Capacity added per completed set beyond the first.
pub const SET_FACTOR: f64 = 0.025;

/// Decimal places kept on every stored estimate.
pub const ESTIMATE_DECIMALS: i32 = 2;

/// Rounds a value to `ESTIMATE_DECIMALS` places.
pub fn round_to_precision(value: f64) -> f64 {
    let scale = 10f64.powi(ESTIMATE_DECIMALS);
    (value * scale).round() / scale
}

/// Estimate assuming `sets` full sets of `reps` at `weight_kg`.
fn full_sets_estimate(weight_kg: f64, reps: u32, sets: f64) -> f64 {
    weight_kg * (1.0 + REP_FACTOR * reps as f64) * (1.0 + SET_FACTOR * (sets - 1.0))
}

/// Calculates an estimated 1RM from a set profile.
///
/// Formula:
/// ```text
/// C = w × (1 + 0.025 × reps) × (1 + 0.025 × (sets - 1))
/// ```
///
/// When the lifter attempted one more set and failed after `failed_rep`
/// reps, the estimate is interpolated toward the value of one more
/// completed set:
/// ```text
/// F = w × (1 + 0.025 × reps) × (1 + 0.025 × sets)
/// estimate = C + (failed_rep / reps) × (F - C)
/// ```
///
/// # Arguments
/// * `weight_kg` - Working weight
/// * `target_reps` - Reps per set, must be positive
/// * `completed_sets` - Fully completed sets
/// * `failed_rep` - Reps managed on the failed extra set (0 if none)
///
/// # Returns
/// Estimated 1RM in the unit of `weight_kg`, rounded to 2 decimals.
pub fn estimate_one_rep_max(
    weight_kg: f64,
    target_reps: u32,
    completed_sets: u32,
    failed_rep: u32,
) -> Result<f64, EstimationError> {
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        return Err(EstimationError::InvalidWeight(weight_kg));
    }

    if target_reps == 0 {
        return Err(EstimationError::InvalidReps(target_reps));
    }

    let sets = completed_sets as f64;
    let completed = full_sets_estimate(weight_kg, target_reps, sets);

    if failed_rep == 0 {
        return Ok(round_to_precision(completed));
    }

    let one_more = full_sets_estimate(weight_kg, target_reps, sets + 1.0);
    let fraction = failed_rep as f64 / target_reps as f64;

    Ok(round_to_precision(
        completed + fraction * (one_more - completed),
    ))
}

/// Estimate for a set profile with no failed attempt.
pub fn estimate_completed(
    weight_kg: f64,
    target_reps: u32,
    completed_sets: u32,
) -> Result<f64, EstimationError> {
    estimate_one_rep_max(weight_kg, target_reps, completed_sets, 0)
}
