//! Analysis orchestration for training data.
//!
//! Combines stored 1RM history with the trend fit and the suggestion search
//! to produce the per-exercise view shown before a session.

use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::domain::{EquipmentWeights, Exercise, SetLog, TrainingData, WeightLog};
use crate::suggest::{WorkoutSuggestion, suggest_next_workouts};
use crate::trend::{TrendResult, compute_trend, recent_window};

/// Caller-side defaults for the estimation engine.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// 1RM assumed for an exercise with no logged history.
    pub default_one_rm: f64,
    /// Minimum weights per equipment kind.
    pub equipment_weights: EquipmentWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_one_rm: 20.0,
            equipment_weights: EquipmentWeights::default(),
        }
    }
}

/// Analysis results for a single exercise.
#[derive(Debug, Clone)]
pub struct ExerciseAnalysis {
    pub exercise: Exercise,
    pub trend: TrendResult,
    /// 1RM fed into the suggestion search.
    pub current_one_rm: f64,
    /// True when `current_one_rm` is the configured default.
    pub uses_default: bool,
    pub suggestions: Vec<WorkoutSuggestion>,
    /// Set when the exercise parameters are malformed.
    pub suggestion_error: Option<String>,
    pub last_session: Option<NaiveDate>,
    pub logs: Vec<SetLog>,
}

impl ExerciseAnalysis {
    /// Returns true if the exercise has any logged sets.
    pub fn has_history(&self) -> bool {
        !self.logs.is_empty()
    }

    /// Returns the most recent logged set.
    pub fn latest_log(&self) -> Option<&SetLog> {
        self.logs.last()
    }
}

/// Analyzes a single exercise.
pub fn analyze_exercise(
    exercise: &Exercise,
    logs: &[SetLog],
    config: &AnalysisConfig,
) -> ExerciseAnalysis {
    let history: Vec<f64> = logs.iter().map(|l| l.estimated_one_rm).collect();
    let trend = compute_trend(recent_window(&history));

    let uses_default = history.is_empty();
    let current_one_rm = if uses_default {
        config.default_one_rm
    } else {
        trend.next_one_rm
    };

    let params = exercise.parameters(&config.equipment_weights);
    let (suggestions, suggestion_error) = match suggest_next_workouts(current_one_rm, &params) {
        Ok(s) => (s, None),
        Err(e) => {
            log::warn!("Cannot suggest workouts for {}: {}", exercise.name, e);
            (Vec::new(), Some(e.to_string()))
        }
    };

    ExerciseAnalysis {
        exercise: exercise.clone(),
        trend,
        current_one_rm,
        uses_default,
        suggestions,
        suggestion_error,
        last_session: logs.last().map(|l| l.date),
        logs: logs.to_vec(),
    }
}

/// Analyzes all exercises in training data.
///
/// Exercises are independent, so they are processed in parallel via rayon.
pub fn analyze_training_data(
    data: &TrainingData,
    config: &AnalysisConfig,
) -> HashMap<String, ExerciseAnalysis> {
    data.exercises()
        .par_iter()
        .map(|exercise| {
            let analysis = analyze_exercise(exercise, data.logs(&exercise.name), config);
            (exercise.name.clone(), analysis)
        })
        .collect()
}

/// Bodyweight history with its trend.
#[derive(Debug, Clone)]
pub struct BodyweightAnalysis {
    pub logs: Vec<WeightLog>,
    pub trend: TrendResult,
}

/// Fits the recent bodyweight trend.
pub fn analyze_bodyweight(logs: &[WeightLog]) -> BodyweightAnalysis {
    let weights: Vec<f64> = logs.iter().map(|w| w.weight_kg).collect();

    BodyweightAnalysis {
        logs: logs.to_vec(),
        trend: compute_trend(recent_window(&weights)),
    }
}
