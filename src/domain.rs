//! Domain types for workout records and exercise parameters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ParseError;
use crate::formulas::estimate_one_rep_max;
use crate::trend::recent_window;

/// Exercise name reserved for bodyweight entries in the log.
pub const BODYWEIGHT: &str = "bodyweight";

/// Equipment an exercise is performed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Equipment {
    Barbell,
    Dumbbell,
    Machine,
    Cable,
    Kettlebell,
    Bodyweight,
}

impl Equipment {
    /// Returns all equipment variants.
    pub fn all() -> &'static [Equipment] {
        &[
            Equipment::Barbell,
            Equipment::Dumbbell,
            Equipment::Machine,
            Equipment::Cable,
            Equipment::Kettlebell,
            Equipment::Bodyweight,
        ]
    }

    /// Returns the display name for the equipment.
    pub fn display_name(&self) -> &'static str {
        match self {
            Equipment::Barbell => "Barbell",
            Equipment::Dumbbell => "Dumbbell",
            Equipment::Machine => "Machine",
            Equipment::Cable => "Cable",
            Equipment::Kettlebell => "Kettlebell",
            Equipment::Bodyweight => "Bodyweight",
        }
    }
}

impl FromStr for Equipment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "barbell" | "bb" => Ok(Equipment::Barbell),
            "dumbbell" | "db" => Ok(Equipment::Dumbbell),
            "machine" => Ok(Equipment::Machine),
            "cable" => Ok(Equipment::Cable),
            "kettlebell" | "kb" => Ok(Equipment::Kettlebell),
            "bodyweight" | "bw" => Ok(Equipment::Bodyweight),
            _ => Err(ParseError::UnknownEquipment {
                row: 0,
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Equipment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Minimum loadable weight per equipment kind.
///
/// Injected into parameter construction so the estimation engine only ever
/// sees an opaque floor.
#[derive(Debug, Clone)]
pub struct EquipmentWeights {
    minimums: HashMap<Equipment, f64>,
}

impl Default for EquipmentWeights {
    fn default() -> Self {
        Self {
            minimums: HashMap::from([
                (Equipment::Barbell, 20.0),
                (Equipment::Dumbbell, 2.0),
                (Equipment::Machine, 5.0),
                (Equipment::Cable, 2.5),
                (Equipment::Kettlebell, 4.0),
                (Equipment::Bodyweight, 0.0),
            ]),
        }
    }
}

impl EquipmentWeights {
    /// Overrides the minimum weight for one equipment kind.
    pub fn with_minimum(mut self, equipment: Equipment, weight_kg: f64) -> Self {
        self.minimums.insert(equipment, weight_kg);
        self
    }

    /// Returns the minimum weight for an equipment kind (0 if unmapped).
    pub fn minimum_for(&self, equipment: Equipment) -> f64 {
        self.minimums.get(&equipment).copied().unwrap_or(0.0)
    }
}

/// One exercise performance event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetPerformance {
    #[serde(alias = "weight")]
    pub weight_kg: f64,
    pub target_reps: u32,
    pub completed_sets: u32,
    /// Reps managed on an extra, failed set (0 if none).
    #[serde(default)]
    pub failed_rep: u32,
}

/// Inclusive integer range with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Returns true if `min <= max` and `min >= 1`.
    pub fn is_valid(&self) -> bool {
        self.min >= 1 && self.min <= self.max
    }
}

/// Search bounds for next-workout suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExerciseParameters {
    pub sets_range: CountRange,
    pub reps_range: CountRange,
    pub weight_increment: f64,
    pub minimum_weight: f64,
}

/// An exercise from the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub name: String,
    pub equipment: Equipment,
    pub sets_range: CountRange,
    pub reps_range: CountRange,
    pub weight_increment: f64,
    /// User-supplied floor, overrides the equipment table.
    pub custom_minimum_weight: Option<f64>,
    pub workout_day: Option<String>,
    /// Display order within the workout day.
    pub position: usize,
}

impl Exercise {
    /// Creates an exercise with default ranges (3-5 sets, 8-12 reps, 2.5kg steps).
    pub fn new(name: &str, equipment: Equipment) -> Self {
        Self {
            name: normalize_name(name),
            equipment,
            sets_range: CountRange::new(3, 5),
            reps_range: CountRange::new(8, 12),
            weight_increment: 2.5,
            custom_minimum_weight: None,
            workout_day: None,
            position: 0,
        }
    }

    /// Builds suggestion parameters, resolving the minimum weight.
    pub fn parameters(&self, weights: &EquipmentWeights) -> ExerciseParameters {
        ExerciseParameters {
            sets_range: self.sets_range,
            reps_range: self.reps_range,
            weight_increment: self.weight_increment,
            minimum_weight: self
                .custom_minimum_weight
                .unwrap_or_else(|| weights.minimum_for(self.equipment)),
        }
    }
}

/// A logged set with its stored 1RM estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct SetLog {
    pub date: NaiveDate,
    pub exercise: String,
    pub performance: SetPerformance,
    pub estimated_one_rm: f64,
}

impl SetLog {
    /// Creates a log entry, computing the estimate.
    ///
    /// Returns None if the performance has no valid estimate.
    pub fn new(date: NaiveDate, exercise: &str, performance: SetPerformance) -> Option<Self> {
        let estimated_one_rm = estimate_one_rep_max(
            performance.weight_kg,
            performance.target_reps,
            performance.completed_sets,
            performance.failed_rep,
        )
        .ok()?;

        Some(Self {
            date,
            exercise: normalize_name(exercise),
            performance,
            estimated_one_rm,
        })
    }
}

/// A bodyweight measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightLog {
    pub date: NaiveDate,
    pub weight_kg: f64,
}

/// Exercises grouped under a named training day, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutDay {
    pub name: String,
    pub exercises: Vec<String>,
}

/// Lower-cased, trimmed exercise key.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Container for all parsed training data.
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    exercises: HashMap<String, Exercise>,
    logs: HashMap<String, Vec<SetLog>>,
    bodyweight: Vec<WeightLog>,
}

impl TrainingData {
    /// Creates TrainingData from catalogue entries and raw logs.
    ///
    /// Logs are sorted by date per exercise. Exercises that only appear in
    /// the log are added to the catalogue with default parameters.
    pub fn new(
        exercises: Vec<Exercise>,
        logs: Vec<SetLog>,
        mut bodyweight: Vec<WeightLog>,
    ) -> Self {
        let mut catalogue: HashMap<String, Exercise> = exercises
            .into_iter()
            .map(|e| (e.name.clone(), e))
            .collect();

        let mut by_exercise: HashMap<String, Vec<SetLog>> = HashMap::new();
        for log in logs {
            catalogue
                .entry(log.exercise.clone())
                .or_insert_with(|| Exercise::new(&log.exercise, Equipment::Barbell));
            by_exercise.entry(log.exercise.clone()).or_default().push(log);
        }

        for entries in by_exercise.values_mut() {
            entries.sort_by_key(|l| l.date);
        }

        bodyweight.sort_by_key(|w| w.date);

        Self {
            exercises: catalogue,
            logs: by_exercise,
            bodyweight,
        }
    }

    /// Returns an exercise by name (case-insensitive).
    pub fn exercise(&self, name: &str) -> Option<&Exercise> {
        self.exercises.get(&normalize_name(name))
    }

    /// Returns all exercises sorted by name.
    pub fn exercises(&self) -> Vec<&Exercise> {
        let mut all: Vec<&Exercise> = self.exercises.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Returns the logs for an exercise, oldest first.
    pub fn logs(&self, name: &str) -> &[SetLog] {
        self.logs
            .get(&normalize_name(name))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the number of logged sets for an exercise.
    pub fn count(&self, name: &str) -> usize {
        self.logs(name).len()
    }

    /// Returns the total number of logged sets across all exercises.
    pub fn total_count(&self) -> usize {
        self.logs.values().map(|v| v.len()).sum()
    }

    /// Returns bodyweight logs, oldest first.
    pub fn bodyweight(&self) -> &[WeightLog] {
        &self.bodyweight
    }

    /// Returns the most recent stored estimates for an exercise, oldest first.
    pub fn recent_estimates(&self, name: &str) -> Vec<f64> {
        let history: Vec<f64> = self
            .logs(name)
            .iter()
            .map(|l| l.estimated_one_rm)
            .collect();
        recent_window(&history).to_vec()
    }

    /// Returns the date range across all logs and bodyweight entries.
    pub fn overall_date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self
            .logs
            .values()
            .flatten()
            .map(|l| l.date)
            .chain(self.bodyweight.iter().map(|w| w.date));

        let mut min_date: Option<NaiveDate> = None;
        let mut max_date: Option<NaiveDate> = None;
        for date in dates {
            min_date = Some(min_date.map_or(date, |d| d.min(date)));
            max_date = Some(max_date.map_or(date, |d| d.max(date)));
        }

        min_date.zip(max_date)
    }

    /// Groups exercises into workout days, ordered by day name then position.
    ///
    /// Exercises without a day are not listed.
    pub fn workout_days(&self) -> Vec<WorkoutDay> {
        let mut days: HashMap<&str, Vec<&Exercise>> = HashMap::new();
        for exercise in self.exercises.values() {
            if let Some(day) = exercise.workout_day.as_deref() {
                days.entry(day).or_default().push(exercise);
            }
        }

        let mut result: Vec<WorkoutDay> = days
            .into_iter()
            .map(|(name, mut exercises)| {
                exercises.sort_by(|a, b| a.position.cmp(&b.position).then(a.name.cmp(&b.name)));
                WorkoutDay {
                    name: name.to_string(),
                    exercises: exercises.iter().map(|e| e.name.clone()).collect(),
                }
            })
            .collect();

        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }
}
