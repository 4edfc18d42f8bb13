//! Excel workbook storage for workout logs and the exercise catalogue.
//!
//! The first sheet is the log (`Date, Exercise, Weight, Repetitions, Sets,
//! Failed`). An optional sheet named `Exercises` holds per-exercise
//! parameters and workout-day grouping.

use calamine::{Data, DataType, Range, Reader, Xlsx, open_workbook};
use chrono::{Days, NaiveDate};
use log::warn;
use std::path::Path;
use std::str::FromStr;
use umya_spreadsheet::Worksheet;

use crate::domain::{
    BODYWEIGHT, CountRange, Equipment, Exercise, SetLog, SetPerformance, TrainingData, WeightLog,
    normalize_name,
};
use crate::error::{ParseError, WorkbookError};

/// Expected log column names (case-insensitive).
const COL_DATE: &str = "date";
const COL_EXERCISE: &str = "exercise";
const COL_WEIGHT: &str = "weight";
const COL_REPS: &str = "repetitions";
const COL_SETS: &str = "sets";
const COL_FAILED: &str = "failed";

/// Name of the optional catalogue sheet.
const EXERCISES_SHEET: &str = "exercises";

/// Finds a column by name in a header row.
fn find_column(header: &[Data], name: &str) -> Option<usize> {
    header.iter().position(|cell| {
        cell.get_string()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(name))
    })
}

fn require_column(header: &[Data], name: &str) -> Result<usize, ParseError> {
    find_column(header, name).ok_or_else(|| ParseError::MissingColumn(name.to_string()))
}

/// Column indices of the log sheet.
struct LogColumns {
    date: usize,
    exercise: usize,
    weight: usize,
    reps: usize,
    sets: Option<usize>,
    failed: Option<usize>,
}

impl LogColumns {
    fn from_header(header: &[Data]) -> Result<Self, ParseError> {
        Ok(Self {
            date: require_column(header, COL_DATE)?,
            exercise: require_column(header, COL_EXERCISE)?,
            weight: require_column(header, COL_WEIGHT)?,
            reps: require_column(header, COL_REPS)?,
            sets: find_column(header, COL_SETS),
            failed: find_column(header, COL_FAILED),
        })
    }
}

/// Column indices of the exercise catalogue sheet.
struct ExerciseColumns {
    name: usize,
    equipment: usize,
    day: Option<usize>,
    sets_min: Option<usize>,
    sets_max: Option<usize>,
    reps_min: Option<usize>,
    reps_max: Option<usize>,
    increment: Option<usize>,
    minimum: Option<usize>,
}

impl ExerciseColumns {
    fn from_header(header: &[Data]) -> Result<Self, ParseError> {
        Ok(Self {
            name: require_column(header, "name")?,
            equipment: require_column(header, "equipment")?,
            day: find_column(header, "day"),
            sets_min: find_column(header, "sets min"),
            sets_max: find_column(header, "sets max"),
            reps_min: find_column(header, "reps min"),
            reps_max: find_column(header, "reps max"),
            increment: find_column(header, "increment"),
            minimum: find_column(header, "minimum"),
        })
    }
}

/// Loads all training data from an Excel file.
///
/// # Arguments
/// * `path` - Path to the Excel file (.xlsx)
///
/// # Returns
/// TrainingData with the catalogue, set logs and bodyweight logs.
///
/// # Errors
/// Returns ParseError if the file cannot be read or has invalid format.
/// Individual malformed rows are skipped with a warning.
pub fn load_training_data<P: AsRef<Path>>(path: P) -> Result<TrainingData, ParseError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ParseError::FileNotFound(path.display().to_string()));
    }

    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| ParseError::CannotRead(format!("{}: {}", path.display(), e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let log_sheet = sheet_names
        .first()
        .ok_or_else(|| ParseError::InvalidFormat("workbook has no sheets".to_string()))?;

    let range = workbook.worksheet_range(log_sheet).map_err(|e| {
        ParseError::CannotRead(format!("cannot read sheet '{}': {}", log_sheet, e))
    })?;
    let (logs, bodyweight) = parse_log_sheet(&range)?;

    let exercises = match sheet_names
        .iter()
        .skip(1)
        .find(|name| name.trim().eq_ignore_ascii_case(EXERCISES_SHEET))
    {
        Some(name) => {
            let range = workbook.worksheet_range(name).map_err(|e| {
                ParseError::CannotRead(format!("cannot read sheet '{}': {}", name, e))
            })?;
            parse_exercise_sheet(&range)?
        }
        None => Vec::new(),
    };

    Ok(TrainingData::new(exercises, logs, bodyweight))
}

/// Parses set logs and bodyweight logs from the log sheet.
fn parse_log_sheet(range: &Range<Data>) -> Result<(Vec<SetLog>, Vec<WeightLog>), ParseError> {
    let mut rows = range.rows();

    let header = rows
        .next()
        .ok_or_else(|| ParseError::InvalidFormat("empty worksheet".to_string()))?;
    let columns = LogColumns::from_header(header)?;

    let mut logs = Vec::new();
    let mut bodyweight = Vec::new();

    for (row_idx, row) in rows.enumerate() {
        let row_num = row_idx + 2; // +1 for 0-index, +1 for header row

        // Skip empty rows silently (common at end of spreadsheets)
        if row[columns.date] == Data::Empty {
            continue;
        }

        match parse_log_row(row, &columns, row_num) {
            Ok(LogRow::Set(log)) => logs.push(log),
            Ok(LogRow::Bodyweight(entry)) => bodyweight.push(entry),
            Err(e) => warn!("{}", e),
        }
    }

    Ok((logs, bodyweight))
}

enum LogRow {
    Set(SetLog),
    Bodyweight(WeightLog),
}

fn parse_log_row(
    row: &[Data],
    columns: &LogColumns,
    row_num: usize,
) -> Result<LogRow, ParseError> {
    let date = parse_date(&row[columns.date], row_num)?;
    let exercise = parse_exercise_name(&row[columns.exercise], row_num)?;

    if exercise == BODYWEIGHT {
        let weight_kg = parse_weight(&row[columns.weight], row_num)?;
        return Ok(LogRow::Bodyweight(WeightLog { date, weight_kg }));
    }

    // Zero is a valid load for bodyweight movements
    let weight_kg = parse_non_negative(&row[columns.weight], row_num)?;

    let target_reps = match parse_count(&row[columns.reps], row_num, 1) {
        Ok(reps) if reps > 0 => reps,
        _ => {
            return Err(ParseError::InvalidReps {
                row: row_num,
                value: cell_text(&row[columns.reps]),
            });
        }
    };

    let completed_sets = match columns.sets {
        Some(col) => parse_count(&row[col], row_num, 1)?,
        None => 1,
    };

    let failed_rep = match columns.failed {
        Some(col) => parse_count(&row[col], row_num, 0)?,
        None => 0,
    };

    let performance = SetPerformance {
        weight_kg,
        target_reps,
        completed_sets,
        failed_rep,
    };

    SetLog::new(date, &exercise, performance)
        .map(LogRow::Set)
        .ok_or_else(|| ParseError::InvalidReps {
            row: row_num,
            value: target_reps.to_string(),
        })
}

/// Parses the exercise catalogue sheet, keeping row order as display order.
fn parse_exercise_sheet(range: &Range<Data>) -> Result<Vec<Exercise>, ParseError> {
    let mut rows = range.rows();

    let header = match rows.next() {
        Some(h) => h,
        None => return Ok(Vec::new()),
    };
    let columns = ExerciseColumns::from_header(header)?;

    let mut exercises = Vec::new();

    for (row_idx, row) in rows.enumerate() {
        let row_num = row_idx + 2;

        if row[columns.name] == Data::Empty {
            continue;
        }

        match parse_exercise_row(row, &columns, row_num) {
            Ok(mut exercise) => {
                exercise.position = exercises.len();
                exercises.push(exercise);
            }
            Err(e) => warn!("{}", e),
        }
    }

    Ok(exercises)
}

fn parse_exercise_row(
    row: &[Data],
    columns: &ExerciseColumns,
    row_num: usize,
) -> Result<Exercise, ParseError> {
    let name = parse_exercise_name(&row[columns.name], row_num)?;
    let equipment = match &row[columns.equipment] {
        Data::String(s) => Equipment::from_str(s).map_err(|_| ParseError::UnknownEquipment {
            row: row_num,
            value: s.clone(),
        })?,
        Data::Empty => Equipment::Barbell,
        other => {
            return Err(ParseError::UnknownEquipment {
                row: row_num,
                value: format!("{:?}", other),
            });
        }
    };

    let mut exercise = Exercise::new(&name, equipment);

    let optional_count = |col: Option<usize>, default: u32| -> Result<u32, ParseError> {
        match col {
            Some(c) => parse_count(&row[c], row_num, default),
            None => Ok(default),
        }
    };

    exercise.sets_range = CountRange::new(
        optional_count(columns.sets_min, exercise.sets_range.min)?,
        optional_count(columns.sets_max, exercise.sets_range.max)?,
    );
    exercise.reps_range = CountRange::new(
        optional_count(columns.reps_min, exercise.reps_range.min)?,
        optional_count(columns.reps_max, exercise.reps_range.max)?,
    );

    if let Some(col) = columns.increment
        && row[col] != Data::Empty
    {
        exercise.weight_increment = parse_weight(&row[col], row_num)?;
    }

    if let Some(col) = columns.minimum
        && row[col] != Data::Empty
    {
        exercise.custom_minimum_weight = Some(parse_non_negative(&row[col], row_num)?);
    }

    exercise.workout_day = columns.day.and_then(|col| match &row[col] {
        Data::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    });

    Ok(exercise)
}

/// Parses a date from a cell.
fn parse_date(cell: &Data, row: usize) -> Result<NaiveDate, ParseError> {
    match cell {
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|ndt| ndt.date())
            .ok_or_else(|| ParseError::InvalidDate {
                row,
                value: format!("{:?}", dt),
            }),
        Data::Float(serial) if serial.is_finite() && *serial >= 1.0 => EXCEL_EPOCH
            .checked_add_days(Days::new(*serial as u64))
            .ok_or_else(|| ParseError::InvalidDate {
                row,
                value: serial.to_string(),
            }),
        Data::DateTimeIso(s) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ParseError::InvalidDate {
                row,
                value: s.clone(),
            })
        }
        Data::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
            .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
            .map_err(|_| ParseError::InvalidDate {
                row,
                value: s.clone(),
            }),
        other => Err(ParseError::InvalidDate {
            row,
            value: cell_text(other),
        }),
    }
}

/// Parses a strictly positive weight from a cell.
fn parse_weight(cell: &Data, row: usize) -> Result<f64, ParseError> {
    let weight = parse_non_negative(cell, row)?;
    if weight > 0.0 {
        Ok(weight)
    } else {
        Err(ParseError::InvalidWeight {
            row,
            value: cell_text(cell),
        })
    }
}

/// Parses a non-negative number from a cell.
fn parse_non_negative(cell: &Data, row: usize) -> Result<f64, ParseError> {
    let value = match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| ParseError::InvalidWeight {
            row,
            value: cell_text(cell),
        })
}

/// Parses a non-negative whole count; empty cells take `default`.
fn parse_count(cell: &Data, row: usize, default: u32) -> Result<u32, ParseError> {
    let value = match cell {
        Data::Empty => return Ok(default),
        Data::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u32),
        Data::Int(i) => u32::try_from(*i).ok(),
        Data::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };

    value.ok_or_else(|| ParseError::InvalidSets {
        row,
        value: cell_text(cell),
    })
}

/// Parses an exercise name from a cell.
fn parse_exercise_name(cell: &Data, row: usize) -> Result<String, ParseError> {
    match cell {
        Data::String(s) if !s.trim().is_empty() => Ok(normalize_name(s)),
        other => Err(ParseError::InvalidExercise {
            row,
            value: cell_text(other),
        }),
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => "(empty)".to_string(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => format!("{:?}", other),
    }
}

/// Excel epoch is 1899-12-30 (accounting for Excel's leap year bug).
const EXCEL_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1899, 12, 30) {
    Some(d) => d,
    None => panic!("Invalid Excel epoch"),
};

fn date_to_excel_serial(date: NaiveDate) -> f64 {
    (date - EXCEL_EPOCH).num_days() as f64
}

/// Header written to an empty log sheet.
const LOG_HEADER: [&str; 6] = ["Date", "Exercise", "Weight", "Repetitions", "Sets", "Failed"];

/// 1-based column positions in the log sheet, resolved from its header row.
struct SheetColumns {
    date: u32,
    exercise: u32,
    weight: u32,
    reps: u32,
    sets: u32,
    failed: u32,
}

impl SheetColumns {
    /// Reads the header row, writing the default header into an empty sheet
    /// and appending `Sets`/`Failed` headers when the sheet lacks them.
    fn resolve(sheet: &mut Worksheet) -> Result<Self, WorkbookError> {
        if sheet.get_highest_row() == 0 {
            for (col, name) in (1u32..).zip(LOG_HEADER) {
                sheet.get_cell_mut((col, 1)).set_value(name);
            }
        }

        let width = sheet.get_highest_column();
        let headers: Vec<String> = (1..=width)
            .map(|col| {
                sheet
                    .get_cell((col, 1))
                    .map(|cell| cell.get_value().trim().to_lowercase())
                    .unwrap_or_default()
            })
            .collect();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .map(|i| i as u32 + 1)
        };
        let require =
            |name: &str| find(name).ok_or_else(|| WorkbookError::MissingColumn(name.to_string()));

        let date = require(COL_DATE)?;
        let exercise = require(COL_EXERCISE)?;
        let weight = require(COL_WEIGHT)?;
        let reps = require(COL_REPS)?;

        let mut next_free = width + 1;
        let mut find_or_add = |name: &str, title: &str| match find(name) {
            Some(col) => col,
            None => {
                let col = next_free;
                sheet.get_cell_mut((col, 1)).set_value(title);
                next_free += 1;
                col
            }
        };
        let sets = find_or_add(COL_SETS, "Sets");
        let failed = find_or_add(COL_FAILED, "Failed");

        Ok(Self {
            date,
            exercise,
            weight,
            reps,
            sets,
            failed,
        })
    }
}

/// Appends a log entry to the first sheet, or updates the row with the same
/// date and exercise.
///
/// Column positions come from the sheet's header row, so user-ordered
/// sheets are written in place. A `None` performance writes a bodyweight row.
///
/// # Returns
/// `true` if an existing row was updated.
pub fn append_log(
    path: &Path,
    date: NaiveDate,
    exercise: &str,
    weight_kg: f64,
    performance: Option<&SetPerformance>,
) -> Result<bool, WorkbookError> {
    let mut book = umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|e| WorkbookError::Read(format!("{}: {}", path.display(), e)))?;
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| WorkbookError::SheetNotFound("log".to_string()))?;

    let columns = SheetColumns::resolve(sheet)?;
    let exercise = normalize_name(exercise);
    let date_excel = date_to_excel_serial(date);

    let highest = sheet.get_highest_row();
    let mut target_row = highest + 1;
    let mut updated = false;
    for row in 2..=highest {
        let date_cell = sheet.get_cell_mut((columns.date, row)).get_value_number();
        let name_cell = sheet.get_cell_mut((columns.exercise, row)).get_value();
        if date_cell == Some(date_excel) && name_cell.trim().eq_ignore_ascii_case(&exercise) {
            target_row = row;
            updated = true;
            break;
        }
    }

    let date_cell = sheet.get_cell_mut((columns.date, target_row));
    date_cell.set_value_number(date_excel);
    date_cell
        .get_style_mut()
        .get_number_format_mut()
        .set_format_code("yyyy-mm-dd");

    sheet
        .get_cell_mut((columns.exercise, target_row))
        .set_value(exercise.as_str());
    sheet
        .get_cell_mut((columns.weight, target_row))
        .set_value_number(weight_kg);
    if let Some(p) = performance {
        sheet
            .get_cell_mut((columns.reps, target_row))
            .set_value_number(p.target_reps);
        sheet
            .get_cell_mut((columns.sets, target_row))
            .set_value_number(p.completed_sets);
        sheet
            .get_cell_mut((columns.failed, target_row))
            .set_value_number(p.failed_rep);
    }

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| WorkbookError::Write(format!("{}: {}", path.display(), e)))?;

    log::info!(
        "{} {} entry for {} in {}",
        if updated { "Updated" } else { "Appended" },
        exercise,
        date,
        path.display()
    );

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<Data> {
        names.iter().map(|n| Data::String(n.to_string())).collect()
    }

    fn full_columns() -> LogColumns {
        LogColumns::from_header(&header(&[
            "Date",
            "Exercise",
            "Weight",
            "Repetitions",
            "Sets",
            "Failed",
        ]))
        .unwrap()
    }

    #[test]
    fn test_log_columns_from_header() {
        let columns = full_columns();
        assert_eq!(columns.date, 0);
        assert_eq!(columns.exercise, 1);
        assert_eq!(columns.weight, 2);
        assert_eq!(columns.reps, 3);
        assert_eq!(columns.sets, Some(4));
        assert_eq!(columns.failed, Some(5));
    }

    #[test]
    fn test_log_columns_optional_and_case_insensitive() {
        let columns =
            LogColumns::from_header(&header(&["DATE", "EXERCISE", "WEIGHT", "REPETITIONS"]))
                .unwrap();
        assert!(columns.sets.is_none());
        assert!(columns.failed.is_none());
    }

    #[test]
    fn test_log_columns_missing_column() {
        assert!(LogColumns::from_header(&header(&["Date", "Weight"])).is_err());
    }

    #[test]
    fn test_parse_log_row_set() {
        let row = vec![
            Data::String("2024-03-01".to_string()),
            Data::String("Bench Press".to_string()),
            Data::Float(100.0),
            Data::Int(8),
            Data::Int(3),
            Data::Int(4),
        ];

        match parse_log_row(&row, &full_columns(), 2).unwrap() {
            LogRow::Set(log) => {
                assert_eq!(log.exercise, "bench press");
                assert_eq!(log.performance.failed_rep, 4);
                assert_eq!(log.estimated_one_rm, 127.5);
            }
            LogRow::Bodyweight(_) => panic!("expected a set log"),
        }
    }

    #[test]
    fn test_parse_log_row_bodyweight() {
        let row = vec![
            Data::String("2024-03-01".to_string()),
            Data::String("bodyweight".to_string()),
            Data::Float(81.4),
            Data::Empty,
            Data::Empty,
            Data::Empty,
        ];

        match parse_log_row(&row, &full_columns(), 2).unwrap() {
            LogRow::Bodyweight(entry) => assert_eq!(entry.weight_kg, 81.4),
            LogRow::Set(_) => panic!("expected a bodyweight log"),
        }
    }

    #[test]
    fn test_parse_log_row_zero_weight_set() {
        let row = vec![
            Data::String("2024-03-01".to_string()),
            Data::String("Pull Up".to_string()),
            Data::Float(0.0),
            Data::Int(8),
            Data::Int(3),
            Data::Int(0),
        ];

        match parse_log_row(&row, &full_columns(), 2).unwrap() {
            LogRow::Set(log) => {
                assert_eq!(log.exercise, "pull up");
                assert_eq!(log.performance.weight_kg, 0.0);
                assert_eq!(log.estimated_one_rm, 0.0);
            }
            LogRow::Bodyweight(_) => panic!("expected a set log"),
        }
    }

    #[test]
    fn test_parse_log_row_zero_bodyweight_rejected() {
        let row = vec![
            Data::String("2024-03-01".to_string()),
            Data::String("bodyweight".to_string()),
            Data::Float(0.0),
            Data::Empty,
            Data::Empty,
            Data::Empty,
        ];

        assert!(matches!(
            parse_log_row(&row, &full_columns(), 3),
            Err(ParseError::InvalidWeight { row: 3, .. })
        ));
    }

    #[test]
    fn test_parse_log_row_defaults() {
        // Empty sets default to one, empty failed to zero
        let row = vec![
            Data::String("2024-03-01".to_string()),
            Data::String("squat".to_string()),
            Data::Int(100),
            Data::Int(5),
            Data::Empty,
            Data::Empty,
        ];

        match parse_log_row(&row, &full_columns(), 2).unwrap() {
            LogRow::Set(log) => {
                assert_eq!(log.performance.completed_sets, 1);
                assert_eq!(log.performance.failed_rep, 0);
            }
            LogRow::Bodyweight(_) => panic!("expected a set log"),
        }
    }

    #[test]
    fn test_parse_log_row_zero_reps_rejected() {
        let row = vec![
            Data::String("2024-03-01".to_string()),
            Data::String("squat".to_string()),
            Data::Int(100),
            Data::Int(0),
            Data::Int(3),
            Data::Empty,
        ];

        assert!(matches!(
            parse_log_row(&row, &full_columns(), 7),
            Err(ParseError::InvalidReps { row: 7, .. })
        ));
    }

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight(&Data::Float(100.5), 1).unwrap(), 100.5);
        assert_eq!(parse_weight(&Data::Int(100), 1).unwrap(), 100.0);
        assert_eq!(
            parse_weight(&Data::String(" 62.5 ".to_string()), 1).unwrap(),
            62.5
        );
        assert!(parse_weight(&Data::Float(-10.0), 1).is_err());
        assert!(parse_weight(&Data::Float(0.0), 1).is_err());
        assert!(parse_weight(&Data::Empty, 1).is_err());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(&Data::Empty, 1, 3).unwrap(), 3);
        assert_eq!(parse_count(&Data::Float(4.0), 1, 0).unwrap(), 4);
        assert_eq!(parse_count(&Data::Int(5), 1, 0).unwrap(), 5);
        assert!(parse_count(&Data::Float(2.5), 1, 0).is_err());
        assert!(parse_count(&Data::Int(-1), 1, 0).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            parse_date(&Data::String("2024-03-01".to_string()), 1).unwrap(),
            expected
        );
        assert_eq!(
            parse_date(&Data::String("01/03/2024".to_string()), 1).unwrap(),
            expected
        );
        assert_eq!(parse_date(&Data::Float(45352.0), 1).unwrap(), expected);
        assert!(parse_date(&Data::String("yesterday".to_string()), 1).is_err());
        assert!(parse_date(&Data::Empty, 1).is_err());
    }

    #[test]
    fn test_parse_exercise_row() {
        let columns = ExerciseColumns::from_header(&header(&[
            "Name",
            "Equipment",
            "Day",
            "Sets Min",
            "Sets Max",
            "Reps Min",
            "Reps Max",
            "Increment",
            "Minimum",
        ]))
        .unwrap();

        let row = vec![
            Data::String("Overhead Press".to_string()),
            Data::String("barbell".to_string()),
            Data::String("Push".to_string()),
            Data::Int(4),
            Data::Int(6),
            Data::Int(5),
            Data::Int(8),
            Data::Float(1.25),
            Data::Float(15.0),
        ];

        let exercise = parse_exercise_row(&row, &columns, 2).unwrap();
        assert_eq!(exercise.name, "overhead press");
        assert_eq!(exercise.equipment, Equipment::Barbell);
        assert_eq!(exercise.workout_day.as_deref(), Some("Push"));
        assert_eq!(exercise.sets_range, CountRange::new(4, 6));
        assert_eq!(exercise.reps_range, CountRange::new(5, 8));
        assert_eq!(exercise.weight_increment, 1.25);
        assert_eq!(exercise.custom_minimum_weight, Some(15.0));
    }

    #[test]
    fn test_parse_exercise_row_defaults() {
        let columns = ExerciseColumns::from_header(&header(&["Name", "Equipment"])).unwrap();
        let row = vec![
            Data::String("Curl".to_string()),
            Data::String("dumbbell".to_string()),
        ];

        let exercise = parse_exercise_row(&row, &columns, 2).unwrap();
        assert_eq!(exercise.sets_range, CountRange::new(3, 5));
        assert_eq!(exercise.reps_range, CountRange::new(8, 12));
        assert!(exercise.workout_day.is_none());
        assert!(exercise.custom_minimum_weight.is_none());
    }

    #[test]
    fn test_date_to_excel_serial() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(date_to_excel_serial(date), 45292.0);
    }

    fn temp_workbook(name: &str, header: &[&str]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "liftlog-{}-{}.xlsx",
            name,
            std::process::id()
        ));
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        for (col, title) in (1u32..).zip(header) {
            sheet.get_cell_mut((col, 1)).set_value(*title);
        }
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
        path
    }

    #[test]
    fn test_append_log_follows_header_order() {
        let path = temp_workbook(
            "reordered",
            &["Exercise", "Sets", "Weight", "Date", "Repetitions", "Failed"],
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let performance = SetPerformance {
            weight_kg: 0.0,
            target_reps: 8,
            completed_sets: 3,
            failed_rep: 2,
        };

        assert!(!append_log(&path, date, "Pull Up", 0.0, Some(&performance)).unwrap());
        assert!(!append_log(&path, date, BODYWEIGHT, 80.5, None).unwrap());

        let data = load_training_data(&path).unwrap();
        let logs = data.logs("pull up");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].date, date);
        assert_eq!(logs[0].performance, performance);
        assert_eq!(data.bodyweight().len(), 1);
        assert_eq!(data.bodyweight()[0].weight_kg, 80.5);

        let heavier = SetPerformance {
            weight_kg: 5.0,
            ..performance
        };
        assert!(append_log(&path, date, "pull up", 5.0, Some(&heavier)).unwrap());
        let data = load_training_data(&path).unwrap();
        assert_eq!(data.logs("pull up").len(), 1);
        assert_eq!(data.logs("pull up")[0].performance.weight_kg, 5.0);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_log_adds_missing_columns() {
        let path = temp_workbook("partial", &["Date", "Exercise", "Weight", "Repetitions"]);
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let performance = SetPerformance {
            weight_kg: 100.0,
            target_reps: 5,
            completed_sets: 3,
            failed_rep: 1,
        };

        append_log(&path, date, "squat", 100.0, Some(&performance)).unwrap();

        let data = load_training_data(&path).unwrap();
        assert_eq!(data.logs("squat")[0].performance, performance);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_log_missing_required_column() {
        let path = temp_workbook("no-weight", &["Date", "Exercise", "Repetitions"]);
        let date = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();

        let result = append_log(&path, date, BODYWEIGHT, 80.0, None);
        assert!(matches!(result, Err(WorkbookError::MissingColumn(c)) if c == "weight"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_training_data("/nonexistent/liftlog.xlsx"),
            Err(ParseError::FileNotFound(_))
        ));
    }
}
