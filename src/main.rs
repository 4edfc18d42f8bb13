mod analysis;
mod domain;
mod error;
mod excel;
mod formulas;
mod server;
mod suggest;
mod telegram;
mod trend;
mod watcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::sync::{RwLock, broadcast};

use crate::analysis::{AnalysisConfig, analyze_bodyweight, analyze_training_data};
use crate::domain::{Equipment, EquipmentWeights};
use crate::excel::load_training_data;
use crate::server::{AnalysisData, AppState, WsMessage};
use crate::watcher::{WatcherConfig, watch_workbook};

/// Progressive overload planner for strength training logs.
#[derive(Parser, Debug)]
#[command(name = "liftlog")]
#[command(about = "Estimates 1RM trends and suggests the next workout from a training log")]
#[command(version)]
struct Args {
    /// Path to the Excel workbook containing the training log.
    /// Can also be set via LIFTLOG_FILE environment variable.
    #[arg(value_name = "FILE", env = "LIFTLOG_FILE")]
    file: PathBuf,

    /// Port number for the web server.
    /// Can also be set via LIFTLOG_PORT environment variable.
    #[arg(value_name = "PORT", env = "LIFTLOG_PORT", default_value = "8080")]
    port: u16,

    /// 1RM assumed for exercises without logged sets.
    #[arg(long, env = "LIFTLOG_DEFAULT_ONE_RM", default_value = "20")]
    default_one_rm: f64,

    /// Overrides an equipment minimum weight, e.g. `--minimum barbell=15`.
    #[arg(long = "minimum", value_name = "EQUIPMENT=KG", value_parser = parse_minimum)]
    minimums: Vec<(Equipment, f64)>,

    /// Start the Telegram bot (requires TELOXIDE_TOKEN).
    #[arg(long, env = "LIFTLOG_TELEGRAM")]
    telegram: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    if !args.default_one_rm.is_finite() || args.default_one_rm <= 0.0 {
        anyhow::bail!("Default 1RM must be positive, got {}", args.default_one_rm);
    }

    let file_path = args
        .file
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", args.file.display()))?;

    let equipment_weights = args
        .minimums
        .iter()
        .fold(EquipmentWeights::default(), |weights, &(equipment, kg)| {
            weights.with_minimum(equipment, kg)
        });

    let config = AnalysisConfig {
        default_one_rm: args.default_one_rm,
        equipment_weights,
    };

    let minimums: Vec<String> = Equipment::all()
        .iter()
        .map(|e| format!("{} {}kg", e, config.equipment_weights.minimum_for(*e)))
        .collect();
    log::info!("Equipment minimums: {}", minimums.join(", "));

    println!("Loading training log from: {}", file_path.display());
    let initial_data = load_and_analyze(&file_path, &config)?;

    let (ws_tx, _) = broadcast::channel::<WsMessage>(16);

    let state = Arc::new(AppState {
        data: RwLock::new(initial_data),
        file_path: file_path.clone(),
        config,
        ws_broadcast: ws_tx,
    });

    let static_dir = find_static_dir();
    println!();
    println!("Static files: {}", static_dir.display());

    let watcher_state = state.clone();
    let watcher_path = file_path.clone();
    tokio::spawn(async move {
        let config = WatcherConfig::default();
        let retry_config = config.clone();

        if let Err(e) = watch_workbook(&watcher_path, config, move || {
            let state = watcher_state.clone();
            let config = retry_config.clone();
            tokio::spawn(async move {
                reload_with_retry(&state, &config).await;
            });
        })
        .await
        {
            log::error!("Workbook watcher error: {}", e);
        }
    });

    if args.telegram {
        tokio::spawn(telegram::start_bot(state.clone()));
    }

    println!();
    println!("Live reload enabled - watching for workbook changes");
    server::run_server(state, args.port, static_dir).await?;

    Ok(())
}

/// Parses an `EQUIPMENT=KG` minimum weight override.
fn parse_minimum(s: &str) -> Result<(Equipment, f64), String> {
    let (equipment, kg) = s
        .split_once('=')
        .ok_or_else(|| format!("expected EQUIPMENT=KG, got '{}'", s))?;
    let equipment: Equipment = equipment.parse().map_err(|e| format!("{}", e))?;
    let kg: f64 = kg
        .trim()
        .parse()
        .map_err(|_| format!("invalid weight '{}'", kg))?;

    if !kg.is_finite() || kg < 0.0 {
        return Err(format!("minimum weight must be non-negative, got {}", kg));
    }

    Ok((equipment, kg))
}

/// Loads the workbook and runs analysis, returning AnalysisData.
fn load_and_analyze(file_path: &Path, config: &AnalysisConfig) -> Result<AnalysisData> {
    let data = load_training_data(file_path)
        .with_context(|| format!("Failed to load training log from {}", file_path.display()))?;

    println!();
    println!("=== Training Log Summary ===");
    println!();
    println!("Total logged sets: {}", data.total_count());
    println!("Body weight entries: {}", data.bodyweight().len());

    if let Some((first, last)) = data.overall_date_range() {
        println!("Date range: {} to {}", first, last);
    }

    println!();

    for day in data.workout_days() {
        println!("{}:", day.name);
        for name in &day.exercises {
            if let Some(exercise) = data.exercise(name) {
                println!(
                    "  {:24} {:4} sets logged  ({})",
                    exercise.name,
                    data.count(name),
                    exercise.equipment.display_name()
                );
            }
        }
    }

    let analyses = analyze_training_data(&data, config);
    let bodyweight = analyze_bodyweight(data.bodyweight());

    let with_suggestions = analyses
        .values()
        .filter(|a| !a.suggestions.is_empty())
        .count();
    let invalid = analyses
        .values()
        .filter(|a| a.suggestion_error.is_some())
        .count();

    println!();
    println!(
        "Exercises with suggestions: {} of {}",
        with_suggestions,
        analyses.len()
    );
    if invalid > 0 {
        log::warn!("{} exercises have invalid parameters", invalid);
    }

    Ok(AnalysisData {
        training_data: data,
        analyses,
        bodyweight,
        last_reload: Utc::now(),
    })
}

/// Reloads data with retry logic for transient failures.
async fn reload_with_retry(state: &AppState, config: &WatcherConfig) {
    let mut last_error = None;

    for attempt in 0..config.retry_attempts {
        match load_and_analyze(&state.file_path, &state.config) {
            Ok(new_data) => {
                let mut data = state.data.write().await;
                *data = new_data;
                drop(data);

                log::info!("Training log reloaded");

                let _ = state.ws_broadcast.send(WsMessage::DataUpdated);
                return;
            }
            Err(e) => {
                log::warn!("Reload attempt {} failed: {:#}", attempt + 1, e);
                last_error = Some(e);
                if attempt + 1 < config.retry_attempts {
                    tokio::time::sleep(config.retry_delay).await;
                }
            }
        }
    }

    if let Some(e) = last_error {
        log::error!(
            "Failed to reload training log after {} attempts: {:#}",
            config.retry_attempts,
            e
        );

        let _ = state
            .ws_broadcast
            .send(WsMessage::Error("Failed to reload training log".into()));
    }
}

/// Finds the static directory for serving frontend files.
fn find_static_dir() -> PathBuf {
    let cwd_static = PathBuf::from("static");
    if cwd_static.is_dir() {
        return cwd_static;
    }

    if let Ok(exe_path) = std::env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        let exe_static = exe_dir.join("static");
        if exe_static.is_dir() {
            return exe_static;
        }
    }

    cwd_static
}
