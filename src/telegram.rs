//! Telegram bot for logging sets and asking for the next workout.

use std::sync::Arc;

use chrono::Local;
use teloxide::{
    dispatching::UpdateFilterExt,
    dptree,
    prelude::*,
    utils::command::{BotCommands, ParseError},
};

use crate::analysis::ExerciseAnalysis;
use crate::domain::{BODYWEIGHT, SetLog, SetPerformance, normalize_name};
use crate::excel::append_log;
use crate::server::{AnalysisData, AppState};
use crate::suggest::WorkoutSuggestion;

pub(crate) async fn start_bot(state: Arc<AppState>) {
    let bot = Bot::from_env();

    log::info!("Starting Telegram bot");

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .branch(dptree::entry().filter_command::<Command>().endpoint(answer))
            .branch(dptree::filter(|_: Message| true).endpoint(handle_invalid_command)),
    )
    .dependencies(dptree::deps![state])
    .build()
    .dispatch()
    .await;
}

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum Command {
    #[command(description = "display this text.")]
    Help,
    #[command(
        description = "[exercise] [weight] [reps] [sets] [failed reps] log a set.",
        parse_with = parse_set_args
    )]
    Log(String, f64, u32, u32, u32),
    #[command(description = "[weight] log body weight.")]
    Bodyweight(f64),
    #[command(description = "[exercise] suggest the next workout.")]
    Suggest(String),
    #[command(description = "[exercise] show the 1RM trend.")]
    Trend(String),
}

/// Parses `exercise weight reps sets [failed]`.
///
/// Underscores in the exercise name stand for spaces.
fn parse_set_args(input: String) -> Result<(String, f64, u32, u32, u32), ParseError> {
    let usage = "/log bench_press 80 8 3 [failed reps]".to_string();
    let args: Vec<&str> = input.split_whitespace().collect();

    if args.len() < 4 {
        return Err(ParseError::TooFewArguments {
            expected: 4,
            found: args.len(),
            message: usage,
        });
    }
    if args.len() > 5 {
        return Err(ParseError::TooManyArguments {
            expected: 5,
            found: args.len(),
            message: usage,
        });
    }

    let exercise = args[0].replace('_', " ");
    let weight: f64 = args[1]
        .parse()
        .map_err(|e| ParseError::IncorrectFormat(Box::new(e)))?;
    let reps: u32 = args[2]
        .parse()
        .map_err(|e| ParseError::IncorrectFormat(Box::new(e)))?;
    let sets: u32 = args[3]
        .parse()
        .map_err(|e| ParseError::IncorrectFormat(Box::new(e)))?;
    let failed: u32 = match args.get(4) {
        Some(arg) => arg
            .parse()
            .map_err(|e| ParseError::IncorrectFormat(Box::new(e)))?,
        None => 0,
    };

    Ok((exercise, weight, reps, sets, failed))
}

fn format_suggestion(s: &WorkoutSuggestion) -> String {
    format!(
        "{} x {} @ {}kg (1RM {:.2})",
        s.sets, s.reps, s.weight, s.estimated_one_rm
    )
}

fn format_suggestions(analysis: &ExerciseAnalysis) -> String {
    let name = &analysis.exercise.name;

    if let Some(err) = &analysis.suggestion_error {
        return format!("Cannot suggest {}: {}", name, err);
    }

    if analysis.suggestions.is_empty() {
        return format!("No progression suggestions available for {}.", name);
    }

    let basis = if analysis.uses_default {
        "default"
    } else {
        "projected"
    };
    let mut lines = Vec::new();
    if let Some(last) = analysis.latest_log() {
        let p = &last.performance;
        lines.push(format!(
            "Last session {}: {}kg {}x{}",
            last.date, p.weight_kg, p.completed_sets, p.target_reps
        ));
    }
    lines.push(format!(
        "{} ({} 1RM {:.2}kg):",
        name, basis, analysis.current_one_rm
    ));
    lines.extend(analysis.suggestions.iter().map(format_suggestion));
    lines.join("\n")
}

fn format_trend(analysis: &ExerciseAnalysis, recent: &[f64]) -> String {
    let recent: Vec<String> = recent.iter().map(|e| format!("{:.1}", e)).collect();

    if recent.is_empty() {
        return format!("No sets logged for {}.", analysis.exercise.name);
    }

    format!(
        "{}: trend {}, next 1RM {:.2}kg\nRecent: {}",
        analysis.exercise.name,
        analysis.trend.trend,
        analysis.trend.next_one_rm,
        recent.join(", ")
    )
}

async fn with_analysis(
    state: &AppState,
    exercise: &str,
    render: fn(&AnalysisData, &ExerciseAnalysis) -> String,
) -> String {
    let data = state.data.read().await;
    match data.analyses.get(&normalize_name(&exercise.replace('_', " "))) {
        Some(analysis) => render(&data, analysis),
        None => format!("Unknown exercise: {}", exercise),
    }
}

fn updated_suffix(updated: bool) -> &'static str {
    if updated { " [updated]" } else { "" }
}

async fn answer(bot: Bot, msg: Message, cmd: Command, state: Arc<AppState>) -> ResponseResult<()> {
    let today = Local::now().date_naive();

    let reply = match cmd {
        Command::Help => Command::descriptions().to_string(),
        Command::Log(exercise, weight, reps, sets, failed) => {
            let performance = SetPerformance {
                weight_kg: weight,
                target_reps: reps,
                completed_sets: sets,
                failed_rep: failed,
            };
            match SetLog::new(today, &exercise, performance) {
                Some(log) => match append_log(
                    &state.file_path,
                    today,
                    &log.exercise,
                    weight,
                    Some(&performance),
                ) {
                    Ok(updated) => format!(
                        "{} for {}: {}kg {}x{}, estimated 1RM {:.2}kg.{}",
                        log.exercise,
                        today,
                        weight,
                        sets,
                        reps,
                        log.estimated_one_rm,
                        updated_suffix(updated)
                    ),
                    Err(e) => {
                        log::error!("Failed to log set: {}", e);
                        format!("Could not save set: {}", e)
                    }
                },
                None => "Invalid set: reps must be positive and weight non-negative.".to_string(),
            }
        }
        Command::Bodyweight(bodyweight) => {
            match append_log(&state.file_path, today, BODYWEIGHT, bodyweight, None) {
                Ok(updated) => format!(
                    "Your body weight for {} is {}kg.{}",
                    today,
                    bodyweight,
                    updated_suffix(updated)
                ),
                Err(e) => {
                    log::error!("Failed to log body weight: {}", e);
                    format!("Could not save body weight: {}", e)
                }
            }
        }
        Command::Suggest(exercise) => {
            with_analysis(&state, &exercise, |_, analysis| format_suggestions(analysis)).await
        }
        Command::Trend(exercise) => {
            with_analysis(&state, &exercise, |data, analysis| {
                let recent = data.training_data.recent_estimates(&analysis.exercise.name);
                format_trend(analysis, &recent)
            })
            .await
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn handle_invalid_command(bot: Bot, msg: Message) -> ResponseResult<()> {
    let text = msg.text().unwrap_or("");

    if let Err(err) = Command::parse(text, "") {
        let error_msg = match err {
            ParseError::TooFewArguments {
                expected,
                found,
                message,
            } => {
                format!("Missing argument. Expected {expected}, got {found}.\nUsage: {message}")
            }
            ParseError::TooManyArguments {
                expected,
                found,
                message,
            } => {
                format!("Too many arguments. Expected {expected}, got {found}.\nUsage: {message}")
            }
            ParseError::IncorrectFormat(err) => format!("Invalid format: {err}"),
            ParseError::UnknownCommand(cmd) => {
                format!("Unknown command: {cmd}\n\n{}", Command::descriptions())
            }
            ParseError::WrongBotName(_) => return Ok(()),
            ParseError::Custom(err) => format!("Error: {err}"),
        };

        bot.send_message(msg.chat.id, error_msg).await?;
    }

    Ok(())
}
