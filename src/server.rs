//! Web server for the workout tracker.
//!
//! Provides a REST API for exercise history, trends and suggestions, the
//! stateless estimation endpoints, WebSocket for live updates, and static
//! file serving for the frontend.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use tower_http::services::ServeDir;

use crate::analysis::{AnalysisConfig, BodyweightAnalysis, ExerciseAnalysis};
use crate::domain::{
    CountRange, Equipment, ExerciseParameters, SetPerformance, TrainingData, WorkoutDay,
    normalize_name,
};
use crate::error::EstimationError;
use crate::formulas::estimate_one_rep_max;
use crate::suggest::{WorkoutSuggestion, suggest_next_workouts};
use crate::trend::{TrendResult, compute_trend};

/// Message types for WebSocket broadcast.
#[derive(Clone, Debug)]
pub enum WsMessage {
    /// Data has been reloaded successfully.
    DataUpdated,
    /// An error occurred during reload.
    Error(String),
}

/// Mutable analysis data that can be reloaded.
pub struct AnalysisData {
    pub training_data: TrainingData,
    pub analyses: HashMap<String, ExerciseAnalysis>,
    pub bodyweight: BodyweightAnalysis,
    pub last_reload: chrono::DateTime<Utc>,
}

/// Shared application state with reloadable data.
pub struct AppState {
    /// The analysis data, protected by RwLock for concurrent reads.
    pub data: RwLock<AnalysisData>,
    /// Path to the workbook for reloading and appending.
    pub file_path: PathBuf,
    /// Engine defaults used for analysis and ad-hoc suggestions.
    pub config: AnalysisConfig,
    /// Broadcast channel for WebSocket notifications.
    pub ws_broadcast: broadcast::Sender<WsMessage>,
}

// === JSON Types ===

#[derive(Debug, Serialize)]
pub struct ExerciseSummary {
    pub name: String,
    pub equipment: Equipment,
    pub workout_day: Option<String>,
    pub log_count: usize,
    pub last_session: Option<String>,
    pub trend: TrendResult,
    pub current_one_rm: f64,
}

#[derive(Debug, Serialize)]
pub struct ExerciseResponse {
    pub name: String,
    pub parameters: ExerciseParameters,
    pub history: Vec<SetLogJson>,
    pub trend: TrendResult,
    pub current_one_rm: f64,
    pub uses_default: bool,
    pub suggestions: Vec<WorkoutSuggestion>,
    pub suggestion_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetLogJson {
    pub date: String,
    pub weight_kg: f64,
    pub target_reps: u32,
    pub completed_sets: u32,
    pub failed_rep: u32,
    pub estimated_one_rm: f64,
}

#[derive(Debug, Serialize)]
pub struct BodyweightResponse {
    pub entries: Vec<WeightJson>,
    pub trend: TrendResult,
}

#[derive(Debug, Serialize)]
pub struct WeightJson {
    pub date: String,
    pub weight_kg: f64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub last_reload: String,
    pub exercise_count: usize,
    pub total_logs: usize,
    pub first_entry: Option<String>,
    pub last_entry: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub estimated_one_rm: f64,
}

#[derive(Debug, Deserialize)]
pub struct TrendRequest {
    pub estimates: Vec<f64>,
}

/// Explicit search bounds, as `[min, max]` pairs.
#[derive(Debug, Deserialize)]
pub struct ParametersJson {
    pub sets_range: [u32; 2],
    pub reps_range: [u32; 2],
    pub weight_increment: f64,
    pub minimum_weight: Option<f64>,
    /// Resolved through the equipment table when no minimum is given.
    pub equipment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    pub current_one_rm: Option<f64>,
    pub exercise: Option<String>,
    pub params: Option<ParametersJson>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by API handlers as a JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(name: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("unknown exercise: {}", name))
    }
}

impl From<EstimationError> for ApiError {
    fn from(e: EstimationError) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// === Router Setup ===

/// Creates the application router.
pub fn create_router(state: Arc<AppState>, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/exercises", get(get_exercises))
        .route("/api/exercise/{name}", get(get_exercise))
        .route("/api/days", get(get_days))
        .route("/api/bodyweight", get(get_bodyweight))
        .route("/api/estimate", post(post_estimate))
        .route("/api/trend", post(post_trend))
        .route("/api/suggest", post(post_suggest))
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true))
        .with_state(state)
}

// === WebSocket Handler ===

/// WebSocket upgrade handler for live updates.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws_connection(socket, state))
}

/// Forwards reload notifications to one WebSocket client.
async fn handle_ws_connection(mut socket: WebSocket, state: Arc<AppState>) {
    log::info!("WebSocket client connected");

    let mut rx = state.ws_broadcast.subscribe();

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let text = match msg {
                    Ok(WsMessage::DataUpdated) => "reload".to_string(),
                    Ok(WsMessage::Error(err)) => format!("error:{}", err),
                    // Missed some messages, a reload covers them
                    Err(broadcast::error::RecvError::Lagged(_)) => "reload".to_string(),
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    log::info!("WebSocket client disconnected");
}

/// Runs the web server.
pub async fn run_server(
    state: Arc<AppState>,
    port: u16,
    static_dir: PathBuf,
) -> anyhow::Result<()> {
    let app = create_router(state, static_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    log::info!("Server running at http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// === API Handlers ===

/// GET /api/status - Reload time and data summary.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let data = state.data.read().await;
    let range = data.training_data.overall_date_range();

    Json(StatusResponse {
        last_reload: data.last_reload.to_rfc3339(),
        exercise_count: data.analyses.len(),
        total_logs: data.training_data.total_count(),
        first_entry: range.map(|(first, _)| first.to_string()),
        last_entry: range.map(|(_, last)| last.to_string()),
    })
}

/// GET /api/exercises - List all exercises with summary.
async fn get_exercises(State(state): State<Arc<AppState>>) -> Json<Vec<ExerciseSummary>> {
    let data = state.data.read().await;

    let summaries = data
        .training_data
        .exercises()
        .into_iter()
        .filter_map(|e| data.analyses.get(&e.name))
        .map(|a| ExerciseSummary {
            name: a.exercise.name.clone(),
            equipment: a.exercise.equipment,
            workout_day: a.exercise.workout_day.clone(),
            log_count: a.logs.len(),
            last_session: a.last_session.map(|d| d.to_string()),
            trend: a.trend,
            current_one_rm: a.current_one_rm,
        })
        .collect();

    Json(summaries)
}

/// GET /api/exercise/{name} - History, trend and suggestions for one exercise.
async fn get_exercise(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ExerciseResponse>, ApiError> {
    let data = state.data.read().await;
    let key = normalize_name(&name);
    let analysis = data
        .analyses
        .get(&key)
        .ok_or_else(|| ApiError::not_found(&name))?;

    let history = analysis
        .logs
        .iter()
        .map(|l| SetLogJson {
            date: l.date.to_string(),
            weight_kg: l.performance.weight_kg,
            target_reps: l.performance.target_reps,
            completed_sets: l.performance.completed_sets,
            failed_rep: l.performance.failed_rep,
            estimated_one_rm: l.estimated_one_rm,
        })
        .collect();

    Ok(Json(ExerciseResponse {
        name: analysis.exercise.name.clone(),
        parameters: analysis
            .exercise
            .parameters(&state.config.equipment_weights),
        history,
        trend: analysis.trend,
        current_one_rm: analysis.current_one_rm,
        uses_default: analysis.uses_default,
        suggestions: analysis.suggestions.clone(),
        suggestion_error: analysis.suggestion_error.clone(),
    }))
}

/// GET /api/days - Workout days with their exercises in display order.
async fn get_days(State(state): State<Arc<AppState>>) -> Json<Vec<WorkoutDay>> {
    let data = state.data.read().await;
    Json(data.training_data.workout_days())
}

/// GET /api/bodyweight - Bodyweight entries and trend.
async fn get_bodyweight(State(state): State<Arc<AppState>>) -> Json<BodyweightResponse> {
    let data = state.data.read().await;

    Json(BodyweightResponse {
        entries: data
            .bodyweight
            .logs
            .iter()
            .map(|w| WeightJson {
                date: w.date.to_string(),
                weight_kg: w.weight_kg,
            })
            .collect(),
        trend: data.bodyweight.trend,
    })
}

/// POST /api/estimate - Estimated 1RM for a single set profile.
async fn post_estimate(
    Json(performance): Json<SetPerformance>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let estimated_one_rm = estimate_one_rep_max(
        performance.weight_kg,
        performance.target_reps,
        performance.completed_sets,
        performance.failed_rep,
    )?;

    Ok(Json(EstimateResponse { estimated_one_rm }))
}

/// POST /api/trend - Trend over caller-supplied estimates, oldest first.
async fn post_trend(Json(request): Json<TrendRequest>) -> Json<TrendResult> {
    Json(compute_trend(&request.estimates))
}

/// POST /api/suggest - Suggestions for a stored exercise or explicit bounds.
///
/// An empty list is a successful answer; only malformed input is an error.
async fn post_suggest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SuggestRequest>,
) -> Result<Json<Vec<WorkoutSuggestion>>, ApiError> {
    let (params, fallback_one_rm) = match (&request.params, &request.exercise) {
        (Some(p), _) => (
            resolve_parameters(p, &state.config)?,
            state.config.default_one_rm,
        ),
        (None, Some(name)) => {
            let data = state.data.read().await;
            let analysis = data
                .analyses
                .get(&normalize_name(name))
                .ok_or_else(|| ApiError::not_found(name))?;
            (
                analysis
                    .exercise
                    .parameters(&state.config.equipment_weights),
                analysis.current_one_rm,
            )
        }
        (None, None) => {
            return Err(ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "either exercise or params is required",
            ));
        }
    };

    let current_one_rm = request.current_one_rm.unwrap_or(fallback_one_rm);
    Ok(Json(suggest_next_workouts(current_one_rm, &params)?))
}

// === Helper Functions ===

/// Converts request bounds into engine parameters.
fn resolve_parameters(
    json: &ParametersJson,
    config: &AnalysisConfig,
) -> Result<ExerciseParameters, ApiError> {
    let minimum_weight = match (json.minimum_weight, json.equipment.as_deref()) {
        (Some(minimum), _) => minimum,
        (None, Some(name)) => {
            let equipment = Equipment::from_str(name)
                .map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
            config.equipment_weights.minimum_for(equipment)
        }
        (None, None) => 0.0,
    };

    Ok(ExerciseParameters {
        sets_range: CountRange::new(json.sets_range[0], json.sets_range[1]),
        reps_range: CountRange::new(json.reps_range[0], json.reps_range[1]),
        weight_increment: json.weight_increment,
        minimum_weight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze_bodyweight, analyze_training_data};
    use crate::domain::{Exercise, SetLog, WeightLog};
    use crate::trend::Trend;
    use chrono::NaiveDate;

    fn make_date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn test_state() -> Arc<AppState> {
        let mut squat = Exercise::new("squat", Equipment::Barbell);
        squat.workout_day = Some("Legs".to_string());

        let logs = [100.0, 102.5, 105.0]
            .iter()
            .enumerate()
            .map(|(i, w)| {
                SetLog::new(
                    make_date(i as u32 + 1),
                    "squat",
                    SetPerformance {
                        weight_kg: *w,
                        target_reps: 5,
                        completed_sets: 3,
                        failed_rep: 0,
                    },
                )
                .unwrap()
            })
            .collect();
        let bodyweight = vec![WeightLog {
            date: make_date(1),
            weight_kg: 80.0,
        }];

        let training_data = TrainingData::new(vec![squat], logs, bodyweight);
        let config = AnalysisConfig::default();
        let analyses = analyze_training_data(&training_data, &config);
        let bodyweight = analyze_bodyweight(training_data.bodyweight());
        let (ws_broadcast, _) = broadcast::channel(4);

        Arc::new(AppState {
            data: RwLock::new(AnalysisData {
                training_data,
                analyses,
                bodyweight,
                last_reload: Utc::now(),
            }),
            file_path: PathBuf::from("liftlog.xlsx"),
            config,
            ws_broadcast,
        })
    }

    #[tokio::test]
    async fn test_get_status() {
        let Json(status) = get_status(State(test_state())).await;
        assert_eq!(status.exercise_count, 1);
        assert_eq!(status.total_logs, 3);
        assert_eq!(status.first_entry.as_deref(), Some("2024-05-01"));
        assert_eq!(status.last_entry.as_deref(), Some("2024-05-03"));
    }

    #[tokio::test]
    async fn test_get_exercises() {
        let Json(summaries) = get_exercises(State(test_state())).await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].name, "squat");
        assert_eq!(summaries[0].log_count, 3);
        assert_eq!(summaries[0].trend.trend, Trend::Up);
        assert_eq!(summaries[0].last_session.as_deref(), Some("2024-05-03"));
    }

    #[tokio::test]
    async fn test_get_exercise_found_and_missing() {
        let state = test_state();

        let Json(response) = get_exercise(State(state.clone()), Path("Squat".to_string()))
            .await
            .unwrap();
        assert_eq!(response.history.len(), 3);
        assert_eq!(response.parameters.minimum_weight, 20.0);
        for s in &response.suggestions {
            assert!(s.estimated_one_rm > response.current_one_rm);
        }

        let err = get_exercise(State(state), Path("curl".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_days_and_bodyweight() {
        let state = test_state();

        let Json(days) = get_days(State(state.clone())).await;
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].exercises, vec!["squat"]);

        let Json(bodyweight) = get_bodyweight(State(state)).await;
        assert_eq!(bodyweight.entries.len(), 1);
        assert_eq!(bodyweight.trend.next_one_rm, 80.0);
    }

    #[tokio::test]
    async fn test_post_estimate() {
        let performance = SetPerformance {
            weight_kg: 100.0,
            target_reps: 8,
            completed_sets: 3,
            failed_rep: 4,
        };
        let Json(response) = post_estimate(Json(performance)).await.unwrap();
        assert_eq!(response.estimated_one_rm, 127.5);

        let invalid = SetPerformance {
            target_reps: 0,
            ..performance
        };
        let err = post_estimate(Json(invalid)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_post_trend() {
        let Json(result) = post_trend(Json(TrendRequest {
            estimates: vec![50.0, 55.0, 60.0],
        }))
        .await;
        assert_eq!(result.trend, Trend::Up);
        assert!((result.next_one_rm - 65.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_post_suggest_with_params() {
        let request = SuggestRequest {
            current_one_rm: Some(100.0),
            exercise: None,
            params: Some(ParametersJson {
                sets_range: [3, 5],
                reps_range: [8, 12],
                weight_increment: 2.5,
                minimum_weight: None,
                equipment: Some("barbell".to_string()),
            }),
        };

        let Json(suggestions) = post_suggest(State(test_state()), Json(request))
            .await
            .unwrap();
        assert!(!suggestions.is_empty());
        assert!(suggestions.len() <= 10);
        assert!(
            suggestions
                .iter()
                .all(|s| s.estimated_one_rm > 100.0 && s.estimated_one_rm <= 105.0)
        );
    }

    #[tokio::test]
    async fn test_post_suggest_for_exercise_and_errors() {
        let state = test_state();

        let request = SuggestRequest {
            current_one_rm: None,
            exercise: Some("squat".to_string()),
            params: None,
        };
        assert!(post_suggest(State(state.clone()), Json(request)).await.is_ok());

        let inverted = SuggestRequest {
            current_one_rm: Some(100.0),
            exercise: None,
            params: Some(ParametersJson {
                sets_range: [5, 3],
                reps_range: [8, 12],
                weight_increment: 2.5,
                minimum_weight: Some(20.0),
                equipment: None,
            }),
        };
        let err = post_suggest(State(state.clone()), Json(inverted))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let empty = SuggestRequest {
            current_one_rm: None,
            exercise: None,
            params: None,
        };
        assert!(post_suggest(State(state), Json(empty)).await.is_err());
    }

    #[tokio::test]
    async fn test_post_suggest_rejects_oversized_grid() {
        let request = SuggestRequest {
            current_one_rm: Some(1e9),
            exercise: None,
            params: Some(ParametersJson {
                sets_range: [1, 5],
                reps_range: [1, 4_000_000_000],
                weight_increment: 0.5,
                minimum_weight: Some(0.0),
                equipment: None,
            }),
        };

        let err = post_suggest(State(test_state()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("exceeds the limit"));
    }
}
