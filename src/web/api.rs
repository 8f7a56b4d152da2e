use axum::{
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::{debug, error, info};

use super::AppState;
use crate::config::EngineConfig;
use crate::engine::{TableError, TableEvent};
use crate::feedback::PredictionSnapshot;
use crate::types::Outcome;

fn error_response(status: StatusCode, message: impl ToString) -> Response {
    (status, Json(json!({"error": message.to_string()}))).into_response()
}

/// Rejections are the caller's fault; anything else is a storage failure
fn table_error(e: TableError) -> Response {
    if e.is_rejection() {
        error_response(StatusCode::BAD_REQUEST, e)
    } else {
        error!("Storage failure: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
    }
}

// === Shoe & Round Endpoints ===

pub async fn post_start_new_shoe(State(state): State<AppState>) -> Response {
    match state.table.start_shoe().await {
        Ok(start) => (
            StatusCode::CREATED,
            Json(json!({"message": format!("Successfully started {}.", start.started)})),
        )
            .into_response(),
        Err(e) => table_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct AddGameRequest {
    #[serde(default)]
    pub player_hand: String,
    #[serde(default)]
    pub banker_hand: String,
    #[serde(default)]
    pub outcome: String,
}

pub async fn post_add_game(State(state): State<AppState>, Json(req): Json<AddGameRequest>) -> Response {
    if req.player_hand.trim().is_empty() || req.banker_hand.trim().is_empty() || req.outcome.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "All fields are required.");
    }
    let outcome = match Outcome::from_str(&req.outcome) {
        Ok(outcome) => outcome,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    match state.table.record_round(&req.player_hand, &req.banker_hand, outcome).await {
        Ok(round) => (
            StatusCode::CREATED,
            Json(json!({
                "message": format!("Game added to {}, round {}.", round.shoe_id, round.round_index),
                "round": round,
            })),
        )
            .into_response(),
        Err(e) => table_error(e),
    }
}

pub async fn post_end_current_shoe(State(state): State<AppState>) -> Response {
    match state.table.end_shoe().await {
        Ok(shoe_id) => (
            StatusCode::OK,
            Json(json!({"message": format!("Successfully ended {}.", shoe_id)})),
        )
            .into_response(),
        Err(e) => table_error(e),
    }
}

// === Prediction Endpoints ===

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub outcomes: Vec<String>,
}

pub async fn post_predict_sequence(State(state): State<AppState>, Json(req): Json<PredictRequest>) -> Response {
    let sequence = match req
        .outcomes
        .iter()
        .map(|raw| Outcome::from_str(raw))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(sequence) => sequence,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    debug!("Prediction requested for {} rounds", sequence.len());
    match state.table.predict(&sequence).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => table_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub prediction_data: PredictionSnapshot,
    pub actual_outcome: Outcome,
}

pub async fn post_provide_feedback(State(state): State<AppState>, Json(req): Json<FeedbackRequest>) -> Response {
    match state.table.record_feedback(req.prediction_data, req.actual_outcome).await {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({"message": "Feedback recorded successfully", "was_correct": record.was_correct})),
        )
            .into_response(),
        Err(e) => table_error(e),
    }
}

// === Status & Configuration Endpoints ===

pub async fn get_status(State(state): State<AppState>) -> Response {
    match state.table.status().await {
        Ok(status) => Json(status).into_response(),
        Err(e) => table_error(e),
    }
}

pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.config_manager.get_config().await)
}

pub async fn put_engine_settings(State(state): State<AppState>, Json(settings): Json<EngineConfig>) -> Response {
    match state.config_manager.update_engine(settings).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "message": "Engine settings updated"})),
        )
            .into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e),
    }
}

// === WebSocket Handler ===

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.table.subscribe();

    info!("WebSocket client connected");

    let initial = match state.table.status().await {
        Ok(status) => serde_json::to_string(&TableEvent::Status(status)),
        Err(e) => serde_json::to_string(&json!({"type": "Status", "error": e.to_string()})),
    };
    if let Ok(json_str) = initial {
        let _ = sender.send(Message::Text(json_str)).await;
    }

    let mut config_rx = state.config_manager.subscribe();
    let send_task = tokio::spawn(async move {
        loop {
            let json = tokio::select! {
                event = rx.recv() => match event {
                    Ok(event) => serde_json::to_string(&event),
                    Err(_) => break,
                },
                change = config_rx.recv() => match change {
                    Ok(change) => serde_json::to_string(&json!({"type": "ConfigChange", "data": change})),
                    Err(_) => break,
                },
            };
            if let Ok(json) = json {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => {
                info!("WebSocket client disconnected");
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
}

// === Health Check ===

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
