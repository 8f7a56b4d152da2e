use axum::{
    response::Html,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{api, AppState};
use crate::config::ServerSettings;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(serve_table_page))
        // Table endpoints
        .route("/start_new_shoe", post(api::post_start_new_shoe))
        .route("/add_game", post(api::post_add_game))
        .route("/predict_sequence", post(api::post_predict_sequence))
        .route("/provide_feedback", post(api::post_provide_feedback))
        .route("/end_current_shoe", post(api::post_end_current_shoe))
        // API endpoints
        .route("/api/health", get(api::health_check))
        .route("/api/status", get(api::get_status))
        .route("/api/config", get(api::get_config))
        .route("/api/config/engine", put(api::put_engine_settings))
        // WebSocket
        .route("/ws", get(api::websocket_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(state: AppState, settings: &ServerSettings) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    info!("Prediction server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn serve_table_page() -> Html<&'static str> {
    Html(TABLE_HTML)
}

const TABLE_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Baccarat Oracle</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #0f1419; color: #e7e9ea; padding: 2rem;
        }
        h1 { color: #1da1f2; margin-bottom: 1rem; }
        .card {
            background: #16202a; border: 1px solid #2f3336; border-radius: 12px;
            padding: 1.25rem; margin-bottom: 1rem; max-width: 720px;
        }
        input, button { padding: 0.5rem; margin: 0.25rem; border-radius: 6px; border: 1px solid #2f3336; }
        button { background: #1da1f2; color: #fff; cursor: pointer; }
        pre { white-space: pre-wrap; font-size: 0.85rem; color: #8b98a5; }
    </style>
</head>
<body>
    <h1>Baccarat Oracle</h1>
    <div class="card">
        <div id="status">connecting...</div>
        <button onclick="post('/start_new_shoe', {})">Start new shoe</button>
        <button onclick="post('/end_current_shoe', {})">End shoe</button>
    </div>
    <div class="card">
        <input id="player" placeholder="Player hand (9-K)">
        <input id="banker" placeholder="Banker hand (2-3)">
        <input id="outcome" placeholder="Player / Banker / Tie">
        <button onclick="addGame()">Add round</button>
    </div>
    <div class="card">
        <input id="sequence" placeholder="P,B,P,B,P" size="40">
        <button onclick="predict()">Predict</button>
        <pre id="result"></pre>
    </div>
    <script>
        async function post(path, body) {
            const res = await fetch(path, {
                method: 'POST',
                headers: {'Content-Type': 'application/json'},
                body: JSON.stringify(body)
            });
            const data = await res.json();
            document.getElementById('result').textContent = JSON.stringify(data, null, 2);
            return data;
        }
        function addGame() {
            post('/add_game', {
                player_hand: document.getElementById('player').value,
                banker_hand: document.getElementById('banker').value,
                outcome: document.getElementById('outcome').value
            });
        }
        function predict() {
            const outcomes = document.getElementById('sequence').value
                .split(/[\s,]+/).filter(s => s.length > 0);
            post('/predict_sequence', {outcomes});
        }
        const ws = new WebSocket(`ws://${location.host}/ws`);
        ws.onmessage = (msg) => {
            const event = JSON.parse(msg.data);
            if (event.type === 'Status' && event.data) {
                const s = event.data;
                document.getElementById('status').textContent = s.is_active
                    ? `${s.shoe_id} active, ${s.current_shoe_rounds} rounds`
                    : 'no active shoe';
            } else {
                fetch('/api/status').then(r => r.json()).then(s => {
                    document.getElementById('status').textContent = s.is_active
                        ? `${s.shoe_id} active, ${s.current_shoe_rounds} rounds`
                        : 'no active shoe';
                });
            }
        };
    </script>
</body>
</html>
"##;
