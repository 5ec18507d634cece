//! HTTP server for the Prometheus metrics endpoint and read-only ledger views.
//!
//! Runs on a separate tokio task. Reads are served from the published
//! snapshot and never touch the writer queue. Amounts are rendered as
//! decimal strings in whole units.

use crate::ledger::{Channel, ChannelId, Ledger};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::net::SocketAddr;

#[derive(Clone)]
struct HttpState {
    ledger: Ledger,
    decimals: u32,
}

impl HttpState {
    fn channel_json(&self, channel: &Channel) -> Value {
        json!({
            "id": channel.id,
            "name": channel.name,
            "price": channel.price.to_decimal_string(self.decimals),
        })
    }
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn summary_handler(State(state): State<HttpState>) -> Json<Value> {
    let ledger = &state.ledger;
    let snapshot = ledger.snapshot();
    let treasury = snapshot.treasury();
    Json(json!({
        "name": ledger.name(),
        "symbol": ledger.symbol(),
        "administrator": ledger.administrator(),
        "total_channels": snapshot.total_channels(),
        "total_supply": snapshot.total_supply(),
        "treasury": {
            "balance": treasury.balance.to_decimal_string(state.decimals),
            "collected": treasury.collected.to_decimal_string(state.decimals),
            "withdrawn": treasury.withdrawn.to_decimal_string(state.decimals),
        },
    }))
}

async fn channels_handler(State(state): State<HttpState>) -> Json<Value> {
    let channels = state
        .ledger
        .channels()
        .iter()
        .map(|c| state.channel_json(c))
        .collect();
    Json(Value::Array(channels))
}

async fn channel_handler(State(state): State<HttpState>, Path(id): Path<u64>) -> Response {
    match state.ledger.get_channel(ChannelId(id)) {
        Ok(channel) => Json(state.channel_json(&channel)).into_response(),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": e.error_code(), "message": e.to_string() })),
        )
            .into_response(),
    }
}

pub fn router(ledger: Ledger, decimals: u32) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/ledger", get(summary_handler))
        .route("/channels", get(channels_handler))
        .route("/channels/:id", get(channel_handler))
        .with_state(HttpState { ledger, decimals })
}

/// Run the HTTP server.
///
/// Binds to `0.0.0.0:port`. This is a long-running task that should be
/// spawned in the background.
pub async fn run_http_server(port: u16, ledger: Ledger, decimals: u32) {
    let app = router(ledger, decimals);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTTP server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind HTTP server on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("HTTP server error: {}", e);
    }
}
