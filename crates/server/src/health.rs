use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use whispercart_agent::AgentRuntime;

#[derive(Clone)]
pub struct HealthState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub remote_model: HealthCheck,
    pub offer_polish: HealthCheck,
    pub checked_at: String,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { runtime })
}

/// Remote models are optional, so their absence never degrades readiness.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "whispercart-server runtime initialized".to_string(),
        },
        remote_model: optional_check(state.runtime.remote_model(), "local intent extraction only"),
        offer_polish: optional_check(state.runtime.polisher(), "heuristic offers only"),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

fn optional_check(client: Option<&'static str>, local_detail: &str) -> HealthCheck {
    match client {
        Some(name) => HealthCheck { status: "configured", detail: format!("{name} client ready") },
        None => HealthCheck { status: "disabled", detail: local_detail.to_string() },
    }
}
