use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::server::AppState;

const SERVICE_NAME: &str = "helpdesk-api";

/// GET / - service banner with an endpoint index
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": SERVICE_NAME,
        "version": version,
        "description": "Internal helpdesk ticketing API",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "login": "POST /auth/login (public - token acquisition)",
            "me": "GET /auth/me (protected)",
            "tickets": "GET|POST /tickets, GET /tickets/summary, GET /tickets/:id (protected)",
            "ticket_updates": "PATCH /tickets/:id/status|priority|assign, POST /tickets/:id/comments (protected)",
            "agents": "GET /users/agents (protected)",
        }
    }))
}

/// GET /health - 200 when the store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": SERVICE_NAME,
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "service": SERVICE_NAME,
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
