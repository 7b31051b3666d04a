//! HTTP front end.
//!
//! `POST /api/calc` takes `{"expr": "..."}` and answers with the
//! `{ok, result}` / `{ok, error}` shape. The calculator page and its assets
//! are served from the binary.

use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::assets;
use crate::calculator::{CalcResponse, ErrorKind, Limits, evaluate_expression, input_len};
use crate::config::Config;

/// Shared, read-only request state.
#[derive(Clone, Copy, Debug)]
pub struct AppState {
    pub limits: Limits,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/{*path}", get(static_asset))
        .route("/health", get(health))
        .route("/api/calc", post(calc))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let listener = TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "calculator listening");

    let app = router(AppState {
        limits: config.limits,
    });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
    }
}

fn reply(status: StatusCode, body: CalcResponse) -> Response {
    (status, Json(body)).into_response()
}

/// Pull the expression text out of a request body. Numbers are used in their
/// textual form and booleans as `1` / `0`.
fn expression_text(body: &Value) -> Option<String> {
    match body.get("expr")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

async fn calc(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> Response {
    let Some(expr) = body.ok().and_then(|Json(body)| expression_text(&body)) else {
        return reply(
            StatusCode::BAD_REQUEST,
            CalcResponse::failure("No expression provided"),
        );
    };

    match catch_unwind(AssertUnwindSafe(|| evaluate_expression(&expr, &state.limits))) {
        Ok(result) => {
            let status = result.error_kind().map_or(StatusCode::OK, status_for);
            reply(status, result.to_response())
        }
        Err(_) => {
            tracing::error!(len = input_len(&expr), "evaluation panicked");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                CalcResponse::failure("Internal server error"),
            )
        }
    }
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn index() -> Response {
    serve_asset("index.html")
}

async fn static_asset(Path(path): Path<String>) -> Response {
    serve_asset(&path)
}

fn serve_asset(path: &str) -> Response {
    match assets::get(path) {
        Some(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.data).into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
