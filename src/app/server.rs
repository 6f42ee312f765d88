// src/app/server.rs

use crate::{
    app::{
        layout::{dashboard_layout, Component},
        page::INDEX_HTML,
        registry::{CallbackRegistry, Dependency, UpdateRequest, UpdateResponse},
    },
    config::Settings,
    error::DispatchError,
    process::ObservationTable,
};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<ObservationTable>,
    pub registry: Arc<CallbackRegistry>,
}

impl AppState {
    pub fn new(table: ObservationTable, registry: CallbackRegistry) -> Self {
        Self {
            table: Arc::new(table),
            registry: Arc::new(registry),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/_dash-layout", get(layout))
        .route("/_dash-dependencies", get(dependencies))
        .route("/_dash-update-component", post(update_component))
        .with_state(state)
}

/// Bind `settings.socket_addr()` and serve until Ctrl-C.
pub async fn serve(settings: &Settings, state: AppState) -> Result<()> {
    let addr = settings.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP on {addr}"))?;
    info!(%addr, rows = state.table.len(), "dashboard listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(%e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn layout() -> Json<Component> {
    Json(dashboard_layout())
}

async fn dependencies(State(state): State<AppState>) -> Json<Vec<Dependency>> {
    Json(state.registry.dependencies())
}

async fn update_component(
    State(state): State<AppState>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, DispatchError> {
    let Json(request) = payload.map_err(|e| DispatchError::BadPayload(e.body_text()))?;
    state
        .registry
        .dispatch(&state.table, &request)
        .map(Json)
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = match &self {
            DispatchError::UnknownCallback { .. } => StatusCode::NOT_FOUND,
            DispatchError::NoInputs | DispatchError::BadPayload(_) => StatusCode::BAD_REQUEST,
            DispatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "update failed");
        } else {
            warn!(error = %self, "update rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
