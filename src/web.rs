// HBNB - Web view
// HTML pages and a small JSON API with Axum

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::StorageError;
use crate::models::ModelKind;
use crate::storage::Storage;
use crate::views;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Mutex<Box<dyn Storage>>>,
}

impl AppState {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// Run one unit of work, then close the storage session whatever happened
    fn with_storage<R>(
        &self,
        work: impl FnOnce(&mut dyn Storage) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        let mut storage = self.storage.lock().unwrap_or_else(|e| e.into_inner());
        let result = work(storage.as_mut());
        if let Err(e) = storage.close() {
            tracing::warn!(error = %e, "closing storage session failed");
        }
        result
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<Vec<Value>> {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            error: Some(error),
        }
    }
}

fn html_error(e: StorageError) -> Response {
    tracing::error!(error = %e, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Html(views::escape_html(&e.to_string()))).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /states_list - States sorted by name
async fn states_list(State(state): State<AppState>) -> Response {
    match state.with_storage(|storage| views::sorted_states(storage)) {
        Ok(states) => Html(views::render_states_list(&states)).into_response(),
        Err(e) => html_error(e),
    }
}

/// GET /cities_by_states - States with their cities
async fn cities_by_states(State(state): State<AppState>) -> Response {
    match state.with_storage(|storage| views::states_with_cities(storage)) {
        Ok(groups) => Html(views::render_cities_by_states(&groups)).into_response(),
        Err(e) => html_error(e),
    }
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/:class - Serialized entities of one class
async fn list_class(State(state): State<AppState>, Path(class): Path<String>) -> Response {
    let kind: ModelKind = match class.parse() {
        Ok(kind) => kind,
        Err(e) => {
            return (StatusCode::NOT_FOUND, Json(ApiResponse::failed(e.to_string()))).into_response()
        }
    };

    match state.with_storage(|storage| storage.query(Some(kind))) {
        Ok(objects) => {
            let data: Vec<Value> = objects
                .values()
                .map(|model| Value::Object(model.to_dict()))
                .collect();
            (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, class = %kind, "listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failed(e.to_string())),
            )
                .into_response()
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/:class", get(list_class))
        .with_state(state.clone());

    Router::new()
        .route("/states_list", get(states_list))
        .route("/cities_by_states", get(cities_by_states))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
