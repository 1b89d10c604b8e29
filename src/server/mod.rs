//! HTTP surface: generation, preview and session history.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::agent::{check_inputs, Agent};
use crate::config::{Config, PreviewAssets};
use crate::errors::GenError;
use crate::preview::{build_document, ComponentRegistry, SANDBOX};
use crate::provider::{make_provider, DynProvider};
use crate::session::SessionStore;
use crate::wire::{
    AgentResult, ErrorBody, GenerateRequest, HealthResponse, Message, PreviewRequest, PreviewResponse,
    RegenerateRequest, Version,
};

pub const DOWNLOAD_FILENAME: &str = "generated-ui.tsx";

pub struct AppState {
    pub agent: Agent,
    pub sessions: SessionStore,
    pub registry: ComponentRegistry,
    pub assets: PreviewAssets,
}

impl AppState {
    pub fn new(provider: DynProvider, cfg: &Config) -> Self {
        Self {
            agent: Agent::new(provider),
            sessions: SessionStore::with_idle_ttl(Duration::from_secs(cfg.session_ttl_secs)),
            registry: ComponentRegistry::standard(),
            assets: cfg.preview.clone(),
        }
    }
}

/// Failure rendered as `{ "error": ... }` with a matching status.
pub enum ApiError {
    Gen(GenError),
    /// Body missing, not JSON, or of the wrong shape.
    Body(JsonRejection),
}

impl From<GenError> for ApiError {
    fn from(e: GenError) -> Self {
        ApiError::Gen(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::Body(e)
    }
}

pub fn status_for(e: &GenError) -> StatusCode {
    match e {
        GenError::MissingInput(_) => StatusCode::BAD_REQUEST,
        GenError::Busy(_) => StatusCode::CONFLICT,
        GenError::NotFound(_) => StatusCode::NOT_FOUND,
        GenError::Provider { .. }
        | GenError::MalformedOutput { .. }
        | GenError::DisallowedComponent { .. }
        | GenError::Preview(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Gen(e) => (status_for(&e), e.to_string()),
            ApiError::Body(rejection) => {
                (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", rejection.body_text()))
            }
        };
        if status.is_server_error() {
            log::error!("request failed: {}", error);
        } else {
            log::warn!("request rejected ({}): {}", status.as_u16(), error);
        }
        (status, Json(ErrorBody { error })).into_response()
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/generate", post(generate))
        .route("/preview", post(preview))
        .route("/sessions/:id", delete(delete_session))
        .route("/sessions/:id/messages", get(session_messages))
        .route("/sessions/:id/versions", get(session_versions))
        .route("/sessions/:id/versions/:vid/download", get(download_version))
        .route("/sessions/:id/regenerate", post(regenerate))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn generate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<AgentResult>, ApiError> {
    let Json(req) = body?;
    check_inputs(&req.user_intent, &req.api_key)?;
    let result = match req.session_id.as_deref() {
        Some(id) => run_in_session(&state, id, &req.user_intent, &req.current_code, &req.api_key).await?,
        None => state.agent.run(&req.user_intent, &req.current_code, &req.api_key).await?,
    };
    Ok(Json(result))
}

async fn regenerate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<RegenerateRequest>, JsonRejection>,
) -> Result<Json<AgentResult>, ApiError> {
    let Json(req) = body?;
    let (intent, code) = state.sessions.regenerate_input(&id)?;
    check_inputs(&intent, &req.api_key)?;
    let result = run_in_session(&state, &id, &intent, &code, &req.api_key).await?;
    Ok(Json(result))
}

async fn run_in_session(
    state: &AppState,
    id: &str,
    user_intent: &str,
    current_code: &str,
    api_key: &str,
) -> Result<AgentResult, GenError> {
    let guard = state.sessions.begin(id, user_intent)?;
    match state.agent.run(user_intent, current_code, api_key).await {
        Ok(result) => {
            let version = guard.record_success(user_intent, &result);
            log::info!("session {}: stored version {}", guard.id(), version.id);
            Ok(result)
        }
        Err(e) => {
            guard.record_failure(&e);
            Err(e)
        }
    }
}

async fn preview(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let Json(req) = body?;
    let doc = build_document(&req.code, &state.registry, &state.assets);
    Ok(Json(PreviewResponse {
        document: doc.html,
        sandbox: SANDBOX.to_string(),
        component_name: doc.factory.as_ref().map(|f| f.component_name.clone()),
        factory: doc.factory,
        error: doc.error,
    }))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(&id)?;
    log::info!("session {}: deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn session_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.sessions.messages(&id)?))
}

async fn session_versions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Version>>, ApiError> {
    Ok(Json(state.sessions.versions(&id)?))
}

async fn download_version(
    State(state): State<Arc<AppState>>,
    Path((id, vid)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let version = state.sessions.version(&id, &vid)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{DOWNLOAD_FILENAME}\"")),
        ],
        version.code,
    )
        .into_response())
}

pub async fn serve(cfg: Config) -> anyhow::Result<()> {
    let provider = make_provider(&cfg).context("building provider client")?;
    let state = Arc::new(AppState::new(provider, &cfg));
    let listener = TcpListener::bind(&cfg.bind)
        .await
        .with_context(|| format!("binding {}", cfg.bind))?;
    log::info!(
        "listening on http://{} (provider {:?}, model {})",
        listener.local_addr()?,
        cfg.provider,
        cfg.model()
    );
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&GenError::MissingInput("API key required")), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&GenError::Busy("s".into())), StatusCode::CONFLICT);
        assert_eq!(status_for(&GenError::NotFound("session s".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&GenError::provider(Some(401), "bad key")), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_for(&GenError::DisallowedComponent { found: vec!["Foo".into()] }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
