//! Rotas HTTP: CRUD de itens, geração de texto e comandos em linguagem natural.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cadastro_core::{
    CommandError, CommandPipeline, GenerationError, GenerationOptions, GenerationService, RecordStore, StoreError,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Estado compartilhado da aplicação
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub generator: Arc<dyn GenerationService>,
    pub pipeline: CommandPipeline,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, generator: Arc<dyn GenerationService>) -> Self {
        let pipeline = CommandPipeline::new(store.clone(), generator.clone());
        Self {
            store,
            generator,
            pipeline,
        }
    }
}

/// Corpo de `/ai/generate` e `/ai/command`.
#[derive(Deserialize)]
struct PromptRequest {
    #[serde(default)]
    prompt: Option<String>,
}

/// Erro devolvido como `{"error": "..."}`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Item não encontrado")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        error!(error = %e, "Falha no store");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno do servidor")
    }
}

impl From<CommandError> for ApiError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::Store(e) => e.into(),
            other => {
                let status = StatusCode::from_u16(other.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
                Self::new(status, other.to_string())
            }
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/ai/generate", post(generate))
        .route("/ai/command", post(command));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request("ID inválido"))
}

/// Corpo JSON que precisa ser um objeto.
fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<serde_json::Map<String, Value>, ApiError> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        _ => Err(ApiError::bad_request("Dados inválidos")),
    }
}

/// `prompt` não vazio do corpo da requisição.
fn prompt_of(body: Result<Json<PromptRequest>, JsonRejection>) -> Result<String, ApiError> {
    body.ok()
        .and_then(|Json(req)| req.prompt)
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Campo prompt é obrigatório"))
}

async fn list_items(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.store.list().await?))
}

async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    state
        .store
        .list()
        .await?
        .into_iter()
        .find(|r| r.id == id)
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

async fn create_item(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = object_body(body)?;
    if payload.is_empty() {
        return Err(ApiError::bad_request("Dados inválidos"));
    }
    let record = state.store.create(payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let patch = object_body(body)?;
    state
        .store
        .update(id, patch)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if state.store.remove(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found())
    }
}

async fn generate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let prompt = prompt_of(body)?;
    match state.generator.generate(&prompt, GenerationOptions::default()).await {
        Ok(output) => Ok(Json(json!({ "output": output }))),
        Err(GenerationError::NotConfigured) => Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Serviço de geração não configurado",
        )),
        Err(e) => {
            warn!(error = %e, "Falha na geração de texto");
            Err(ApiError::new(StatusCode::BAD_GATEWAY, "Falha ao gerar texto"))
        }
    }
}

async fn command(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let prompt = prompt_of(body)?;
    Ok(Json(state.pipeline.run(&prompt).await?))
}
