//! Axum server and routes.

use crate::rag;
use amp_types::{
    Agent, AgentCreated, ApiErrorBody, CreateAgentRequest, CreateSessionRequest, Created,
    MemoryList, MemoryRecord, RagMetadata, RagQueryRequest, RagResult, RetrieveMemoriesQuery,
    StoreMemoryRequest,
};
use axum::{
    body::{Body, Bytes},
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

const MAX_BODY_BYTES: usize = 1024 * 1024;
const MAX_CONTENT_CHARS: usize = 10_000;

/// One request as seen by the server, before routing.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    /// Parsed JSON body; a non-JSON body is kept as a JSON string.
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
struct StubResponse {
    status: StatusCode,
    body: String,
}

/// Process-lifetime platform state.
pub struct AppState {
    api_key: String,
    agents: RwLock<HashMap<String, Agent>>,
    /// Per agent, oldest first.
    memories: RwLock<HashMap<String, Vec<MemoryRecord>>>,
    /// Session id to owning agent id.
    sessions: RwLock<HashMap<String, String>>,
    requests: RwLock<Vec<RecordedRequest>>,
    stubs: RwLock<HashMap<(String, String), StubResponse>>,
}

impl AppState {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            agents: RwLock::new(HashMap::new()),
            memories: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            requests: RwLock::new(Vec::new()),
            stubs: RwLock::new(HashMap::new()),
        }
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.read().await.last().cloned()
    }

    /// Answer `method path` (full path, e.g. `/v1/agents`) with `status` and a JSON body.
    pub async fn stub_json(&self, method: &str, path: &str, status: u16, body: serde_json::Value) {
        self.stub_raw(method, path, status, body.to_string()).await;
    }

    /// Answer `method path` with `status` and a raw body (need not be JSON).
    pub async fn stub_raw(&self, method: &str, path: &str, status: u16, body: impl Into<String>) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.stubs.write().await.insert(
            (method.to_ascii_uppercase(), path.to_string()),
            StubResponse {
                status,
                body: body.into(),
            },
        );
    }

    async fn stub_for(&self, method: &str, path: &str) -> Option<StubResponse> {
        self.stubs
            .read()
            .await
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.api_key);
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v == expected)
            .unwrap_or(false)
    }

    /// Number of memories currently stored for `agent_id`.
    pub async fn memory_count(&self, agent_id: &str) -> usize {
        self.memories
            .read()
            .await
            .get(agent_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    async fn agent_exists(&self, agent_id: &str) -> bool {
        self.agents.read().await.contains_key(agent_id)
    }
}

/// Error answered as `{"error": {"code", "message"}}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ApiErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody::new(code, message),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "missing or invalid bearer token",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/agents", post(handle_create_agent))
        .route(
            "/agents/:agent_id",
            get(handle_get_agent).delete(handle_delete_agent),
        )
        .route(
            "/agents/:agent_id/memories",
            post(handle_store_memory).get(handle_retrieve_memories),
        )
        .route(
            "/agents/:agent_id/memories/:memory_id",
            delete(handle_delete_memory),
        )
        .route("/agents/:agent_id/sessions", post(handle_create_session))
        .route(
            "/agents/:agent_id/sessions/:session_id",
            delete(handle_end_session),
        )
        .route("/agents/:agent_id/rag/retrieve", post(handle_rag_retrieve));
    Router::new()
        .nest("/v1", api)
        .layer(middleware::from_fn_with_state(Arc::clone(&state), gate))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `127.0.0.1:0`, serve in the background and return the bound address.
pub async fn spawn(state: Arc<AppState>) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(state);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app.into_make_service()).await {
            tracing::error!(error = %e, "mock platform stopped");
        }
    });
    tracing::debug!(%addr, "mock platform listening");
    Ok(addr)
}

/// Client base URL for a server bound at `addr`.
pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{}/v1", addr)
}

/// Records the request, then answers a stub, rejects bad tokens, or routes.
async fn gate(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => return ApiError::validation(format!("unreadable body: {}", e)).into_response(),
    };
    let header_str = |name: header::HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let recorded = RecordedRequest {
        method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(String::from),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        body: recorded_body(&bytes),
    };
    tracing::debug!(method = %recorded.method, path = %recorded.path, "request");
    state.requests.write().await.push(recorded);

    if let Some(stub) = state
        .stub_for(parts.method.as_str(), parts.uri.path())
        .await
    {
        return (
            stub.status,
            [(header::CONTENT_TYPE, "application/json")],
            stub.body,
        )
            .into_response();
    }
    if !state.authorized(&parts.headers) {
        return ApiError::unauthorized().into_response();
    }
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn recorded_body(bytes: &Bytes) -> Option<serde_json::Value> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(v) => Some(v),
        Err(_) => Some(serde_json::Value::String(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
    }
}

fn parse_body<T: serde::de::DeserializeOwned + Default>(bytes: &Bytes) -> Result<T, ApiError> {
    if bytes.is_empty() {
        return Ok(T::default());
    }
    parse_required(bytes)
}

fn parse_required<T: serde::de::DeserializeOwned>(bytes: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::validation(e.to_string()))
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

async fn handle_create_agent(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let req: CreateAgentRequest = parse_required(&body)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let id = Uuid::new_v4().to_string();
    let created_at = now();
    let agent = Agent {
        id: id.clone(),
        user_id: req.user_id,
        name: req.name.clone(),
        created_at: created_at.clone(),
        updated_at: created_at.clone(),
    };
    state.agents.write().await.insert(id.clone(), agent);
    tracing::info!(agent_id = %id, "agent created");
    Ok((
        StatusCode::CREATED,
        Json(AgentCreated {
            id,
            name: req.name,
            created_at,
        }),
    )
        .into_response())
}

async fn handle_get_agent(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Json<Agent>, ApiError> {
    state
        .agents
        .read()
        .await
        .get(&agent_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Agent not found"))
}

async fn handle_delete_agent(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut agents = state.agents.write().await;
    if agents.remove(&agent_id).is_none() {
        return Err(ApiError::not_found("Agent not found"));
    }
    state.memories.write().await.remove(&agent_id);
    state
        .sessions
        .write()
        .await
        .retain(|_, owner| *owner != agent_id);
    drop(agents);
    tracing::info!(agent_id = %agent_id, "agent deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_store_memory(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let req: StoreMemoryRequest = parse_required(&body)?;
    let chars = req.content.chars().count();
    if chars == 0 || chars > MAX_CONTENT_CHARS {
        return Err(ApiError::validation(format!(
            "content must be 1..={} characters",
            MAX_CONTENT_CHARS
        )));
    }
    if !(1..=10).contains(&req.importance) {
        return Err(ApiError::validation("importance must be between 1 and 10"));
    }
    // Held across the insert so a concurrent agent delete cannot orphan it.
    let agents = state.agents.read().await;
    if !agents.contains_key(&agent_id) {
        return Err(ApiError::not_found("Agent not found"));
    }
    let id = Uuid::new_v4().to_string();
    let record = MemoryRecord {
        id: id.clone(),
        agent_id: agent_id.clone(),
        content: req.content,
        memory_type: req.memory_type,
        importance: req.importance,
        created_at: now(),
    };
    state
        .memories
        .write()
        .await
        .entry(agent_id.clone())
        .or_default()
        .push(record);
    drop(agents);
    tracing::info!(agent_id = %agent_id, memory_id = %id, "memory stored");
    Ok((StatusCode::CREATED, Json(Created { id })).into_response())
}

async fn handle_retrieve_memories(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    query: Result<Query<RetrieveMemoriesQuery>, QueryRejection>,
) -> Result<Json<MemoryList>, ApiError> {
    if !state.agent_exists(&agent_id).await {
        return Err(ApiError::not_found("Agent not found"));
    }
    let Query(RetrieveMemoriesQuery { limit }) =
        query.map_err(|e| ApiError::validation(e.body_text()))?;
    if !(1..=1000).contains(&limit) {
        return Err(ApiError::validation("limit must be between 1 and 1000"));
    }
    let guard = state.memories.read().await;
    let memories: Vec<MemoryRecord> = guard
        .get(&agent_id)
        .map(|all| all.iter().rev().take(limit as usize).cloned().collect())
        .unwrap_or_default();
    Ok(Json(MemoryList { memories }))
}

async fn handle_delete_memory(
    State(state): State<Arc<AppState>>,
    Path((agent_id, memory_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let mut guard = state.memories.write().await;
    let list = guard
        .get_mut(&agent_id)
        .ok_or_else(|| ApiError::not_found("Memory not found"))?;
    let before = list.len();
    list.retain(|m| m.id != memory_id);
    if list.len() == before {
        return Err(ApiError::not_found("Memory not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_create_session(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let req: CreateSessionRequest = parse_body(&body)?;
    let agents = state.agents.read().await;
    if !agents.contains_key(&agent_id) {
        return Err(ApiError::not_found("Agent not found"));
    }
    let id = Uuid::new_v4().to_string();
    tracing::info!(
        agent_id = %agent_id,
        session_id = %id,
        has_metadata = req.metadata.is_some(),
        "session started"
    );
    state.sessions.write().await.insert(id.clone(), agent_id);
    drop(agents);
    Ok((StatusCode::CREATED, Json(Created { id })).into_response())
}

async fn handle_end_session(
    State(state): State<Arc<AppState>>,
    Path((agent_id, session_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let mut guard = state.sessions.write().await;
    let owned = guard
        .get(&session_id)
        .map(|owner| *owner == agent_id)
        .unwrap_or(false);
    if !owned {
        return Err(ApiError::not_found("Session not found"));
    }
    guard.remove(&session_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_rag_retrieve(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    body: Bytes,
) -> Result<Json<RagResult>, ApiError> {
    let started = std::time::Instant::now();
    if !state.agent_exists(&agent_id).await {
        return Err(ApiError::not_found("Agent not found"));
    }
    let req: RagQueryRequest = parse_required(&body)?;
    if req.query.trim().is_empty() {
        return Err(ApiError::validation("query must not be empty"));
    }
    if !(1..=100).contains(&req.top_k) {
        return Err(ApiError::validation("topK must be between 1 and 100"));
    }
    let sources = {
        let guard = state.memories.read().await;
        let memories = guard.get(&agent_id).map(Vec::as_slice).unwrap_or(&[]);
        rag::rank(memories, &req.query, req.top_k as usize)
    };
    let augmented_prompt = rag::build_augmented_prompt(&req.query, &sources);
    tracing::info!(
        agent_id = %agent_id,
        mode = %req.mode,
        sources = sources.len(),
        "rag retrieve"
    );
    Ok(Json(RagResult {
        augmented_prompt,
        metadata: RagMetadata {
            retrieval_time: started.elapsed().as_millis() as u64,
            total_results: sources.len(),
            mode: req.mode,
        },
        sources,
    }))
}

async fn handle_health() -> &'static str {
    "ok"
}
