//! Request and response DTOs for the Agent Memory Platform HTTP API.

use serde::{Deserialize, Serialize};

/// Importance sent when the caller does not pick one.
pub const DEFAULT_IMPORTANCE: u8 = 5;
/// `limit` sent by retrieve_memories when the caller does not pick one.
pub const DEFAULT_RETRIEVE_LIMIT: u32 = 10;
/// `topK` sent by rag_query when the caller does not pick one.
pub const DEFAULT_TOP_K: u32 = 5;

/// Memory classification understood by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryType {
    ShortTerm,
    #[default]
    Episodic,
    Semantic,
    Procedural,
    Reflection,
}

impl MemoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryType::ShortTerm => "short-term",
            MemoryType::Episodic => "episodic",
            MemoryType::Semantic => "semantic",
            MemoryType::Procedural => "procedural",
            MemoryType::Reflection => "reflection",
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RAG workflow run by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RagMode {
    #[default]
    Standard,
    Agentic,
}

impl RagMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RagMode::Standard => "standard",
            RagMode::Agentic => "agentic",
        }
    }
}

impl std::fmt::Display for RagMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional arguments of store_memory (defaults: episodic, importance 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreMemoryOptions {
    pub memory_type: MemoryType,
    pub importance: u8,
}

impl Default for StoreMemoryOptions {
    fn default() -> Self {
        Self {
            memory_type: MemoryType::Episodic,
            importance: DEFAULT_IMPORTANCE,
        }
    }
}

impl StoreMemoryOptions {
    pub fn with_type(mut self, memory_type: MemoryType) -> Self {
        self.memory_type = memory_type;
        self
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance;
        self
    }
}

/// Optional arguments of retrieve_memories (default limit 10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieveOptions {
    pub limit: u32,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RETRIEVE_LIMIT,
        }
    }
}

impl RetrieveOptions {
    pub fn with_limit(limit: u32) -> Self {
        Self { limit }
    }
}

/// Optional arguments of rag_query (defaults: standard mode, top 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RagOptions {
    pub mode: RagMode,
    pub top_k: u32,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            mode: RagMode::Standard,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl RagOptions {
    pub fn with_mode(mut self, mode: RagMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Body of `POST /agents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub user_id: String,
    pub name: String,
}

/// Body of `POST /agents/{agentId}/memories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMemoryRequest {
    pub content: String,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    #[serde(default = "default_importance")]
    pub importance: u8,
}

fn default_importance() -> u8 {
    DEFAULT_IMPORTANCE
}

impl StoreMemoryRequest {
    pub fn new(content: impl Into<String>, opts: StoreMemoryOptions) -> Self {
        Self {
            content: content.into(),
            memory_type: opts.memory_type,
            importance: opts.importance,
        }
    }
}

/// Query string of `GET /agents/{agentId}/memories`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveMemoriesQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_RETRIEVE_LIMIT
}

impl From<RetrieveOptions> for RetrieveMemoriesQuery {
    fn from(opts: RetrieveOptions) -> Self {
        Self { limit: opts.limit }
    }
}

/// Body of `POST /agents/{agentId}/rag/retrieve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagQueryRequest {
    pub query: String,
    #[serde(default)]
    pub mode: RagMode,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

impl RagQueryRequest {
    pub fn new(query: impl Into<String>, opts: RagOptions) -> Self {
        Self {
            query: query.into(),
            mode: opts.mode,
            top_k: opts.top_k,
        }
    }
}

/// Body of `POST /agents/{agentId}/sessions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Response of `POST /agents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCreated {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// Response of `GET /agents/{agentId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// `{id}` returned by memory and session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: String,
}

/// One stored memory as listed by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    pub id: String,
    pub agent_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    pub importance: u8,
    pub created_at: String,
}

/// Response of `GET /agents/{agentId}/memories`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryList {
    pub memories: Vec<MemoryRecord>,
}

/// A memory used as RAG context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSource {
    pub id: String,
    pub content: String,
    pub score: f64,
    pub importance: u8,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagMetadata {
    /// Milliseconds spent retrieving.
    pub retrieval_time: u64,
    pub total_results: usize,
    pub mode: RagMode,
}

/// Response of `POST /agents/{agentId}/rag/retrieve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagResult {
    pub augmented_prompt: String,
    #[serde(default)]
    pub sources: Vec<RagSource>,
    pub metadata: RagMetadata,
}

/// Error envelope: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn store_memory_defaults_are_episodic_and_five() {
        let req = StoreMemoryRequest::new("User prefers dark mode", StoreMemoryOptions::default());
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({ "content": "User prefers dark mode", "type": "episodic", "importance": 5 })
        );
    }

    #[test]
    fn rag_request_uses_camel_case_top_k() {
        let req = RagQueryRequest::new("q", RagOptions::default().with_top_k(3));
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({ "query": "q", "mode": "standard", "topK": 3 }));
    }

    #[test]
    fn create_agent_uses_user_id_key() {
        let req = CreateAgentRequest {
            user_id: "user-123".into(),
            name: "My Assistant".into(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({ "userId": "user-123", "name": "My Assistant" }));
    }

    #[test]
    fn memory_type_wire_names() {
        assert_eq!(serde_json::to_value(MemoryType::ShortTerm).unwrap(), json!("short-term"));
        let t: MemoryType = serde_json::from_value(json!("procedural")).unwrap();
        assert_eq!(t, MemoryType::Procedural);
        assert_eq!(MemoryType::Semantic.to_string(), "semantic");
    }

    #[test]
    fn server_side_defaults_fill_missing_fields() {
        let req: RagQueryRequest = serde_json::from_value(json!({ "query": "hi" })).unwrap();
        assert_eq!(req.mode, RagMode::Standard);
        assert_eq!(req.top_k, DEFAULT_TOP_K);

        let q: RetrieveMemoriesQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(q.limit, DEFAULT_RETRIEVE_LIMIT);
    }

    #[test]
    fn store_memory_type_is_required() {
        let missing = serde_json::from_value::<StoreMemoryRequest>(json!({ "content": "x", "importance": 5 }));
        assert!(missing.is_err());
        let req: StoreMemoryRequest =
            serde_json::from_value(json!({ "content": "x", "type": "semantic" })).unwrap();
        assert_eq!(req.importance, DEFAULT_IMPORTANCE);
    }

    #[test]
    fn session_metadata_omitted_when_none() {
        let v = serde_json::to_value(CreateSessionRequest::default()).unwrap();
        assert_eq!(v, json!({}));
    }
}
