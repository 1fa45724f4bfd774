//! Client trait and error type.

use crate::{RagOptions, RetrieveOptions, StoreMemoryOptions};
use async_trait::async_trait;
use serde_json::Value;

/// Operations of the Agent Memory Platform API.
///
/// Each call performs one round trip and returns the decoded response body
/// as-is; callers pick typed views with `serde_json::from_value` if they want
/// them.
#[async_trait]
pub trait AgentMemoryApi: Send + Sync {
    /// `POST /agents` with `{userId, name}`.
    async fn create_agent(&self, user_id: &str, name: &str) -> Result<Value, ClientError>;

    /// `GET /agents/{agentId}`.
    async fn get_agent(&self, agent_id: &str) -> Result<Value, ClientError>;

    /// `DELETE /agents/{agentId}`.
    async fn delete_agent(&self, agent_id: &str) -> Result<Value, ClientError>;

    /// `POST /agents/{agentId}/memories` with `{content, type, importance}`.
    async fn store_memory(
        &self,
        agent_id: &str,
        content: &str,
        opts: StoreMemoryOptions,
    ) -> Result<Value, ClientError>;

    /// `GET /agents/{agentId}/memories?limit=N`.
    async fn retrieve_memories(
        &self,
        agent_id: &str,
        opts: RetrieveOptions,
    ) -> Result<Value, ClientError>;

    /// `DELETE /agents/{agentId}/memories/{memoryId}`.
    async fn delete_memory(&self, agent_id: &str, memory_id: &str) -> Result<Value, ClientError>;

    /// `POST /agents/{agentId}/rag/retrieve` with `{query, mode, topK}`.
    async fn rag_query(
        &self,
        agent_id: &str,
        query: &str,
        opts: RagOptions,
    ) -> Result<Value, ClientError>;

    /// `POST /agents/{agentId}/sessions`.
    async fn create_session(
        &self,
        agent_id: &str,
        metadata: Option<Value>,
    ) -> Result<Value, ClientError>;

    /// `DELETE /agents/{agentId}/sessions/{sessionId}`.
    async fn end_session(&self, agent_id: &str, session_id: &str) -> Result<Value, ClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("config error: {0}")]
    Config(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
}
