//! reqwest implementation of `AgentMemoryApi`.

use crate::config::{ClientConfig, StatusPolicy};
use amp_types::{
    AgentMemoryApi, ClientError, CreateAgentRequest, CreateSessionRequest, RagOptions,
    RagQueryRequest, RetrieveMemoriesQuery, RetrieveOptions, StoreMemoryOptions,
    StoreMemoryRequest,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;

/// Client that talks to the platform over HTTP.
///
/// Every request carries `Authorization: Bearer <api key>` and
/// `Content-Type: application/json`. Cloning is cheap and clones share the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpAgentMemoryClient {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    status_policy: StatusPolicy,
}

impl HttpAgentMemoryClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Use a caller-built reqwest client (timeouts, proxies, TLS settings).
    pub fn with_client(config: ClientConfig, client: reqwest::Client) -> Result<Self, ClientError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| ClientError::Config(format!("invalid API key: {}", e)))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
            status_policy: config.status_policy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "platform request");
        self.client
            .request(method, url)
            .headers(self.headers.clone())
    }

    async fn execute(&self, req: RequestBuilder) -> Result<Value, ClientError> {
        let res = req
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        if !status.is_success() {
            match self.status_policy {
                StatusPolicy::Strict => {
                    return Err(ClientError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                StatusPolicy::Passthrough => {
                    tracing::warn!(status = status.as_u16(), "platform returned non-success status");
                }
            }
        }
        decode_body(status, &body)
    }
}

/// Only `204 No Content` may come back without a body; it decodes to `Null`.
fn decode_body(status: StatusCode, body: &str) -> Result<Value, ClientError> {
    if status == StatusCode::NO_CONTENT && body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl AgentMemoryApi for HttpAgentMemoryClient {
    async fn create_agent(&self, user_id: &str, name: &str) -> Result<Value, ClientError> {
        let body = CreateAgentRequest {
            user_id: user_id.to_string(),
            name: name.to_string(),
        };
        self.execute(self.request(Method::POST, "/agents").json(&body))
            .await
    }

    async fn get_agent(&self, agent_id: &str) -> Result<Value, ClientError> {
        self.execute(self.request(Method::GET, &format!("/agents/{}", agent_id)))
            .await
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<Value, ClientError> {
        self.execute(self.request(Method::DELETE, &format!("/agents/{}", agent_id)))
            .await
    }

    async fn store_memory(
        &self,
        agent_id: &str,
        content: &str,
        opts: StoreMemoryOptions,
    ) -> Result<Value, ClientError> {
        let body = StoreMemoryRequest::new(content, opts);
        let path = format!("/agents/{}/memories", agent_id);
        self.execute(self.request(Method::POST, &path).json(&body))
            .await
    }

    async fn retrieve_memories(
        &self,
        agent_id: &str,
        opts: RetrieveOptions,
    ) -> Result<Value, ClientError> {
        let query = RetrieveMemoriesQuery::from(opts);
        let path = format!("/agents/{}/memories", agent_id);
        self.execute(self.request(Method::GET, &path).query(&query))
            .await
    }

    async fn delete_memory(&self, agent_id: &str, memory_id: &str) -> Result<Value, ClientError> {
        let path = format!("/agents/{}/memories/{}", agent_id, memory_id);
        self.execute(self.request(Method::DELETE, &path)).await
    }

    async fn rag_query(
        &self,
        agent_id: &str,
        query: &str,
        opts: RagOptions,
    ) -> Result<Value, ClientError> {
        let body = RagQueryRequest::new(query, opts);
        let path = format!("/agents/{}/rag/retrieve", agent_id);
        self.execute(self.request(Method::POST, &path).json(&body))
            .await
    }

    async fn create_session(
        &self,
        agent_id: &str,
        metadata: Option<Value>,
    ) -> Result<Value, ClientError> {
        let body = CreateSessionRequest { metadata };
        let path = format!("/agents/{}/sessions", agent_id);
        self.execute(self.request(Method::POST, &path).json(&body))
            .await
    }

    async fn end_session(&self, agent_id: &str, session_id: &str) -> Result<Value, ClientError> {
        let path = format!("/agents/{}/sessions/{}", agent_id, session_id);
        self.execute(self.request(Method::DELETE, &path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_trimmed() {
        let c = HttpAgentMemoryClient::new(ClientConfig::new("http://localhost:3000/v1/", "k"))
            .unwrap();
        assert_eq!(c.base_url(), "http://localhost:3000/v1");
    }

    #[test]
    fn status_policy_comes_from_config() {
        let c = HttpAgentMemoryClient::new(ClientConfig::new("http://x", "k")).unwrap();
        assert_eq!(c.status_policy(), StatusPolicy::Passthrough);
        let c = HttpAgentMemoryClient::new(
            ClientConfig::new("http://x", "k").with_status_policy(StatusPolicy::Strict),
        )
        .unwrap();
        assert_eq!(c.status_policy(), StatusPolicy::Strict);
    }

    #[test]
    fn api_key_with_newline_rejected() {
        let err = HttpAgentMemoryClient::new(ClientConfig::new("http://x", "bad\nkey")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn no_content_decodes_to_null() {
        assert_eq!(decode_body(StatusCode::NO_CONTENT, "").unwrap(), Value::Null);
        assert_eq!(decode_body(StatusCode::NO_CONTENT, "  \n").unwrap(), Value::Null);
    }

    #[test]
    fn empty_body_with_other_status_is_decode_error() {
        assert!(matches!(decode_body(StatusCode::OK, ""), Err(ClientError::Decode(_))));
        assert!(matches!(
            decode_body(StatusCode::BAD_GATEWAY, " "),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn malformed_body_is_decode_error() {
        assert!(matches!(
            decode_body(StatusCode::OK, "<html>"),
            Err(ClientError::Decode(_))
        ));
    }
}
