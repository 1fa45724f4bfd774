//! Example usage: create an agent, store memories, retrieve them, run a RAG query.
//!
//! Configured from `AMP_BASE_URL` / `AMP_API_KEY`; with `AMP_DEMO_MOCK=1` it
//! starts the in-process mock platform and talks to that instead.

use amp_client::{
    AgentMemoryApi, ClientConfig, HttpAgentMemoryClient, RagOptions, RetrieveOptions,
    StoreMemoryOptions,
};
use amp_mock_server::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MOCK_TOKEN: &str = "dev-token";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = if use_mock() {
        let addr = amp_mock_server::spawn(Arc::new(AppState::new(MOCK_TOKEN))).await?;
        tracing::info!(%addr, "using in-process mock platform");
        ClientConfig::new(amp_mock_server::base_url(addr), MOCK_TOKEN)
    } else {
        ClientConfig::from_env()?
    };
    let client = HttpAgentMemoryClient::new(config)?;
    run(&client).await
}

fn use_mock() -> bool {
    std::env::var("AMP_DEMO_MOCK")
        .map(|v| matches!(v.as_str(), "1" | "true"))
        .unwrap_or(false)
}

async fn run(client: &dyn AgentMemoryApi) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let agent = client.create_agent("user-123", "My Assistant").await?;
    let agent_id = agent["id"]
        .as_str()
        .ok_or_else(|| format!("agent response has no id: {}", agent))?
        .to_string();
    println!("Created agent: {}", agent_id);

    client
        .store_memory(
            &agent_id,
            "User prefers dark mode",
            StoreMemoryOptions::default().with_importance(7),
        )
        .await?;
    client
        .store_memory(
            &agent_id,
            "User is interested in AI",
            StoreMemoryOptions::default().with_importance(8),
        )
        .await?;
    println!("Stored memories");

    let memories = client
        .retrieve_memories(&agent_id, RetrieveOptions::default())
        .await?;
    let count = memories["memories"]
        .as_array()
        .ok_or_else(|| format!("retrieve response has no memories: {}", memories))?
        .len();
    println!("Retrieved {} memories", count);

    let result = client
        .rag_query(
            &agent_id,
            "What are the user's preferences?",
            RagOptions::default(),
        )
        .await?;
    let prompt = result["augmentedPrompt"]
        .as_str()
        .ok_or_else(|| format!("rag response has no augmentedPrompt: {}", result))?;
    let preview: String = prompt.chars().take(100).collect();
    println!("RAG result: {}...", preview);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_flow_runs_against_mock_platform() {
        let state = Arc::new(AppState::new(MOCK_TOKEN));
        let addr = amp_mock_server::spawn(Arc::clone(&state)).await.unwrap();
        let client = HttpAgentMemoryClient::new(ClientConfig::new(
            amp_mock_server::base_url(addr),
            MOCK_TOKEN,
        ))
        .unwrap();
        run(&client).await.unwrap();

        let paths: Vec<(String, String)> = state
            .requests()
            .await
            .into_iter()
            .map(|r| (r.method, r.path))
            .collect();
        assert_eq!(paths.len(), 5);
        assert_eq!(paths[0], ("POST".to_string(), "/v1/agents".to_string()));
        assert!(paths[4].1.ends_with("/rag/retrieve"));
    }

    #[tokio::test]
    async fn demo_fails_when_rag_response_lacks_prompt() {
        let state = Arc::new(AppState::new(MOCK_TOKEN));
        state.stub_json("POST", "/v1/agents", 201, serde_json::json!({ "id": "a1" })).await;
        state
            .stub_json("GET", "/v1/agents/a1/memories", 200, serde_json::json!({ "memories": [] }))
            .await;
        state
            .stub_json("POST", "/v1/agents/a1/rag/retrieve", 200, serde_json::json!({ "sources": [] }))
            .await;
        let addr = amp_mock_server::spawn(Arc::clone(&state)).await.unwrap();
        let client = HttpAgentMemoryClient::new(ClientConfig::new(
            amp_mock_server::base_url(addr),
            MOCK_TOKEN,
        ))
        .unwrap();

        let err = run(&client).await.unwrap_err();
        assert!(err.to_string().contains("augmentedPrompt"));
    }

    #[tokio::test]
    async fn demo_fails_when_memory_list_is_missing() {
        let state = Arc::new(AppState::new(MOCK_TOKEN));
        state.stub_json("POST", "/v1/agents", 201, serde_json::json!({ "id": "a1" })).await;
        state
            .stub_json("GET", "/v1/agents/a1/memories", 200, serde_json::json!({}))
            .await;
        let addr = amp_mock_server::spawn(Arc::clone(&state)).await.unwrap();
        let client = HttpAgentMemoryClient::new(ClientConfig::new(
            amp_mock_server::base_url(addr),
            MOCK_TOKEN,
        ))
        .unwrap();

        let err = run(&client).await.unwrap_err();
        assert!(err.to_string().contains("no memories"));
    }
}
