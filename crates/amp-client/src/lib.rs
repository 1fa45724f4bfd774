//! HTTP client for the Agent Memory Platform.
//!
//! ```rust,no_run
//! use amp_client::{AgentMemoryApi, ClientConfig, HttpAgentMemoryClient, StoreMemoryOptions};
//!
//! # async fn example() -> Result<(), amp_client::ClientError> {
//! let client = HttpAgentMemoryClient::new(ClientConfig::new(
//!     "http://localhost:3000/v1",
//!     "your-jwt-token-here",
//! ))?;
//! let agent = client.create_agent("user-123", "My Assistant").await?;
//! let agent_id = agent["id"].as_str().unwrap_or_default();
//! client
//!     .store_memory(agent_id, "User prefers dark mode", StoreMemoryOptions::default().with_importance(7))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod http;

pub use amp_types::*;
pub use config::{ClientConfig, StatusPolicy, DEFAULT_BASE_URL};
pub use http::HttpAgentMemoryClient;
