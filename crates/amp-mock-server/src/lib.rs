//! In-memory fake of the Agent Memory Platform REST API.
//!
//! Serves the `/v1/agents/...` surface with process-lifetime state, records
//! every request it receives and can be told to answer a route with a canned
//! response.

pub mod rag;
pub mod server;

pub use server::{base_url, router, spawn, AppState, RecordedRequest};
