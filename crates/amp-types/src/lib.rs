//! Core types and traits for the Agent Memory Platform API.
//!
//! Request/response DTOs keep the platform's camelCase wire shape.

mod dto;
mod traits;

pub use dto::*;
pub use traits::*;
