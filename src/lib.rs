//! Money Coach Orchestrator
//!
//! Mediates between a money coach client and an LLM service with tool
//! calling. A question that needs the user's transactions is answered in two
//! HTTP round-trips:
//! - `/assistant` asks the LLM and, when it requests a tool, suspends by
//!   returning the call identifiers to the caller
//! - `/finalize-tool-output` resumes the stored turn with the caller's
//!   tool output
//!
//! No conversation state is kept between the two calls.

pub mod agent;
pub mod api;
pub mod config;
pub mod conversation;
pub mod dates;
pub mod detector;
pub mod error;
pub mod llm;
pub mod models;
pub mod tools;

pub use error::{CoachError, Result};

// Re-export common types
pub use models::*;
pub use agent::Orchestrator;
