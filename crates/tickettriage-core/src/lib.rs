//! TicketTriage Core
//!
//! Domain types and classification logic shared across TicketTriage components.
//!
//! This crate provides:
//! - The ticket request/classification data model and its field constraints
//! - Error types and result handling
//! - The `ChatBackend` trait and an OpenAI-compatible implementation
//! - The schema-constrained classification pipeline with bounded retries

pub mod backend;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod types;

pub use backend::{ChatBackend, ChatMessage, CompletionRequest, OpenAiBackend};
pub use error::{Error, Result};
pub use pipeline::TicketClassifier;
pub use types::{
    CustomerSentiment, TicketCategory, TicketClassification, TicketRequest, TicketUrgency,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::{ChatBackend, ChatMessage, CompletionRequest};
    pub use crate::error::{Error, Result};
    pub use crate::pipeline::TicketClassifier;
    pub use crate::types::{
        CustomerSentiment, TicketCategory, TicketClassification, TicketRequest, TicketUrgency,
    };
}
