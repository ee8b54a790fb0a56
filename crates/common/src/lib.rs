//! Shared types and error definitions used across all atypica crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, Result},
    types::{InboundMessage, ReplyKind, ReplyPayload, ResponseMode, ValidInbound, unix_now_ms},
};
