//! Read access to host-owned session transcripts.
//!
//! Transcripts are JSONL files (one message per line) keyed by session key,
//! stored and written by the host gateway; this crate only reads them and
//! computes the caller-visible history window.

pub mod history;
pub mod transcript;

pub use {
    history::{DEFAULT_HISTORY_LIMIT, HistoryEntry, history, window_since_last_user},
    transcript::{JsonlTranscripts, TranscriptSource},
};
