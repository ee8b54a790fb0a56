//! Configuration schema and account resolution for the atypica channel.
//!
//! The channel config lives under `channels.atypica` in the host gateway's
//! configuration document. Per-account overrides fall back to base channel
//! fields, then to environment variables, then to hard defaults.

pub mod resolve;
pub mod schema;

pub use {
    resolve::{
        AccountSummary, EffectiveAccountConfig, list_account_ids, resolve, resolve_with_env,
    },
    schema::{
        AccountOverrides, AgentInvocationConfig, AgentInvocationMode, AtypicaChannelConfig,
        CHANNEL_ID, DEFAULT_ACCOUNT_ID,
    },
};
