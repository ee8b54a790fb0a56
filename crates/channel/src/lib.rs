//! The atypica channel plugin.
//!
//! Bridges an external web application to the host gateway's agent runtime:
//! inbound HTTP requests are authenticated, routed to a durable session,
//! and answered either inline (sync) or via an outbound webhook (async).

pub mod auth;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod plugin;
pub mod push;
pub mod routes;

pub use {
    context::{ChannelContext, HostInterfaces},
    dispatch::{DispatchQueue, InboundOutcome, TurnJob, handle_inbound},
    plugin::{AtypicaPlugin, ChannelHealth},
    push::{PushOutcome, ReplyPusher, WebhookPusher},
    routes::router,
};
