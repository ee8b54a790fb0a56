//! Interfaces of the host gateway as seen by the atypica channel plugin.
//!
//! The host owns agent lifecycle, routing state, and session storage; the
//! plugin only consumes these capabilities. In-memory implementations are
//! provided for tests and single-process embedding.

pub mod agents;
pub mod binding;
pub mod memory;
pub mod routing;
pub mod runner;

pub use {
    agents::AgentRegistry,
    binding::{BindingStore, Peer, PeerBinding, PeerKind},
    memory::{MemoryAgentRegistry, MemoryRouting},
    routing::{ResolvedRoute, RouteMatch, RouteResolver},
    runner::{CliTurnRunner, TurnRunner},
};
