//! # Kitbase Server
//! The authoritative process of kitbase agency. Keeps the registry of which
//! agent owns which pawn, evaluates ownership requests from local agents and
//! remote clients, and replicates the results to every connected client.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use kitbase_shared::{
        AgentKey, AttemptResult, ConnectionRef, DenyReason, Identity, PawnKey, TransferOutcome,
    };
}

mod agency;
mod events;
mod server;

pub use agency::{
    agent::{Agent, AgentBehavior, BasicAgent},
    pawn::{BasicPawn, Pawn, PawnBehavior, PawnConfig},
    registry::OwnershipRegistry,
};
pub use events::{
    ConnectEvent, DisconnectEvent, ErrorEvent, Event, Events, GainPawnEvent, LosePawnEvent,
    TransferEvent,
};
pub use server::{ConnectionRecord, Server, ServerConfig};
