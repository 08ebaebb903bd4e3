//! # Kitbase Client
//! The non-authoritative side of kitbase agency. A client asks the host for
//! pawns, tracks each request until the host answers or it times out, and
//! keeps a read-only replica of who owns what.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use kitbase_shared::{
        AgentKey, AttemptResult, DenyReason, OwnerChange, PawnKey, TransferOutcome,
        TransferStatus,
    };
}

mod behavior;
mod client;
mod client_config;
mod events;
mod pending;
mod replica;

pub use behavior::{BasicClientBehavior, ClientBehavior};
pub use client::Client;
pub use client_config::ClientConfig;
pub use events::{AgentAssignedEvent, ErrorEvent, Event, Events, OwnerChangeEvent, TransferEvent};
pub use pending::PendingRequests;
pub use replica::{AgentView, PawnView, Replica};
