//! # Kitbase Shared
//! Common functionality shared between kitbase-server & kitbase-client crates:
//! identities, generation-checked keys, the ownership policy, transfer
//! statuses and the typed messages that carry ownership requests between a
//! client and the authoritative host.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod arena;
mod capability;
mod eligibility;
mod error;
mod identity;
mod messages;
mod status;
mod transport;
mod types;

pub use arena::{AgentKey, Arena, ArenaKey, PawnKey};
pub use capability::{
    run_hook, HookError, HookResult, NetworkAuthoritative, Ownable, OwnerChange, Tickable,
};
pub use eligibility::{allow_ownership, Candidate, Eligibility, OwnerClaim, PawnClaim};
pub use error::{AuthorityError, TransportError};
pub use identity::{ClientType, ConnectionRef, Identity};
pub use messages::{
    ChannelDirection, ChannelMode, HostBoundMessage, OwnerBoundMessage, ReplicationUpdate,
    RequestId, Routed, RpcFlags, SenderRestriction,
};
pub use status::{AttemptResult, DenyReason, TransferOutcome, TransferStatus};
pub use transport::{check_route, HostSender, OwnerSender};
pub use types::HostType;
