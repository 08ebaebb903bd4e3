use crate::{AgentKey, HostType, Identity, PawnKey, TransferOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelDirection {
    ToHost,
    ToOwner,
}

impl ChannelDirection {
    /// The kind of process a message travelling this way is delivered to.
    pub fn receiver(&self) -> HostType {
        match self {
            ChannelDirection::ToHost => HostType::Server,
            ChannelDirection::ToOwner => HostType::Client,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    Reliable,
    BestEffort,
}

/// Who is allowed to send on a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SenderRestriction {
    /// Only the connection that owns the target agent
    OwnerOnly,
    /// Only the authoritative process
    HostOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RpcFlags {
    pub mode: ChannelMode,
    pub restriction: SenderRestriction,
}

impl RpcFlags {
    pub const RELIABLE_OWNER_ONLY: RpcFlags = RpcFlags {
        mode: ChannelMode::Reliable,
        restriction: SenderRestriction::OwnerOnly,
    };
    pub const RELIABLE_HOST_ONLY: RpcFlags = RpcFlags {
        mode: ChannelMode::Reliable,
        restriction: SenderRestriction::HostOnly,
    };

    pub fn is_reliable(&self) -> bool {
        self.mode == ChannelMode::Reliable
    }

    pub fn allows_sender(&self, sender: HostType) -> bool {
        match self.restriction {
            SenderRestriction::OwnerOnly => sender == HostType::Client,
            SenderRestriction::HostOnly => sender == HostType::Server,
        }
    }
}

/// A message bound to one RPC channel.
pub trait Routed {
    fn name(&self) -> &'static str;
    fn direction(&self) -> ChannelDirection;
    fn flags(&self) -> RpcFlags;
}

/// Correlates a `TakePawnResponse` with the request that caused it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u32);

impl RequestId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Client -> host. The acting agent is whichever agent belongs to the
/// sending connection; it is never read from the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostBoundMessage {
    RequestTakePawn { request_id: RequestId, pawn: PawnKey },
    SetName { name: String },
}

impl Routed for HostBoundMessage {
    fn name(&self) -> &'static str {
        match self {
            HostBoundMessage::RequestTakePawn { .. } => "RequestTakePawn",
            HostBoundMessage::SetName { .. } => "SetName",
        }
    }

    fn direction(&self) -> ChannelDirection {
        ChannelDirection::ToHost
    }

    fn flags(&self) -> RpcFlags {
        RpcFlags::RELIABLE_OWNER_ONLY
    }
}

/// Host -> client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnerBoundMessage {
    /// Tells a connection which agent acts for it
    AssignAgent { agent: AgentKey },
    TakePawnResponse {
        request_id: RequestId,
        pawn: PawnKey,
        outcome: TransferOutcome,
    },
    Replicate(ReplicationUpdate),
}

impl Routed for OwnerBoundMessage {
    fn name(&self) -> &'static str {
        match self {
            OwnerBoundMessage::AssignAgent { .. } => "AssignAgent",
            OwnerBoundMessage::TakePawnResponse { .. } => "TakePawnResponse",
            OwnerBoundMessage::Replicate(_) => "Replicate",
        }
    }

    fn direction(&self) -> ChannelDirection {
        ChannelDirection::ToOwner
    }

    fn flags(&self) -> RpcFlags {
        RpcFlags::RELIABLE_HOST_ONLY
    }
}

/// Host-authoritative fields, written by the host and observed by everyone
/// else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicationUpdate {
    AgentSpawned {
        agent: AgentKey,
        is_player: bool,
        identity: Option<Identity>,
        connected: bool,
    },
    AgentDespawned {
        agent: AgentKey,
    },
    AgentRenamed {
        agent: AgentKey,
        identity: Identity,
    },
    AgentConnectivity {
        agent: AgentKey,
        connected: bool,
    },
    PawnSpawned {
        pawn: PawnKey,
        requires_player: bool,
    },
    PawnDespawned {
        pawn: PawnKey,
    },
    PawnOwner {
        pawn: PawnKey,
        owner: Option<AgentKey>,
    },
}
