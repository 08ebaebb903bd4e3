//! The ownership policy both sides agree on.
//!
//! A client runs it over its replica as a pre-check so it does not send
//! requests that are bound to fail; the host runs it again over its own state
//! before touching the registry. Only the host's answer counts.

use crate::{AgentKey, ClientType, DenyReason};

/// The agent asking to own a pawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub agent: AgentKey,
    pub is_player: bool,
    pub client_type: Option<ClientType>,
    pub connected: bool,
}

impl Candidate {
    /// Player agents backed by a real user need a live connection.
    pub fn requires_connection(&self) -> bool {
        self.is_player && self.client_type == Some(ClientType::User)
    }
}

/// The current owner of a pawn, as seen by whoever evaluates the policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnerClaim {
    pub agent: AgentKey,
    pub live: bool,
    pub requires_connection: bool,
    pub connected: bool,
}

impl OwnerClaim {
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            agent: candidate.agent,
            live: true,
            requires_connection: candidate.requires_connection(),
            connected: candidate.connected,
        }
    }

    /// A destroyed owner, or one that lost its connection, has lapsed.
    pub fn is_valid(&self) -> bool {
        self.live && (self.connected || !self.requires_connection)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PawnClaim {
    pub requires_player: bool,
    pub owner: Option<OwnerClaim>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eligibility {
    Allowed,
    Denied(DenyReason),
}

impl Eligibility {
    pub fn is_allowed(&self) -> bool {
        *self == Eligibility::Allowed
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Eligibility::Allowed => Ok(()),
            Eligibility::Denied(reason) => Err(reason),
        }
    }
}

pub fn allow_ownership(
    candidate: &Candidate,
    claim: &PawnClaim,
    require_player_connection: bool,
) -> Eligibility {
    if require_player_connection && candidate.requires_connection() && !candidate.connected {
        return Eligibility::Denied(DenyReason::NotConnected);
    }

    if claim.requires_player && !candidate.is_player {
        return Eligibility::Denied(DenyReason::RequiresPlayer);
    }

    if let Some(owner) = claim.owner {
        if owner.agent != candidate.agent && owner.is_valid() {
            return Eligibility::Denied(DenyReason::AlreadyClaimed);
        }
    }

    Eligibility::Allowed
}
