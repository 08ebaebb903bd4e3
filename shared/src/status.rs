/// Result of a local attempt to give a pawn to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttemptResult {
    Failure,
    /// Forwarded to the host, the outcome arrives later.
    Request,
    Success,
}

/// Where one ownership transfer attempt currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferStatus {
    Idle,
    Requested,
    Approved,
    Denied,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Approved | TransferStatus::Denied)
    }

    pub fn is_pending(&self) -> bool {
        *self == TransferStatus::Requested
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DenyReason {
    PawnInvalid,
    AgentInvalid,
    NotConnected,
    RequiresPlayer,
    AlreadyClaimed,
    AgentFull,
    RejectedByPawn,
    HookFault,
    NotAuthoritative,
    TimedOut,
}

impl DenyReason {
    pub fn name(&self) -> &'static str {
        match self {
            DenyReason::PawnInvalid => "pawn invalid",
            DenyReason::AgentInvalid => "agent invalid",
            DenyReason::NotConnected => "agent not connected",
            DenyReason::RequiresPlayer => "pawn requires a player agent",
            DenyReason::AlreadyClaimed => "pawn already claimed",
            DenyReason::AgentFull => "agent owns too many pawns",
            DenyReason::RejectedByPawn => "rejected by pawn",
            DenyReason::HookFault => "eligibility hook faulted",
            DenyReason::NotAuthoritative => "process is not authoritative",
            DenyReason::TimedOut => "request timed out",
        }
    }
}

/// Final answer the host gives for one transfer request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferOutcome {
    Approved,
    Denied(DenyReason),
}

impl TransferOutcome {
    pub fn is_approved(&self) -> bool {
        *self == TransferOutcome::Approved
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            TransferOutcome::Approved => None,
            TransferOutcome::Denied(reason) => Some(*reason),
        }
    }

    pub fn status(&self) -> TransferStatus {
        match self {
            TransferOutcome::Approved => TransferStatus::Approved,
            TransferOutcome::Denied(_) => TransferStatus::Denied,
        }
    }

    pub fn attempt(&self) -> AttemptResult {
        match self {
            TransferOutcome::Approved => AttemptResult::Success,
            TransferOutcome::Denied(_) => AttemptResult::Failure,
        }
    }
}

impl From<Result<(), DenyReason>> for TransferOutcome {
    fn from(result: Result<(), DenyReason>) -> Self {
        match result {
            Ok(()) => TransferOutcome::Approved,
            Err(reason) => TransferOutcome::Denied(reason),
        }
    }
}
