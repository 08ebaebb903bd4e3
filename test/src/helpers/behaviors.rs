use std::sync::{Arc, Mutex};

use kitbase_client::ClientBehavior;
use kitbase_server::AgentBehavior;
use kitbase_shared::{
    Candidate, DenyReason, Eligibility, HookError, HookResult, Ownable, OwnerChange, PawnKey,
    Tickable, TransferOutcome,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HookCall {
    GainPawn(PawnKey),
    LosePawn(PawnKey),
    TakePawnResponse(PawnKey, TransferOutcome),
    OwnerChanged(OwnerChange),
    Simulated(f32),
    SimulatedPawn(PawnKey),
}

/// Every hook call a recording behavior saw, in order. Clones share the
/// same log, so a test keeps one and hands the other to the process.
#[derive(Clone, Default)]
pub struct HookLog(Arc<Mutex<Vec<HookCall>>>);

impl HookLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: HookCall) {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn count(&self, predicate: impl Fn(&HookCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }
}

/// How a faulty hook misbehaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    Error,
    Panic,
}

impl Fault {
    fn trigger<T>(self, hook: &str) -> HookResult<T> {
        match self {
            Fault::Error => Err(HookError(format!("{} refused", hook))),
            Fault::Panic => panic!("{} blew up", hook),
        }
    }
}

// Agents

pub struct RecordingAgent {
    log: HookLog,
}

impl RecordingAgent {
    pub fn new(log: &HookLog) -> Self {
        Self { log: log.clone() }
    }
}

impl AgentBehavior for RecordingAgent {
    fn on_gain_pawn(&mut self, pawn: &PawnKey) -> HookResult<()> {
        self.log.push(HookCall::GainPawn(*pawn));
        Ok(())
    }

    fn on_lose_pawn(&mut self, pawn: &PawnKey) -> HookResult<()> {
        self.log.push(HookCall::LosePawn(*pawn));
        Ok(())
    }

    fn on_take_pawn_response(
        &mut self,
        pawn: &PawnKey,
        outcome: &TransferOutcome,
    ) -> HookResult<()> {
        self.log.push(HookCall::TakePawnResponse(*pawn, *outcome));
        Ok(())
    }
}

/// Faults in every notification hook.
pub struct FaultyAgent {
    fault: Fault,
}

impl FaultyAgent {
    pub fn new(fault: Fault) -> Self {
        Self { fault }
    }
}

impl AgentBehavior for FaultyAgent {
    fn on_gain_pawn(&mut self, _pawn: &PawnKey) -> HookResult<()> {
        self.fault.trigger("on_gain_pawn")
    }

    fn on_lose_pawn(&mut self, _pawn: &PawnKey) -> HookResult<()> {
        self.fault.trigger("on_lose_pawn")
    }
}

// Pawns

pub struct RecordingPawn {
    log: HookLog,
    can_simulate: bool,
}

impl RecordingPawn {
    pub fn new(log: &HookLog) -> Self {
        Self {
            log: log.clone(),
            can_simulate: true,
        }
    }

    pub fn frozen(log: &HookLog) -> Self {
        Self {
            log: log.clone(),
            can_simulate: false,
        }
    }
}

impl Ownable for RecordingPawn {
    fn on_owner_changed(&mut self, change: &OwnerChange) -> HookResult<()> {
        self.log.push(HookCall::OwnerChanged(*change));
        Ok(())
    }
}

impl Tickable for RecordingPawn {
    fn can_simulate(&self) -> bool {
        self.can_simulate
    }

    fn simulate(&mut self, delta_seconds: f32) -> HookResult<()> {
        self.log.push(HookCall::Simulated(delta_seconds));
        Ok(())
    }
}

/// Vetoes every candidate.
pub struct RejectingPawn;

impl Ownable for RejectingPawn {
    fn allow_ownership(&self, _candidate: &Candidate) -> HookResult<Eligibility> {
        Ok(Eligibility::Denied(DenyReason::RejectedByPawn))
    }
}

impl Tickable for RejectingPawn {}

/// Faults in either the eligibility hook or the simulate hook.
pub struct FaultyPawn {
    eligibility: Option<Fault>,
    simulation: Option<Fault>,
}

impl FaultyPawn {
    pub fn on_eligibility(fault: Fault) -> Self {
        Self {
            eligibility: Some(fault),
            simulation: None,
        }
    }

    pub fn on_simulate(fault: Fault) -> Self {
        Self {
            eligibility: None,
            simulation: Some(fault),
        }
    }
}

impl Ownable for FaultyPawn {
    fn allow_ownership(&self, _candidate: &Candidate) -> HookResult<Eligibility> {
        match self.eligibility {
            Some(fault) => fault.trigger("allow_ownership"),
            None => Ok(Eligibility::Allowed),
        }
    }
}

impl Tickable for FaultyPawn {
    fn simulate(&mut self, _delta_seconds: f32) -> HookResult<()> {
        match self.simulation {
            Some(fault) => fault.trigger("simulate"),
            None => Ok(()),
        }
    }
}

// Clients

pub struct RecordingClient {
    log: HookLog,
    fault: Option<Fault>,
}

impl RecordingClient {
    pub fn new(log: &HookLog) -> Self {
        Self {
            log: log.clone(),
            fault: None,
        }
    }

    /// Records, then faults.
    pub fn faulty(log: &HookLog, fault: Fault) -> Self {
        Self {
            log: log.clone(),
            fault: Some(fault),
        }
    }
}

impl ClientBehavior for RecordingClient {
    fn on_take_pawn_response(
        &mut self,
        pawn: &PawnKey,
        outcome: &TransferOutcome,
    ) -> HookResult<()> {
        self.log.push(HookCall::TakePawnResponse(*pawn, *outcome));
        match self.fault {
            Some(fault) => fault.trigger("on_take_pawn_response"),
            None => Ok(()),
        }
    }

    fn simulate_pawn(&mut self, pawn: &PawnKey, _delta_seconds: f32) -> HookResult<()> {
        self.log.push(HookCall::SimulatedPawn(*pawn));
        Ok(())
    }
}
