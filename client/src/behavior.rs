use kitbase_shared::{HookResult, PawnKey, TransferOutcome};

/// Hooks the client runs for its local agent.
pub trait ClientBehavior: Send {
    /// Called once per resolved take request, after the status is updated.
    fn on_take_pawn_response(
        &mut self,
        _pawn: &PawnKey,
        _outcome: &TransferOutcome,
    ) -> HookResult<()> {
        Ok(())
    }

    fn can_simulate_pawn(&self, _pawn: &PawnKey) -> bool {
        true
    }

    fn simulate_pawn(&mut self, _pawn: &PawnKey, _delta_seconds: f32) -> HookResult<()> {
        Ok(())
    }
}

pub struct BasicClientBehavior;

impl ClientBehavior for BasicClientBehavior {}
