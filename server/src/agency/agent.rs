use std::collections::HashSet;

use kitbase_shared::{
    AgentKey, Candidate, ConnectionRef, HookResult, Identity, PawnKey, TransferOutcome,
};

/// Hooks the host may override per agent. Every hook runs after the registry
/// is consistent again, and a faulting hook never rolls anything back.
pub trait AgentBehavior: Send {
    /// Called after a pawn we didn't own is confirmed to be owned.
    fn on_gain_pawn(&mut self, _pawn: &PawnKey) -> HookResult<()> {
        Ok(())
    }

    /// Called after a pawn we owned was confirmed to be removed.
    fn on_lose_pawn(&mut self, _pawn: &PawnKey) -> HookResult<()> {
        Ok(())
    }

    /// Outcome of a `request_take_pawn` made on the host itself.
    fn on_take_pawn_response(
        &mut self,
        _pawn: &PawnKey,
        _outcome: &TransferOutcome,
    ) -> HookResult<()> {
        Ok(())
    }
}

pub struct BasicAgent;

impl AgentBehavior for BasicAgent {}

/// Something capable of control over pawns: a player (real or fake) or an NPC.
pub struct Agent {
    is_player: bool,
    identity: Option<Identity>,
    connected: bool,
    owned_pawns: HashSet<PawnKey>,
    pub(crate) behavior: Box<dyn AgentBehavior>,
}

impl Agent {
    pub(crate) fn new(
        is_player: bool,
        identity: Option<Identity>,
        behavior: Box<dyn AgentBehavior>,
    ) -> Self {
        Self {
            is_player,
            identity,
            // NPCs are always connected
            connected: true,
            owned_pawns: HashSet::new(),
            behavior,
        }
    }

    pub fn is_player(&self) -> bool {
        self.is_player
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn connection(&self) -> Option<ConnectionRef> {
        self.identity.as_ref().and_then(|identity| identity.connection())
    }

    /// If NPC/bot: always true. If driven by a user: whether its connection
    /// is active.
    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn owned_pawns(&self) -> &HashSet<PawnKey> {
        &self.owned_pawns
    }

    pub fn owns(&self, pawn: &PawnKey) -> bool {
        self.owned_pawns.contains(pawn)
    }

    pub fn display_name(&self) -> &str {
        match &self.identity {
            Some(identity) => identity.display_name(),
            None => "Agent",
        }
    }

    /// True when a remote user drives this agent, so the host only holds a
    /// proxy and must not simulate its pawns.
    pub fn is_remote(&self) -> bool {
        self.identity
            .as_ref()
            .map(|identity| identity.is_user())
            .unwrap_or(false)
    }

    pub fn can_simulate(&self) -> bool {
        !self.is_remote()
    }

    pub fn candidate(&self, key: &AgentKey) -> Candidate {
        Candidate {
            agent: *key,
            is_player: self.is_player,
            client_type: self.identity.as_ref().map(|identity| identity.client_type()),
            connected: self.connected,
        }
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub(crate) fn set_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub(crate) fn insert_pawn(&mut self, pawn: PawnKey) -> bool {
        self.owned_pawns.insert(pawn)
    }

    pub(crate) fn remove_pawn(&mut self, pawn: &PawnKey) -> bool {
        self.owned_pawns.remove(pawn)
    }

    pub(crate) fn retain_pawns(&mut self, mut keep: impl FnMut(&PawnKey) -> bool) {
        self.owned_pawns.retain(|pawn| keep(pawn));
    }
}
