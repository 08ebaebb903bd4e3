use std::collections::HashMap;

use log::debug;

use kitbase_shared::{
    AgentKey, Candidate, Identity, OwnerChange, OwnerClaim, PawnClaim, PawnKey, ReplicationUpdate,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentView {
    pub is_player: bool,
    pub identity: Option<Identity>,
    pub connected: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PawnView {
    pub requires_player: bool,
    pub owner: Option<AgentKey>,
}

/// What this process knows about the host's agents and pawns. Only
/// replication from the host writes to it.
#[derive(Default)]
pub struct Replica {
    agents: HashMap<AgentKey, AgentView>,
    pawns: HashMap<PawnKey, PawnView>,
}

impl Replica {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one host update. Returns the owner transition when the update
    /// changed a pawn's owner.
    pub(crate) fn apply(&mut self, update: ReplicationUpdate) -> Option<(PawnKey, OwnerChange)> {
        match update {
            ReplicationUpdate::AgentSpawned {
                agent,
                is_player,
                identity,
                connected,
            } => {
                self.agents.insert(
                    agent,
                    AgentView {
                        is_player,
                        identity,
                        connected,
                    },
                );
            }
            ReplicationUpdate::AgentDespawned { agent } => {
                self.agents.remove(&agent);
            }
            ReplicationUpdate::AgentRenamed { agent, identity } => {
                let Some(view) = self.agents.get_mut(&agent) else {
                    debug!("rename for unknown agent {:?}", agent);
                    return None;
                };
                view.identity = Some(identity);
            }
            ReplicationUpdate::AgentConnectivity { agent, connected } => {
                let Some(view) = self.agents.get_mut(&agent) else {
                    debug!("connectivity for unknown agent {:?}", agent);
                    return None;
                };
                view.connected = connected;
            }
            ReplicationUpdate::PawnSpawned {
                pawn,
                requires_player,
            } => {
                self.pawns.insert(
                    pawn,
                    PawnView {
                        requires_player,
                        owner: None,
                    },
                );
            }
            ReplicationUpdate::PawnDespawned { pawn } => {
                let view = self.pawns.remove(&pawn)?;
                if view.owner.is_some() {
                    return Some((
                        pawn,
                        OwnerChange {
                            old: view.owner,
                            new: None,
                        },
                    ));
                }
            }
            ReplicationUpdate::PawnOwner { pawn, owner } => {
                let Some(view) = self.pawns.get_mut(&pawn) else {
                    debug!("owner update for unknown pawn {:?}", pawn);
                    return None;
                };
                if view.owner == owner {
                    return None;
                }
                let change = OwnerChange {
                    old: view.owner,
                    new: owner,
                };
                view.owner = owner;
                return Some((pawn, change));
            }
        }
        None
    }

    pub fn agent(&self, agent: &AgentKey) -> Option<&AgentView> {
        self.agents.get(agent)
    }

    pub fn contains_agent(&self, agent: &AgentKey) -> bool {
        self.agents.contains_key(agent)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn pawn(&self, pawn: &PawnKey) -> Option<&PawnView> {
        self.pawns.get(pawn)
    }

    pub fn contains_pawn(&self, pawn: &PawnKey) -> bool {
        self.pawns.contains_key(pawn)
    }

    pub fn pawn_count(&self) -> usize {
        self.pawns.len()
    }

    pub fn owner_of(&self, pawn: &PawnKey) -> Option<AgentKey> {
        self.pawns.get(pawn)?.owner
    }

    /// Sorted, so callers visit pawns in a stable order.
    pub fn owned_pawns(&self, agent: &AgentKey) -> Vec<PawnKey> {
        let mut owned: Vec<PawnKey> = self
            .pawns
            .iter()
            .filter(|(_, view)| view.owner == Some(*agent))
            .map(|(pawn, _)| *pawn)
            .collect();
        owned.sort();
        owned
    }

    pub fn candidate(&self, agent: &AgentKey) -> Option<Candidate> {
        let view = self.agents.get(agent)?;
        Some(Candidate {
            agent: *agent,
            is_player: view.is_player,
            client_type: view.identity.as_ref().map(|identity| identity.client_type()),
            connected: view.connected,
        })
    }

    pub fn pawn_claim(&self, pawn: &PawnKey) -> Option<PawnClaim> {
        let view = self.pawns.get(pawn)?;
        let owner = view.owner.map(|owner| match self.candidate(&owner) {
            Some(candidate) => OwnerClaim::from_candidate(&candidate),
            None => OwnerClaim {
                agent: owner,
                live: false,
                requires_connection: false,
                connected: false,
            },
        });
        Some(PawnClaim {
            requires_player: view.requires_player,
            owner,
        })
    }
}
