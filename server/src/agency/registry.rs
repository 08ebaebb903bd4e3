use kitbase_shared::{
    AgentKey, Arena, Candidate, DenyReason, OwnerClaim, PawnClaim, PawnKey,
};

use crate::agency::{agent::Agent, pawn::Pawn};

/// Single source of truth for which agent owns which pawn.
///
/// Both sides of the relation are stored (`Pawn::owner` and
/// `Agent::owned_pawns`) and every mutation here updates them together, so
/// outside of these methods the two views always agree.
pub struct OwnershipRegistry {
    agents: Arena<AgentKey, Agent>,
    pawns: Arena<PawnKey, Pawn>,
    require_player_connection: bool,
}

impl OwnershipRegistry {
    pub fn new() -> Self {
        Self::with_player_connection(true)
    }

    /// With `require_player_connection` off, a user-driven player agent can
    /// be assigned pawns while its connection is down.
    pub fn with_player_connection(require_player_connection: bool) -> Self {
        Self {
            agents: Arena::new(),
            pawns: Arena::new(),
            require_player_connection,
        }
    }

    // Agents

    pub(crate) fn insert_agent(&mut self, agent: Agent) -> AgentKey {
        self.agents.insert(agent)
    }

    /// Releases every pawn the agent owns, then forgets the agent. Returns the
    /// agent and the pawns that were released.
    pub(crate) fn remove_agent(&mut self, key: &AgentKey) -> Option<(Agent, Vec<PawnKey>)> {
        let owned: Vec<PawnKey> = self.agents.get(key)?.owned_pawns().iter().copied().collect();
        let mut released = Vec::new();
        for pawn in owned {
            if self.release(&pawn) == Some(*key) {
                released.push(pawn);
            }
        }
        let agent = self.agents.remove(key)?;
        Some((agent, released))
    }

    pub fn agent(&self, key: &AgentKey) -> Option<&Agent> {
        self.agents.get(key)
    }

    pub(crate) fn agent_mut(&mut self, key: &AgentKey) -> Option<&mut Agent> {
        self.agents.get_mut(key)
    }

    pub fn contains_agent(&self, key: &AgentKey) -> bool {
        self.agents.contains(key)
    }

    pub fn agent_keys(&self) -> Vec<AgentKey> {
        self.agents.keys()
    }

    pub fn agents(&self) -> impl Iterator<Item = (AgentKey, &Agent)> {
        self.agents.iter()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn candidate(&self, key: &AgentKey) -> Option<Candidate> {
        self.agents.get(key).map(|agent| agent.candidate(key))
    }

    // Pawns

    pub(crate) fn insert_pawn(&mut self, pawn: Pawn) -> PawnKey {
        self.pawns.insert(pawn)
    }

    /// Forces release first. Returns the pawn and its former owner.
    pub(crate) fn remove_pawn(&mut self, key: &PawnKey) -> Option<(Pawn, Option<AgentKey>)> {
        if !self.pawns.contains(key) {
            return None;
        }
        let former_owner = self.release(key);
        let pawn = self.pawns.remove(key)?;
        Some((pawn, former_owner))
    }

    pub fn pawn(&self, key: &PawnKey) -> Option<&Pawn> {
        self.pawns.get(key)
    }

    pub(crate) fn pawn_mut(&mut self, key: &PawnKey) -> Option<&mut Pawn> {
        self.pawns.get_mut(key)
    }

    pub fn contains_pawn(&self, key: &PawnKey) -> bool {
        self.pawns.contains(key)
    }

    pub fn pawn_keys(&self) -> Vec<PawnKey> {
        self.pawns.keys()
    }

    pub fn pawns(&self) -> impl Iterator<Item = (PawnKey, &Pawn)> {
        self.pawns.iter()
    }

    pub fn pawn_count(&self) -> usize {
        self.pawns.len()
    }

    // Ownership

    pub fn owner_of(&self, pawn: &PawnKey) -> Option<AgentKey> {
        self.pawns.get(pawn).and_then(|pawn| pawn.owner())
    }

    pub fn owned_pawns(&self, agent: &AgentKey) -> Vec<PawnKey> {
        let Some(agent) = self.agents.get(agent) else {
            return Vec::new();
        };
        let mut pawns: Vec<PawnKey> = agent.owned_pawns().iter().copied().collect();
        pawns.sort();
        pawns
    }

    /// The pawn's current claim as the eligibility policy sees it. An owner
    /// key that no longer resolves shows up as a claim that is not live.
    pub fn pawn_claim(&self, pawn: &PawnKey) -> Option<PawnClaim> {
        let record = self.pawns.get(pawn)?;
        let owner = record.owner().map(|owner_key| match self.agents.get(&owner_key) {
            Some(owner) => OwnerClaim::from_candidate(&owner.candidate(&owner_key)),
            None => OwnerClaim {
                agent: owner_key,
                live: false,
                requires_connection: false,
                connected: false,
            },
        });
        Some(PawnClaim {
            requires_player: record.requires_player(),
            owner,
        })
    }

    /// Assigns `pawn` to `agent`. Returns the previous owner, which equals
    /// `agent` when nothing changed.
    ///
    /// Denied when either handle is stale, when a player agent that needs a
    /// connection has none, or when the pawn is held by a different agent
    /// whose claim is still valid. A lapsed previous owner loses the pawn.
    pub fn try_assign(
        &mut self,
        pawn: &PawnKey,
        agent: &AgentKey,
    ) -> Result<Option<AgentKey>, DenyReason> {
        let claim = self.pawn_claim(pawn).ok_or(DenyReason::PawnInvalid)?;
        let candidate = self.candidate(agent).ok_or(DenyReason::AgentInvalid)?;
        if self.require_player_connection
            && candidate.requires_connection()
            && !candidate.connected
        {
            return Err(DenyReason::NotConnected);
        }

        let previous = claim.owner.map(|owner| owner.agent);
        if let Some(owner) = claim.owner {
            if owner.agent == *agent {
                // repair a half-missing entry, otherwise a no-op
                if let Some(record) = self.agents.get_mut(agent) {
                    record.insert_pawn(*pawn);
                }
                return Ok(previous);
            }
            if owner.is_valid() {
                return Err(DenyReason::AlreadyClaimed);
            }
            if let Some(old) = self.agents.get_mut(&owner.agent) {
                old.remove_pawn(pawn);
            }
        }

        let Some(record) = self.pawns.get_mut(pawn) else {
            return Err(DenyReason::PawnInvalid);
        };
        record.set_owner(Some(*agent));
        let Some(record) = self.agents.get_mut(agent) else {
            return Err(DenyReason::AgentInvalid);
        };
        record.insert_pawn(*pawn);

        self.validate_pawns(agent);

        Ok(previous)
    }

    /// Idempotent. Returns the owner the pawn had, if any.
    pub fn release(&mut self, pawn: &PawnKey) -> Option<AgentKey> {
        let record = self.pawns.get_mut(pawn)?;
        let owner = record.owner()?;
        record.set_owner(None);

        if let Some(agent) = self.agents.get_mut(&owner) {
            agent.remove_pawn(pawn);
        }

        Some(owner)
    }

    /// Clears out references to destroyed pawns, or pawns whose owner no
    /// longer points back at this agent. Returns what was pruned.
    pub fn validate_pawns(&mut self, agent: &AgentKey) -> Vec<PawnKey> {
        let pawns = &self.pawns;
        let Some(record) = self.agents.get_mut(agent) else {
            return Vec::new();
        };

        let mut pruned = Vec::new();
        record.retain_pawns(|pawn| {
            let keep = pawns
                .get(pawn)
                .map(|pawn| pawn.owner() == Some(*agent))
                .unwrap_or(false);
            if !keep {
                pruned.push(*pawn);
            }
            keep
        });
        pruned
    }

    /// Checks the single-owner and bidirectional invariants over the whole
    /// registry.
    pub fn check_consistency(&self) -> Result<(), String> {
        for (pawn_key, pawn) in self.pawns.iter() {
            let Some(owner) = pawn.owner() else {
                continue;
            };
            let Some(agent) = self.agents.get(&owner) else {
                return Err(format!("pawn {:?} owned by dead agent {:?}", pawn_key, owner));
            };
            if !agent.owns(&pawn_key) {
                return Err(format!(
                    "pawn {:?} names {:?} as owner but is missing from its set",
                    pawn_key, owner
                ));
            }
        }

        for (agent_key, agent) in self.agents.iter() {
            for pawn_key in agent.owned_pawns() {
                match self.pawns.get(pawn_key) {
                    Some(pawn) if pawn.owner() == Some(agent_key) => {}
                    Some(pawn) => {
                        return Err(format!(
                            "agent {:?} lists pawn {:?} owned by {:?}",
                            agent_key,
                            pawn_key,
                            pawn.owner()
                        ));
                    }
                    None => {
                        return Err(format!(
                            "agent {:?} lists dead pawn {:?}",
                            agent_key, pawn_key
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for OwnershipRegistry {
    fn default() -> Self {
        Self::new()
    }
}
