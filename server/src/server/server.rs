use std::{
    collections::{HashMap, VecDeque},
    mem,
};

use log::{debug, info, warn};

use kitbase_shared::{
    allow_ownership, check_route, run_hook, AgentKey, AttemptResult, AuthorityError,
    ConnectionRef, DenyReason, HostBoundMessage, HostType, Identity, NetworkAuthoritative,
    OwnerBoundMessage, OwnerChange, OwnerSender, PawnClaim, PawnKey, ReplicationUpdate, RequestId,
    Routed, TransferOutcome,
};

use crate::{
    agency::{
        agent::{Agent, AgentBehavior, BasicAgent},
        pawn::{BasicPawn, Pawn, PawnBehavior, PawnConfig},
        registry::OwnershipRegistry,
    },
    events::Events,
    ConnectionRecord, ServerConfig,
};

/// The authoritative process. Owns the [`OwnershipRegistry`], evaluates every
/// ownership transfer, and replicates the results to connected clients.
///
/// Everything runs on the caller's simulation thread: inbound messages are
/// queued by [`Server::receive_message`] and evaluated one at a time, in
/// arrival order, by [`Server::process_all_messages`].
pub struct Server {
    config: ServerConfig,
    registry: OwnershipRegistry,
    // Connections
    connections: HashMap<ConnectionRef, ConnectionRecord>,
    identity_history: HashMap<ConnectionRef, Identity>,
    // Messages
    incoming_messages: VecDeque<(ConnectionRef, HostBoundMessage)>,
    outgoing_messages: VecDeque<(ConnectionRef, OwnerBoundMessage)>,
    // Events
    events: Events,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let registry = OwnershipRegistry::with_player_connection(config.require_player_connection);
        Self {
            config,
            registry,
            connections: HashMap::new(),
            identity_history: HashMap::new(),
            incoming_messages: VecDeque::new(),
            outgoing_messages: VecDeque::new(),
            events: Events::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &OwnershipRegistry {
        &self.registry
    }

    pub fn take_events(&mut self) -> Events {
        mem::replace(&mut self.events, Events::new())
    }

    //// Connections

    /// Finds the agent for this connection, or creates a player agent for it.
    pub fn connect(&mut self, connection: ConnectionRef, display_name: &str) -> AgentKey {
        self.connect_with_behavior(connection, display_name, Box::new(BasicAgent))
    }

    pub fn connect_with_behavior(
        &mut self,
        connection: ConnectionRef,
        display_name: &str,
        behavior: Box<dyn AgentBehavior>,
    ) -> AgentKey {
        if let Some(agent) = self.find_agent(&connection) {
            debug!("connection {} already has agent {:?}", connection, agent);
            return agent;
        }

        let identity = Identity::user(connection, display_name);
        let agent = self
            .registry
            .insert_agent(Agent::new(true, Some(identity.clone()), behavior));

        // existing observers learn about the newcomer, the newcomer gets a
        // full snapshot below
        self.replicate(ReplicationUpdate::AgentSpawned {
            agent,
            is_player: true,
            identity: Some(identity.clone()),
            connected: true,
        });

        self.connections
            .insert(connection, ConnectionRecord::new(connection, agent));
        self.identity_history.insert(connection, identity);

        self.send_to(&connection, OwnerBoundMessage::AssignAgent { agent });
        self.send_snapshot(&connection);

        info!("assigned connection {} to agent {:?}", connection, agent);
        self.events.push_connection(&connection, &agent);

        agent
    }

    pub fn find_agent(&self, connection: &ConnectionRef) -> Option<AgentKey> {
        let agent = self.connections.get(connection)?.agent();
        if self.registry.contains_agent(&agent) {
            Some(agent)
        } else {
            None
        }
    }

    pub fn connection(&self, connection: &ConnectionRef) -> Option<&ConnectionRecord> {
        self.connections.get(connection)
    }

    pub fn connections(&self) -> impl Iterator<Item = &ConnectionRecord> {
        self.connections.values()
    }

    /// Last identity seen for every connection, including ones that left.
    pub fn identity_history(&self) -> &HashMap<ConnectionRef, Identity> {
        &self.identity_history
    }

    /// An inactive connection keeps its agent, but the agent's claims lapse
    /// and it can't take new pawns until the connection is active again.
    pub fn set_connection_active(&mut self, connection: &ConnectionRef, active: bool) -> bool {
        let Some(record) = self.connections.get_mut(connection) else {
            warn!("set_connection_active for unknown connection {}", connection);
            return false;
        };
        if record.is_active() == active {
            return true;
        }
        record.set_active(active);

        let agent = record.agent();
        if let Some(record) = self.registry.agent_mut(&agent) {
            record.set_connected(active);
        }

        info!("connection {} is now {}", connection, if active { "active" } else { "inactive" });
        self.replicate(ReplicationUpdate::AgentConnectivity {
            agent,
            connected: active,
        });

        // nothing was replicated to it while inactive
        if active {
            self.send_to(connection, OwnerBoundMessage::AssignAgent { agent });
            self.send_snapshot(connection);
        }

        true
    }

    /// Releases every pawn of the connection's agent, then destroys the agent.
    pub fn disconnect(&mut self, connection: &ConnectionRef) {
        let Some(record) = self.connections.remove(connection) else {
            warn!("disconnect for unknown connection {}", connection);
            return;
        };
        let agent = record.agent();

        info!("connection {} left, cleaning up agent {:?}", connection, agent);
        self.despawn_agent(&agent);
        self.events.push_disconnection(connection, &agent);
    }

    //// Agents

    pub fn spawn_bot(&mut self, display_name: &str, is_player: bool) -> AgentKey {
        self.spawn_bot_with_behavior(display_name, is_player, Box::new(BasicAgent))
    }

    pub fn spawn_bot_with_behavior(
        &mut self,
        display_name: &str,
        is_player: bool,
        behavior: Box<dyn AgentBehavior>,
    ) -> AgentKey {
        let identity = Identity::bot(display_name);
        let agent = self
            .registry
            .insert_agent(Agent::new(is_player, Some(identity.clone()), behavior));

        info!("spawned agent {:?} for {}", agent, identity);
        self.replicate(ReplicationUpdate::AgentSpawned {
            agent,
            is_player,
            identity: Some(identity),
            connected: true,
        });

        agent
    }

    /// Every owned pawn is released first. Returns false for a stale key.
    pub fn despawn_agent(&mut self, agent: &AgentKey) -> bool {
        if !self.registry.contains_agent(agent) {
            return false;
        }

        for pawn in self.registry.owned_pawns(agent) {
            self.remove_pawn(agent, &pawn);
        }

        let Some((removed, leftover)) = self.registry.remove_agent(agent) else {
            return false;
        };
        for pawn in leftover {
            warn!("pawn {:?} was still held by despawned agent {:?}", pawn, agent);
            self.replicate(ReplicationUpdate::PawnOwner { pawn, owner: None });
        }

        if let Some(connection) = removed.connection() {
            let own_record = self
                .connections
                .get(&connection)
                .filter(|record| record.agent() == *agent)
                .map(|record| record.is_active());
            if let Some(active) = own_record {
                // the broadcast below no longer reaches this connection
                if active {
                    self.send_to(
                        &connection,
                        OwnerBoundMessage::Replicate(ReplicationUpdate::AgentDespawned {
                            agent: *agent,
                        }),
                    );
                }
                self.connections.remove(&connection);
            }
        }

        info!("despawned agent {:?} ({})", agent, removed.display_name());
        self.replicate(ReplicationUpdate::AgentDespawned { agent: *agent });

        true
    }

    pub fn agent(&self, agent: &AgentKey) -> Option<&Agent> {
        self.registry.agent(agent)
    }

    /// Renames an agent the host drives. Agents driven by a remote user can
    /// only be renamed by that user.
    pub fn rename_agent(&mut self, agent: &AgentKey, display_name: &str) -> bool {
        let Some(record) = self.registry.agent(agent) else {
            return false;
        };
        if record.is_remote() {
            warn!(
                "{}",
                AuthorityError::Unauthorized {
                    operation: "rename_agent",
                    host_type: HostType::Server.name(),
                }
            );
            return false;
        }
        self.apply_rename(agent, display_name)
    }

    fn apply_rename(&mut self, agent: &AgentKey, display_name: &str) -> bool {
        let Some(record) = self.registry.agent_mut(agent) else {
            return false;
        };
        let Some(identity) = record.identity() else {
            warn!("agent {:?} has no identity to rename", agent);
            return false;
        };
        let identity = identity.renamed(display_name);
        record.set_identity(identity.clone());

        if let Some(connection) = identity.connection() {
            self.identity_history.insert(connection, identity.clone());
        }

        info!("agent {:?} renamed to {}", agent, identity.display_name());
        self.replicate(ReplicationUpdate::AgentRenamed {
            agent: *agent,
            identity,
        });

        true
    }

    //// Pawns

    pub fn spawn_pawn(&mut self, config: PawnConfig) -> PawnKey {
        self.spawn_pawn_with_behavior(config, Box::new(BasicPawn))
    }

    pub fn spawn_pawn_with_behavior(
        &mut self,
        config: PawnConfig,
        behavior: Box<dyn PawnBehavior>,
    ) -> PawnKey {
        let pawn = self.registry.insert_pawn(Pawn::new(config, behavior));
        self.replicate(ReplicationUpdate::PawnSpawned {
            pawn,
            requires_player: config.requires_player,
        });
        pawn
    }

    /// Forces release first. Returns false for a stale key.
    pub fn despawn_pawn(&mut self, pawn: &PawnKey) -> bool {
        if !self.registry.contains_pawn(pawn) {
            return false;
        }

        self.release_pawn(pawn);

        let Some((_, former_owner)) = self.registry.remove_pawn(pawn) else {
            return false;
        };
        if let Some(owner) = former_owner {
            warn!("pawn {:?} was still held by {:?} while despawning", pawn, owner);
            self.registry.validate_pawns(&owner);
        }

        self.replicate(ReplicationUpdate::PawnDespawned { pawn: *pawn });
        true
    }

    pub fn pawn(&self, pawn: &PawnKey) -> Option<&Pawn> {
        self.registry.pawn(pawn)
    }

    pub fn owner_of(&self, pawn: &PawnKey) -> Option<AgentKey> {
        self.registry.owner_of(pawn)
    }

    pub fn owned_pawns(&self, agent: &AgentKey) -> Vec<PawnKey> {
        self.registry.owned_pawns(agent)
    }

    //// Ownership

    pub fn add_pawn(&mut self, agent: &AgentKey, pawn: &PawnKey) -> AttemptResult {
        match self.try_add_pawn(agent, pawn) {
            Ok(()) => AttemptResult::Success,
            Err(error) => {
                debug!("add_pawn failed: {}", error);
                AttemptResult::Failure
            }
        }
    }

    pub fn try_add_pawn(&mut self, agent: &AgentKey, pawn: &PawnKey) -> Result<(), AuthorityError> {
        self.transfer(agent, pawn)
            .map_err(|reason| deny_error(agent, pawn, reason))
    }

    /// No-op unless `agent` owns `pawn`. Always re-validates the agent's
    /// owned set afterwards.
    pub fn remove_pawn(&mut self, agent: &AgentKey, pawn: &PawnKey) {
        if !self.registry.contains_agent(agent) {
            debug!("remove_pawn on stale agent {:?}", agent);
            return;
        }

        if self.registry.owner_of(pawn) == Some(*agent) {
            self.registry.release(pawn);

            info!("pawn {:?} lost owner {:?}", pawn, agent);
            self.notify_owner_changed(
                pawn,
                OwnerChange {
                    old: Some(*agent),
                    new: None,
                },
            );
            self.notify_lose(agent, pawn);
            self.replicate(ReplicationUpdate::PawnOwner {
                pawn: *pawn,
                owner: None,
            });
        }

        for pruned in self.registry.validate_pawns(agent) {
            debug!("pruned stale pawn {:?} from agent {:?}", pruned, agent);
        }
    }

    /// Releases the pawn from whoever owns it. Idempotent.
    pub fn release_pawn(&mut self, pawn: &PawnKey) {
        let Some(owner) = self.registry.owner_of(pawn) else {
            return;
        };
        if self.registry.contains_agent(&owner) {
            self.remove_pawn(&owner, pawn);
        } else {
            self.registry.release(pawn);
            self.replicate(ReplicationUpdate::PawnOwner {
                pawn: *pawn,
                owner: None,
            });
        }
    }

    /// Host override: moves the pawn to `owner` regardless of who holds it
    /// now, provided `owner` would be eligible for an unclaimed pawn. If the
    /// final assignment fails the pawn is left unowned.
    pub fn set_pawn_owner(&mut self, pawn: &PawnKey, owner: Option<AgentKey>) -> AttemptResult {
        if !self.registry.contains_pawn(pawn) {
            return AttemptResult::Failure;
        }
        if self.registry.owner_of(pawn) == owner {
            return AttemptResult::Success;
        }
        let Some(agent) = owner else {
            self.release_pawn(pawn);
            return AttemptResult::Success;
        };

        if let Err(reason) = self.check_eligibility(&agent, pawn, true) {
            debug!("set_pawn_owner({:?}, {:?}) rejected: {}", pawn, agent, reason.name());
            return AttemptResult::Failure;
        }

        self.release_pawn(pawn);
        let result = self.add_pawn(&agent, pawn);
        if result == AttemptResult::Failure {
            warn!("failed to add pawn {:?} to agent {:?}, leaving it unowned", pawn, agent);
        }
        result
    }

    /// A take request made on the host. Evaluated right away, no round trip.
    pub fn request_take_pawn(&mut self, agent: &AgentKey, pawn: &PawnKey) -> AttemptResult {
        self.try_take_pawn(agent, pawn).attempt()
    }

    pub fn try_take_pawn(&mut self, agent: &AgentKey, pawn: &PawnKey) -> TransferOutcome {
        let outcome: TransferOutcome = self.transfer(agent, pawn).into();
        debug!("local take request {:?} -> {:?}: {:?}", agent, pawn, outcome);
        self.events.push_transfer(agent, pawn, outcome);

        if !self.registry.contains_pawn(pawn) {
            return outcome;
        }
        if let Some(record) = self.registry.agent_mut(agent) {
            let result = run_hook("on_take_pawn_response", || {
                record.behavior.on_take_pawn_response(pawn, &outcome)
            });
            if let Err(error) = result {
                self.events.push_error(error);
            }
        }

        outcome
    }

    fn transfer(&mut self, agent: &AgentKey, pawn: &PawnKey) -> Result<(), DenyReason> {
        self.check_eligibility(agent, pawn, false)?;

        let previous = self.registry.try_assign(pawn, agent)?;
        if previous != Some(*agent) {
            self.on_owner_assigned(agent, pawn, previous);
        }

        Ok(())
    }

    /// Server-side re-validation: pawn, agent, connectivity, shared policy,
    /// per-agent cap, then the pawn's own hook.
    fn check_eligibility(
        &mut self,
        agent: &AgentKey,
        pawn: &PawnKey,
        ignore_current_claim: bool,
    ) -> Result<(), DenyReason> {
        let mut claim: PawnClaim = self.registry.pawn_claim(pawn).ok_or(DenyReason::PawnInvalid)?;
        let candidate = self.registry.candidate(agent).ok_or(DenyReason::AgentInvalid)?;
        if ignore_current_claim {
            claim.owner = None;
        }

        allow_ownership(&candidate, &claim, self.config.require_player_connection)
            .into_result()?;

        if let Some(max) = self.config.max_pawns_per_agent {
            let already_owner = claim.owner.map(|owner| owner.agent) == Some(*agent);
            let owned = self.registry.owned_pawns(agent).len();
            if !already_owner && owned >= max {
                return Err(DenyReason::AgentFull);
            }
        }

        let Some(record) = self.registry.pawn(pawn) else {
            return Err(DenyReason::PawnInvalid);
        };
        let verdict = run_hook("allow_ownership", || {
            record.behavior.allow_ownership(&candidate)
        });
        match verdict {
            Ok(eligibility) => eligibility.into_result(),
            Err(error) => {
                self.events.push_error(error);
                Err(DenyReason::HookFault)
            }
        }
    }

    fn on_owner_assigned(&mut self, agent: &AgentKey, pawn: &PawnKey, previous: Option<AgentKey>) {
        match previous {
            Some(old) => {
                info!("pawn {:?} owner changed: {:?} -> {:?}", pawn, old, agent);
                self.notify_lose(&old, pawn);
            }
            None => info!("pawn {:?} gained owner {:?}", pawn, agent),
        }

        self.notify_owner_changed(
            pawn,
            OwnerChange {
                old: previous,
                new: Some(*agent),
            },
        );

        if let Some(record) = self.registry.agent_mut(agent) {
            let result = run_hook("on_gain_pawn", || record.behavior.on_gain_pawn(pawn));
            if let Err(error) = result {
                self.events.push_error(error);
            }
        }
        self.events.push_gain(agent, pawn);

        self.replicate(ReplicationUpdate::PawnOwner {
            pawn: *pawn,
            owner: Some(*agent),
        });
    }

    fn notify_lose(&mut self, agent: &AgentKey, pawn: &PawnKey) {
        let Some(record) = self.registry.agent_mut(agent) else {
            return;
        };
        let result = run_hook("on_lose_pawn", || record.behavior.on_lose_pawn(pawn));
        if let Err(error) = result {
            self.events.push_error(error);
        }
        self.events.push_loss(agent, pawn);
    }

    fn notify_owner_changed(&mut self, pawn: &PawnKey, change: OwnerChange) {
        let Some(record) = self.registry.pawn_mut(pawn) else {
            return;
        };
        let result = run_hook("on_owner_changed", || record.behavior.on_owner_changed(&change));
        if let Err(error) = result {
            self.events.push_error(error);
        }
    }

    //// Simulation

    /// Forwards the tick to every live, simulate-eligible pawn of each agent
    /// this process drives. Proxies of remote users are skipped; their own
    /// process simulates them.
    pub fn simulate(&mut self, delta_seconds: f32) {
        for agent in self.registry.agent_keys() {
            let Some(record) = self.registry.agent(&agent) else {
                continue;
            };
            if !record.can_simulate() {
                continue;
            }

            for pawn in self.registry.owned_pawns(&agent) {
                let Some(record) = self.registry.pawn_mut(&pawn) else {
                    continue;
                };
                if record.owner() != Some(agent) || !record.behavior.can_simulate() {
                    continue;
                }
                let result = run_hook("simulate", || record.behavior.simulate(delta_seconds));
                if let Err(error) = result {
                    self.events.push_error(error);
                }
            }
        }
    }

    //// Messages

    /// Queues a message from `origin`. The acting agent is looked up from
    /// `origin` when the message is processed.
    pub fn receive_message(&mut self, origin: ConnectionRef, message: HostBoundMessage) {
        if !self.connections.contains_key(&origin) {
            warn!("dropping {:?} from unknown connection {}", message, origin);
            return;
        }
        self.incoming_messages.push_back((origin, message));
    }

    /// Evaluates queued messages in arrival order. Each request is fully
    /// applied before the next one is looked at.
    pub fn process_all_messages(&mut self) {
        while let Some((origin, message)) = self.incoming_messages.pop_front() {
            match message {
                HostBoundMessage::RequestTakePawn { request_id, pawn } => {
                    self.handle_take_pawn_request(&origin, request_id, &pawn);
                }
                HostBoundMessage::SetName { name } => {
                    self.handle_set_name(&origin, &name);
                }
            }
        }
    }

    fn handle_take_pawn_request(
        &mut self,
        origin: &ConnectionRef,
        request_id: RequestId,
        pawn: &PawnKey,
    ) {
        let outcome = match self.find_agent(origin) {
            Some(agent) => {
                let outcome: TransferOutcome = self.transfer(&agent, pawn).into();
                self.events.push_transfer(&agent, pawn, outcome);
                outcome
            }
            None => {
                warn!("take request from {} which has no live agent", origin);
                TransferOutcome::Denied(DenyReason::AgentInvalid)
            }
        };

        debug!(
            "request {:?} from {} for pawn {:?}: {:?}",
            request_id, origin, pawn, outcome
        );
        self.send_to(
            origin,
            OwnerBoundMessage::TakePawnResponse {
                request_id,
                pawn: *pawn,
                outcome,
            },
        );
    }

    fn handle_set_name(&mut self, origin: &ConnectionRef, name: &str) {
        let Some(agent) = self.find_agent(origin) else {
            warn!("rename from {} which has no live agent", origin);
            return;
        };
        self.apply_rename(&agent, name);
    }

    pub fn has_outgoing_messages(&self) -> bool {
        !self.outgoing_messages.is_empty()
    }

    /// Hands every queued message to the transport. A message the transport
    /// refuses is logged and dropped.
    pub fn send_all_messages(&mut self, sender: &mut dyn OwnerSender) {
        let host_type = self.host_type();
        while let Some((connection, message)) = self.outgoing_messages.pop_front() {
            let reliable = message.flags().is_reliable();
            let result = check_route(&message, host_type, host_type.invert())
                .and_then(|()| sender.send(&connection, message));
            if let Err(error) = result {
                if reliable {
                    warn!("dropping message to {}: {}", connection, error);
                } else {
                    debug!("dropping message to {}: {}", connection, error);
                }
            }
        }
    }

    fn send_to(&mut self, connection: &ConnectionRef, message: OwnerBoundMessage) {
        if !self.connections.contains_key(connection) {
            debug!("dropping {:?} for departed connection {}", message, connection);
            return;
        }
        self.outgoing_messages.push_back((*connection, message));
    }

    fn replicate(&mut self, update: ReplicationUpdate) {
        let mut targets: Vec<ConnectionRef> = self
            .connections
            .values()
            .filter(|record| record.is_active())
            .map(|record| record.connection())
            .collect();
        targets.sort();

        for connection in targets {
            self.outgoing_messages
                .push_back((connection, OwnerBoundMessage::Replicate(update.clone())));
        }
    }

    fn send_snapshot(&mut self, connection: &ConnectionRef) {
        let mut updates = Vec::new();
        for (agent, record) in self.registry.agents() {
            updates.push(ReplicationUpdate::AgentSpawned {
                agent,
                is_player: record.is_player(),
                identity: record.identity().cloned(),
                connected: record.connected(),
            });
        }
        for (pawn, record) in self.registry.pawns() {
            updates.push(ReplicationUpdate::PawnSpawned {
                pawn,
                requires_player: record.requires_player(),
            });
        }
        for (pawn, record) in self.registry.pawns() {
            if let Some(owner) = record.owner() {
                updates.push(ReplicationUpdate::PawnOwner {
                    pawn,
                    owner: Some(owner),
                });
            }
        }

        for update in updates {
            self.send_to(connection, OwnerBoundMessage::Replicate(update));
        }
    }
}

impl NetworkAuthoritative for Server {
    fn host_type(&self) -> HostType {
        HostType::Server
    }
}

fn deny_error(agent: &AgentKey, pawn: &PawnKey, reason: DenyReason) -> AuthorityError {
    match reason {
        DenyReason::PawnInvalid => AuthorityError::invalid_target("add_pawn", pawn),
        DenyReason::AgentInvalid => AuthorityError::invalid_target("add_pawn", agent),
        reason => AuthorityError::EligibilityDenied {
            agent: format!("{:?}", agent),
            pawn: format!("{:?}", pawn),
            reason,
        },
    }
}
