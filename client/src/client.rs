use std::{
    collections::{HashMap, VecDeque},
    mem,
    time::Instant,
};

use log::{debug, info, warn};

use kitbase_shared::{
    allow_ownership, check_route, run_hook, AgentKey, AttemptResult, AuthorityError, DenyReason,
    Eligibility, HostBoundMessage, HostSender, HostType, NetworkAuthoritative, OwnerBoundMessage,
    PawnKey, ReplicationUpdate, RequestId, Routed, TransferOutcome, TransferStatus,
};

use crate::{
    behavior::{BasicClientBehavior, ClientBehavior},
    events::Events,
    pending::PendingRequests,
    replica::Replica,
    ClientConfig,
};

/// A non-authoritative process. It never decides ownership itself: it asks
/// the host, waits for the answer, and mirrors what the host replicates.
pub struct Client {
    config: ClientConfig,
    behavior: Box<dyn ClientBehavior>,
    agent: Option<AgentKey>,
    replica: Replica,
    // Requests
    pending: PendingRequests,
    statuses: HashMap<PawnKey, TransferStatus>,
    next_request_id: RequestId,
    // Messages
    incoming_messages: VecDeque<OwnerBoundMessage>,
    outgoing_messages: VecDeque<HostBoundMessage>,
    // Events
    events: Events,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_behavior(config, Box::new(BasicClientBehavior))
    }

    pub fn with_behavior(config: ClientConfig, behavior: Box<dyn ClientBehavior>) -> Self {
        let pending = PendingRequests::new(config.request_timeout);
        Self {
            config,
            behavior,
            agent: None,
            replica: Replica::new(),
            pending,
            statuses: HashMap::new(),
            next_request_id: RequestId::new(0),
            incoming_messages: VecDeque::new(),
            outgoing_messages: VecDeque::new(),
            events: Events::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The agent the host assigned to this connection, once it has.
    pub fn agent(&self) -> Option<AgentKey> {
        self.agent
    }

    pub fn replica(&self) -> &Replica {
        &self.replica
    }

    pub fn owned_pawns(&self) -> Vec<PawnKey> {
        match self.agent {
            Some(agent) => self.replica.owned_pawns(&agent),
            None => Vec::new(),
        }
    }

    pub fn take_events(&mut self) -> Events {
        mem::replace(&mut self.events, Events::new())
    }

    //// Ownership

    /// Asks the host for `pawn`. `Request` means a request is in flight,
    /// either a new one or one sent earlier for the same pawn.
    pub fn request_take_pawn(&mut self, pawn: &PawnKey) -> AttemptResult {
        let Some(agent) = self.agent else {
            warn!("request_take_pawn before the host assigned an agent");
            return AttemptResult::Failure;
        };

        if self.pending.contains_pawn(pawn) {
            debug!("request for pawn {:?} already in flight", pawn);
            return AttemptResult::Request;
        }

        let Some(claim) = self.replica.pawn_claim(pawn) else {
            debug!("request_take_pawn for unknown pawn {:?}", pawn);
            return AttemptResult::Failure;
        };
        let Some(candidate) = self.replica.candidate(&agent) else {
            debug!("own agent {:?} is not replicated yet", agent);
            return AttemptResult::Failure;
        };
        if let Eligibility::Denied(reason) = allow_ownership(&candidate, &claim, true) {
            debug!("not requesting pawn {:?}: {}", pawn, reason.name());
            return AttemptResult::Failure;
        }

        let request_id = self.next_request_id;
        self.next_request_id = request_id.next();

        self.pending.insert(request_id, *pawn, Instant::now());
        self.statuses.insert(*pawn, TransferStatus::Requested);
        self.outgoing_messages
            .push_back(HostBoundMessage::RequestTakePawn {
                request_id,
                pawn: *pawn,
            });

        debug!("sent request {:?} for pawn {:?}", request_id, pawn);
        AttemptResult::Request
    }

    /// Only the host can assign ownership. This forwards the call as a take
    /// request and reports `Failure` for the direct assignment.
    pub fn add_pawn(&mut self, pawn: &PawnKey) -> AttemptResult {
        self.warn_unauthorized("add_pawn");
        self.request_take_pawn(pawn);
        AttemptResult::Failure
    }

    /// Only the host can release ownership.
    pub fn remove_pawn(&mut self, pawn: &PawnKey) {
        self.warn_unauthorized("remove_pawn");
        debug!("ignored remove_pawn for {:?}", pawn);
    }

    /// `Idle` when nothing was ever requested for `pawn`.
    pub fn transfer_status(&self, pawn: &PawnKey) -> TransferStatus {
        self.statuses
            .get(pawn)
            .copied()
            .unwrap_or(TransferStatus::Idle)
    }

    pub fn has_pending_request(&self, pawn: &PawnKey) -> bool {
        self.pending.contains_pawn(pawn)
    }

    /// Asks the host to rename this client's agent.
    pub fn set_name(&mut self, name: &str) {
        self.outgoing_messages.push_back(HostBoundMessage::SetName {
            name: name.to_string(),
        });
    }

    fn warn_unauthorized(&self, operation: &'static str) {
        warn!(
            "{}",
            AuthorityError::Unauthorized {
                operation,
                host_type: self.host_type().name(),
            }
        );
    }

    //// Simulation

    /// Ticks every pawn the replica says this client's agent owns.
    pub fn simulate(&mut self, delta_seconds: f32) {
        let Some(agent) = self.agent else {
            return;
        };

        for pawn in self.replica.owned_pawns(&agent) {
            if !self.behavior.can_simulate_pawn(&pawn) {
                continue;
            }
            let behavior = &mut self.behavior;
            let result = run_hook("simulate", || behavior.simulate_pawn(&pawn, delta_seconds));
            if let Err(error) = result {
                self.events.push_error(error);
            }
        }
    }

    //// Messages

    pub fn receive_message(&mut self, message: OwnerBoundMessage) {
        self.incoming_messages.push_back(message);
    }

    /// Applies queued host messages in arrival order, then resolves every
    /// request that has waited longer than the timeout as denied.
    pub fn process_all_messages(&mut self, now: Instant) {
        while let Some(message) = self.incoming_messages.pop_front() {
            match message {
                OwnerBoundMessage::AssignAgent { agent } => {
                    info!("host assigned agent {:?}", agent);
                    // a full snapshot follows every assignment
                    self.replica = Replica::new();
                    self.agent = Some(agent);
                    self.events.push_assignment(&agent);
                }
                OwnerBoundMessage::TakePawnResponse {
                    request_id,
                    pawn,
                    outcome,
                } => {
                    self.handle_take_pawn_response(request_id, &pawn, outcome);
                }
                OwnerBoundMessage::Replicate(update) => {
                    if let ReplicationUpdate::AgentDespawned { agent } = &update {
                        if self.agent == Some(*agent) {
                            warn!("host despawned our agent {:?}", agent);
                            self.agent = None;
                        }
                    }
                    if let Some((pawn, change)) = self.replica.apply(update) {
                        self.events.push_owner_change(&pawn, change);
                    }
                }
            }
        }

        for (request_id, pawn) in self.pending.expire(&now) {
            warn!("request {:?} for pawn {:?} timed out", request_id, pawn);
            self.finish_request(&pawn, TransferOutcome::Denied(DenyReason::TimedOut));
        }
    }

    fn handle_take_pawn_response(
        &mut self,
        request_id: RequestId,
        pawn: &PawnKey,
        outcome: TransferOutcome,
    ) {
        let Some(requested) = self.pending.resolve(&request_id) else {
            debug!("dropping late response {:?} for pawn {:?}", request_id, pawn);
            return;
        };
        if requested != *pawn {
            warn!(
                "response {:?} names pawn {:?}, request was for {:?}",
                request_id, pawn, requested
            );
        }

        debug!("response {:?} for pawn {:?}: {:?}", request_id, requested, outcome);
        self.finish_request(&requested, outcome);
    }

    /// A pawn that no longer exists has nobody left to tell, so its request
    /// is dropped without an event or hook call.
    fn finish_request(&mut self, pawn: &PawnKey, outcome: TransferOutcome) {
        if !self.replica.contains_pawn(pawn) {
            debug!("pawn {:?} is gone, dropping its request", pawn);
            self.statuses.remove(pawn);
            return;
        }

        self.statuses.insert(*pawn, outcome.status());
        self.events.push_transfer(pawn, outcome);

        let behavior = &mut self.behavior;
        let result = run_hook("on_take_pawn_response", || {
            behavior.on_take_pawn_response(pawn, &outcome)
        });
        if let Err(error) = result {
            self.events.push_error(error);
        }
    }

    pub fn has_outgoing_messages(&self) -> bool {
        !self.outgoing_messages.is_empty()
    }

    /// Hands every queued message to the transport. A message the transport
    /// refuses is logged and dropped; its request then times out.
    pub fn send_all_messages(&mut self, sender: &mut dyn HostSender) {
        let host_type = self.host_type();
        while let Some(message) = self.outgoing_messages.pop_front() {
            let reliable = message.flags().is_reliable();
            let result = check_route(&message, host_type, host_type.invert())
                .and_then(|()| sender.send(message));
            if let Err(error) = result {
                if reliable {
                    warn!("dropping message to host: {}", error);
                } else {
                    debug!("dropping message to host: {}", error);
                }
            }
        }
    }
}

impl NetworkAuthoritative for Client {
    fn host_type(&self) -> HostType {
        HostType::Client
    }
}
