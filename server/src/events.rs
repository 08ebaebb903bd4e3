use std::{mem, vec::IntoIter};

use log::warn;

use kitbase_shared::{AgentKey, AuthorityError, ConnectionRef, PawnKey, TransferOutcome};

pub struct Events {
    connections: Vec<(ConnectionRef, AgentKey)>,
    disconnections: Vec<(ConnectionRef, AgentKey)>,
    gains: Vec<(AgentKey, PawnKey)>,
    losses: Vec<(AgentKey, PawnKey)>,
    transfers: Vec<(AgentKey, PawnKey, TransferOutcome)>,
    errors: Vec<AuthorityError>,
    empty: bool,
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            disconnections: Vec::new(),
            gains: Vec::new(),
            losses: Vec::new(),
            transfers: Vec::new(),
            errors: Vec::new(),
            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, connection: &ConnectionRef, agent: &AgentKey) {
        self.connections.push((*connection, *agent));
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, connection: &ConnectionRef, agent: &AgentKey) {
        self.disconnections.push((*connection, *agent));
        self.empty = false;
    }

    pub(crate) fn push_gain(&mut self, agent: &AgentKey, pawn: &PawnKey) {
        self.gains.push((*agent, *pawn));
        self.empty = false;
    }

    pub(crate) fn push_loss(&mut self, agent: &AgentKey, pawn: &PawnKey) {
        self.losses.push((*agent, *pawn));
        self.empty = false;
    }

    pub(crate) fn push_transfer(
        &mut self,
        agent: &AgentKey,
        pawn: &PawnKey,
        outcome: TransferOutcome,
    ) {
        self.transfers.push((*agent, *pawn, outcome));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: AuthorityError) {
        self.errors.push(error);
        self.empty = false;
    }
}

impl Drop for Events {
    fn drop(&mut self) {
        if !self.errors.is_empty() {
            warn!("Dropped {} Server Error Event(s)! Make sure to handle these through `events.read::<ErrorEvent>()`.", self.errors.len());
        }
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// ConnectEvent
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<(ConnectionRef, AgentKey)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.connections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.connections.is_empty()
    }
}

// DisconnectEvent
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    type Iter = IntoIter<(ConnectionRef, AgentKey)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.disconnections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}

// GainPawnEvent
pub struct GainPawnEvent;
impl Event for GainPawnEvent {
    type Iter = IntoIter<(AgentKey, PawnKey)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.gains);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.gains.is_empty()
    }
}

// LosePawnEvent
pub struct LosePawnEvent;
impl Event for LosePawnEvent {
    type Iter = IntoIter<(AgentKey, PawnKey)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.losses);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.losses.is_empty()
    }
}

// TransferEvent
pub struct TransferEvent;
impl Event for TransferEvent {
    type Iter = IntoIter<(AgentKey, PawnKey, TransferOutcome)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.transfers);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.transfers.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<AuthorityError>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.errors);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.errors.is_empty()
    }
}
