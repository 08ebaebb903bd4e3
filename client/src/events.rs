use std::{mem, vec::IntoIter};

use log::warn;

use kitbase_shared::{AgentKey, AuthorityError, OwnerChange, PawnKey, TransferOutcome};

pub struct Events {
    assignments: Vec<AgentKey>,
    transfers: Vec<(PawnKey, TransferOutcome)>,
    owner_changes: Vec<(PawnKey, OwnerChange)>,
    errors: Vec<AuthorityError>,
    empty: bool,
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            assignments: Vec::new(),
            transfers: Vec::new(),
            owner_changes: Vec::new(),
            errors: Vec::new(),
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    pub(crate) fn push_assignment(&mut self, agent: &AgentKey) {
        self.assignments.push(*agent);
        self.empty = false;
    }

    pub(crate) fn push_transfer(&mut self, pawn: &PawnKey, outcome: TransferOutcome) {
        self.transfers.push((*pawn, outcome));
        self.empty = false;
    }

    pub(crate) fn push_owner_change(&mut self, pawn: &PawnKey, change: OwnerChange) {
        self.owner_changes.push((*pawn, change));
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
            warn!("Dropped {} Client Error Event(s)! Make sure to handle these through `events.read::<ErrorEvent>()`.", self.errors.len());
        }
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// AgentAssignedEvent
pub struct AgentAssignedEvent;
impl Event for AgentAssignedEvent {
    type Iter = IntoIter<AgentKey>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.assignments);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.assignments.is_empty()
    }
}

// TransferEvent
pub struct TransferEvent;
impl Event for TransferEvent {
    type Iter = IntoIter<(PawnKey, TransferOutcome)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.transfers);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.transfers.is_empty()
    }
}

// OwnerChangeEvent
pub struct OwnerChangeEvent;
impl Event for OwnerChangeEvent {
    type Iter = IntoIter<(PawnKey, OwnerChange)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.owner_changes);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.owner_changes.is_empty()
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
