use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, Instant},
};

use kitbase_shared::{PawnKey, RequestId};

/// Outstanding take requests, at most one per pawn, expired in the order
/// they were sent.
pub struct PendingRequests {
    request_to_pawn: HashMap<RequestId, PawnKey>,
    pawn_to_request: HashMap<PawnKey, RequestId>,
    request_ttls: VecDeque<(Instant, RequestId)>,
    request_ttl: Duration,
}

impl PendingRequests {
    pub fn new(request_ttl: Duration) -> Self {
        Self {
            request_to_pawn: HashMap::new(),
            pawn_to_request: HashMap::new(),
            request_ttls: VecDeque::new(),
            request_ttl,
        }
    }

    pub fn insert(&mut self, request_id: RequestId, pawn: PawnKey, sent_at: Instant) {
        if let Some(previous) = self.pawn_to_request.insert(pawn, request_id) {
            self.request_to_pawn.remove(&previous);
        }
        self.request_to_pawn.insert(request_id, pawn);
        self.request_ttls.push_back((sent_at, request_id));
    }

    pub fn request_for(&self, pawn: &PawnKey) -> Option<RequestId> {
        self.pawn_to_request.get(pawn).copied()
    }

    pub fn contains_pawn(&self, pawn: &PawnKey) -> bool {
        self.pawn_to_request.contains_key(pawn)
    }

    /// Removes the request and returns the pawn it was for. `None` means the
    /// request already resolved or was never sent.
    pub fn resolve(&mut self, request_id: &RequestId) -> Option<PawnKey> {
        let pawn = self.request_to_pawn.remove(request_id)?;
        self.pawn_to_request.remove(&pawn);
        Some(pawn)
    }

    /// Drops every request older than the ttl and returns them, oldest first.
    pub fn expire(&mut self, now: &Instant) -> Vec<(RequestId, PawnKey)> {
        let mut expired = Vec::new();
        loop {
            let Some((sent_at, _)) = self.request_ttls.front() else {
                break;
            };
            if now.saturating_duration_since(*sent_at) < self.request_ttl {
                break;
            }
            let Some((_, request_id)) = self.request_ttls.pop_front() else {
                break;
            };
            // resolved requests leave their ttl entry behind
            if let Some(pawn) = self.resolve(&request_id) {
                expired.push((request_id, pawn));
            }
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.request_to_pawn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.request_to_pawn.is_empty()
    }
}
