use std::{fmt::Debug, hash::Hash, marker::PhantomData};

/// A key into an [`Arena`]. The generation makes a key taken before its slot
/// was freed resolve to nothing instead of to the slot's next occupant.
pub trait ArenaKey: Copy + Eq + Hash + Debug {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(&self) -> u32;
    fn generation(&self) -> u32;
}

struct Slot<V> {
    generation: u32,
    value: Option<V>,
}

/// Slot table with generation-checked keys.
pub struct Arena<K: ArenaKey, V> {
    slots: Vec<Slot<V>>,
    free: Vec<u32>,
    len: usize,
    max_slots: u32,
    phantom_k: PhantomData<K>,
}

impl<K: ArenaKey, V> Arena<K, V> {
    pub fn new() -> Self {
        Self::with_max_slots(u32::MAX)
    }

    /// An arena that never grows past `max_slots` slots. Freed slots are
    /// still reused once it is full.
    pub fn with_max_slots(max_slots: u32) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            max_slots,
            phantom_k: PhantomData,
        }
    }

    /// # Panics
    ///
    /// Panics if every slot is in use. See [`Arena::try_insert`].
    pub fn insert(&mut self, value: V) -> K {
        match self.try_insert(value) {
            Ok(key) => key,
            Err(_) => panic!("Arena is out of slots ({} in use)", self.len),
        }
    }

    /// Hands `value` back when every slot is in use.
    pub fn try_insert(&mut self, value: V) -> Result<K, V> {
        if let Some(index) = self.free.pop() {
            let Some(slot) = self.slots.get_mut(index as usize) else {
                return Err(value);
            };
            slot.value = Some(value);
            self.len += 1;
            return Ok(K::from_parts(index, slot.generation));
        }

        let index = match u32::try_from(self.slots.len()) {
            Ok(index) if index < self.max_slots => index,
            _ => return Err(value),
        };
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        self.len += 1;
        Ok(K::from_parts(index, 0))
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.slots.get_mut(key.index() as usize)?;
        if slot.generation != key.generation() {
            return None;
        }
        let value = slot.value.take()?;

        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index());
        self.len -= 1;

        Some(value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let slot = self.slots.get(key.index() as usize)?;
        if slot.generation != key.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let slot = self.slots.get_mut(key.index() as usize)?;
        if slot.generation != key.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Snapshot of every live key, in slot order.
    pub fn keys(&self) -> Vec<K> {
        self.iter().map(|(key, _)| key).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (K::from_parts(index as u32, slot.generation), value))
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<K: ArenaKey, V> Default for Arena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! arena_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl ArenaKey for $name {
            fn from_parts(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            fn index(&self) -> u32 {
                self.index
            }

            fn generation(&self) -> u32 {
                self.generation
            }
        }
    };
}

arena_key!(
    /// Handle to an Agent, assigned by the authoritative process.
    AgentKey
);
arena_key!(
    /// Handle to a Pawn, assigned by the authoritative process.
    PawnKey
);
