//! Generational arena mapping integer tokens to owned sessions.
//!
//! Token layout: high 32 bits generation, low 32 bits `slot index + 1`.
//! Zero is never issued, so it serves as the null token. Removing a session
//! bumps its slot's generation, so stale tokens stop resolving even after
//! the slot is reused.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

struct Slot<T> {
    generation: u32,
    entry: Option<Arc<Mutex<T>>>,
}

struct Slots<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

/// Thread-safe token registry.
///
/// Lookups clone the entry out under a read lock, so independent sessions
/// never contend beyond that.
pub struct Registry<T> {
    inner: RwLock<Slots<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Slots {
                slots: Vec::new(),
                free: Vec::new(),
            }),
        }
    }

    /// Stores `value` and returns its token (never zero).
    pub fn insert(&self, value: T) -> u64 {
        let mut inner = self.inner.write();
        let entry = Some(Arc::new(Mutex::new(value)));
        let index = match inner.free.pop() {
            Some(index) => {
                inner.slots[index as usize].entry = entry;
                index
            }
            None => {
                inner.slots.push(Slot {
                    generation: 1,
                    entry,
                });
                (inner.slots.len() - 1) as u32
            }
        };
        encode_token(index, inner.slots[index as usize].generation)
    }

    /// Resolves a token to its session, or `None` if null or stale.
    pub fn get(&self, token: u64) -> Option<Arc<Mutex<T>>> {
        let (index, generation) = decode_token(token)?;
        let inner = self.inner.read();
        let slot = inner.slots.get(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.entry.clone()
    }

    /// Detaches the session behind `token`. Returns `None` if the token is
    /// null or stale, so removing twice is harmless.
    pub fn remove(&self, token: u64) -> Option<Arc<Mutex<T>>> {
        let (index, generation) = decode_token(token)?;
        let mut inner = self.inner.write();
        let slot = inner.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1).max(1);
        inner.free.push(index);
        Some(entry)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.inner.read().slots.iter().filter(|s| s.entry.is_some()).count()
    }
}

fn encode_token(index: u32, generation: u32) -> u64 {
    ((generation as u64) << 32) | (index as u64 + 1)
}

fn decode_token(token: u64) -> Option<(u32, u32)> {
    let low = (token & 0xFFFF_FFFF) as u32;
    if low == 0 {
        return None;
    }
    Some((low - 1, (token >> 32) as u32))
}
