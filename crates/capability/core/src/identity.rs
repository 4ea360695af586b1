//! Process-unique identities for individually-identified objects.

use parking_lot::Mutex;
use tracing::trace;

use crate::error::IdentityError;

/// Identity of an individually-identified object (an item stack instance).
///
/// Assigned lazily the first time the object needs one, never reused within
/// a process, and replicated verbatim so remote views agree on the integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ObjectId(pub u32);

impl core::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// Monotonic identity allocator.
///
/// Allocation is increment-and-return under a lock. [`restore`](Self::restore)
/// advances the counter past identities read back from persisted or replicated
/// state, so later allocations never collide with them.
///
/// `u32::MAX` is never handed out and never accepted: the counter must always
/// be able to move one past the largest identity it knows about.
#[derive(Debug)]
pub struct IdentityAllocator {
    next: Mutex<u32>,
}

impl IdentityAllocator {
    /// First identity handed out by a fresh allocator.
    pub const FIRST: u32 = 1;

    pub fn new() -> Self {
        Self {
            next: Mutex::new(Self::FIRST),
        }
    }

    /// Allocates a fresh identity.
    ///
    /// # Errors
    ///
    /// [`IdentityError::Exhausted`] once the counter reaches `u32::MAX`.
    pub fn allocate(&self) -> Result<ObjectId, IdentityError> {
        let mut next = self.next.lock();
        let id = ObjectId(*next);
        *next = next.checked_add(1).ok_or(IdentityError::Exhausted)?;
        trace!(target: "capability::identity", %id, "allocated identity");
        Ok(id)
    }

    /// Records an identity loaded from elsewhere and returns it.
    ///
    /// # Errors
    ///
    /// [`IdentityError::OutOfRange`] for `u32::MAX`. The counter is unchanged.
    pub fn restore(&self, id: ObjectId) -> Result<ObjectId, IdentityError> {
        let after = id
            .0
            .checked_add(1)
            .ok_or(IdentityError::OutOfRange { id })?;
        let mut next = self.next.lock();
        if after > *next {
            *next = after;
        }
        Ok(id)
    }

    /// The identity the next [`allocate`](Self::allocate) call will return.
    pub fn peek_next(&self) -> ObjectId {
        ObjectId(*self.next.lock())
    }
}

impl Default for IdentityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn allocates_monotonically_from_one() {
        let allocator = IdentityAllocator::new();
        assert_eq!(allocator.allocate(), Ok(ObjectId(1)));
        assert_eq!(allocator.allocate(), Ok(ObjectId(2)));
        assert_eq!(allocator.peek_next(), ObjectId(3));
    }

    #[test]
    fn restore_advances_past_loaded_identity() {
        let allocator = IdentityAllocator::new();
        allocator.restore(ObjectId(41)).unwrap();
        assert_eq!(allocator.allocate(), Ok(ObjectId(42)));

        // Restoring an older identity never rewinds the counter
        allocator.restore(ObjectId(7)).unwrap();
        assert_eq!(allocator.allocate(), Ok(ObjectId(43)));
    }

    #[test]
    fn max_identity_is_rejected_without_moving_the_counter() {
        let allocator = IdentityAllocator::new();
        let err = allocator.restore(ObjectId(u32::MAX)).unwrap_err();
        assert_eq!(err, IdentityError::OutOfRange { id: ObjectId(u32::MAX) });
        assert_eq!(allocator.peek_next(), ObjectId(IdentityAllocator::FIRST));
        assert_eq!(allocator.allocate(), Ok(ObjectId(1)));
    }

    #[test]
    fn allocation_stops_at_the_top_of_the_range() {
        let allocator = IdentityAllocator::new();
        let last = ObjectId(u32::MAX - 1);
        assert_eq!(allocator.restore(last), Ok(last));
        assert_eq!(allocator.peek_next(), ObjectId(u32::MAX));

        assert_eq!(allocator.allocate(), Err(IdentityError::Exhausted));
        assert_eq!(allocator.allocate(), Err(IdentityError::Exhausted));
        assert_eq!(allocator.peek_next(), ObjectId(u32::MAX));
    }

    #[test]
    fn concurrent_allocation_never_collides() {
        let allocator = Arc::new(IdentityAllocator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| allocator.allocate().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<ObjectId> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }
}
