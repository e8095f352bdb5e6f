//! Bounded arena and the emergency memory reserve.
//!
//! ## Reserve Protocol
//!
//! 1. At startup a [`MemoryReserve`] takes a margin out of the [`Arena`].
//! 2. When an allocation fails for lack of budget, the margin is handed
//!    back and the allocation retried once.
//! 3. If even the released margin cannot satisfy the request, the margin is
//!    taken again and the original `Allocation` signal is re-raised; the
//!    arena statistics are then identical to before the call.
//!
//! Every arena mutation validates first and mutates last, so a failing
//! [`Arena::allocate`] or [`Arena::free`] leaves the arena unchanged.
//!
//! ## Ownership
//!
//! Each arena carries a process-unique [`ArenaId`]. Block handles and
//! reserves remember the arena they came from and are refused by any other
//! arena. Freed slots are reused; a per-slot generation makes a stale
//! handle to a reused slot invalid.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::failure::{Fallible, FailureKind, FailureSignal};

/// Process-unique identity of an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaId(u64);

impl ArenaId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arena#{}", self.0)
    }
}

/// Handle to a live arena block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId {
    arena: ArenaId,
    slot: usize,
    generation: u64,
}

impl BlockId {
    pub fn arena(&self) -> ArenaId {
        self.arena
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/block#{}.{}", self.arena, self.slot, self.generation)
    }
}

/// Observable arena state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    pub capacity: usize,
    pub used: usize,
    pub live_blocks: usize,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    data: Option<Vec<u8>>,
}

/// Byte budget handing out zero-filled blocks.
#[derive(Debug)]
pub struct Arena {
    id: ArenaId,
    capacity: usize,
    used: usize,
    slots: Vec<Slot>,
}

impl Arena {
    pub fn new(capacity: usize) -> Self {
        Self {
            id: ArenaId::next(),
            capacity,
            used: 0,
            slots: Vec::new(),
        }
    }

    pub fn id(&self) -> ArenaId {
        self.id
    }

    pub fn available(&self) -> usize {
        self.capacity - self.used
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            capacity: self.capacity,
            used: self.used,
            live_blocks: self.slots.iter().filter(|s| s.data.is_some()).count(),
        }
    }

    /// Slots ever created, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Allocate `size` bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a zero-sized request
    /// - `Allocation` when the budget or the system allocator is exhausted
    pub fn allocate(&mut self, size: usize) -> Fallible<BlockId> {
        if size == 0 {
            return Err(FailureSignal::invalid_argument("zero-sized allocation"));
        }
        if size > self.available() {
            return Err(FailureSignal::allocation(format!(
                "{size} bytes requested, {} of {} available",
                self.available(),
                self.capacity
            )));
        }

        let mut block = Vec::new();
        block
            .try_reserve_exact(size)
            .map_err(|e| FailureSignal::allocation(format!("system allocator: {e}")))?;
        let free = self.slots.iter().position(|s| s.data.is_none());
        if free.is_none() {
            self.slots
                .try_reserve(1)
                .map_err(|e| FailureSignal::allocation(format!("block table: {e}")))?;
        }

        block.resize(size, 0);
        let slot = free.unwrap_or_else(|| {
            self.slots.push(Slot::default());
            self.slots.len() - 1
        });
        let entry = &mut self.slots[slot];
        entry.data = Some(block);
        let id = BlockId {
            arena: self.id,
            slot,
            generation: entry.generation,
        };
        self.used += size;
        tracing::trace!(%id, size, used = self.used, "allocated");
        Ok(id)
    }

    /// Release a block, returning its size.
    ///
    /// Handles from another arena, already freed blocks and stale handles
    /// to a reused slot are `InvalidArgument`.
    pub fn free(&mut self, id: BlockId) -> Fallible<usize> {
        self.check_owner(id.arena)?;
        let block = self
            .slots
            .get_mut(id.slot)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| {
                let data = s.data.take()?;
                s.generation += 1;
                Some(data)
            })
            .ok_or_else(|| FailureSignal::invalid_argument(format!("{id} is not live")))?;
        self.used -= block.len();
        tracing::trace!(%id, size = block.len(), used = self.used, "freed");
        Ok(block.len())
    }

    pub fn block(&self, id: BlockId) -> Option<&[u8]> {
        self.live(id)?.data.as_deref()
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut [u8]> {
        if id.arena != self.id {
            return None;
        }
        self.slots
            .get_mut(id.slot)
            .filter(|s| s.generation == id.generation)?
            .data
            .as_deref_mut()
    }

    fn live(&self, id: BlockId) -> Option<&Slot> {
        if id.arena != self.id {
            return None;
        }
        self.slots
            .get(id.slot)
            .filter(|s| s.generation == id.generation)
    }

    fn check_owner(&self, owner: ArenaId) -> Fallible<()> {
        if owner != self.id {
            return Err(FailureSignal::invalid_argument(format!(
                "handle from {owner} used with {}",
                self.id
            )));
        }
        Ok(())
    }
}

/// Margin held back from an [`Arena`] for emergency release.
#[derive(Debug)]
pub struct MemoryReserve {
    arena: ArenaId,
    bytes: usize,
    held: Option<BlockId>,
}

impl MemoryReserve {
    /// Take `bytes` out of `arena`.
    pub fn acquire(arena: &mut Arena, bytes: usize) -> Fallible<Self> {
        let held = arena.allocate(bytes)?;
        Ok(Self {
            arena: arena.id(),
            bytes,
            held: Some(held),
        })
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// The arena this margin belongs to.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }

    /// Hand the margin back to `arena`. Returns the bytes released, zero if
    /// the margin was not held.
    pub fn release(&mut self, arena: &mut Arena) -> Fallible<usize> {
        arena.check_owner(self.arena)?;
        match self.held {
            Some(id) => {
                let freed = arena.free(id)?;
                self.held = None;
                Ok(freed)
            }
            None => Ok(0),
        }
    }

    /// Take the margin again after it was released.
    pub fn replenish(&mut self, arena: &mut Arena) -> Fallible<()> {
        arena.check_owner(self.arena)?;
        if self.held.is_none() {
            self.held = Some(arena.allocate(self.bytes)?);
        }
        Ok(())
    }
}

/// Allocate `size` bytes, falling back on the reserve once.
///
/// Strong guarantee: on failure `arena.stats()` and `reserve.is_held()`
/// are exactly what they were before the call, and the signal is the one
/// raised by the first attempt.
#[must_use = "an allocation failure must be inspected"]
pub fn allocate_with_reserve(
    arena: &mut Arena,
    reserve: &mut MemoryReserve,
    size: usize,
) -> Fallible<BlockId> {
    arena.check_owner(reserve.arena())?;
    let signal = match arena.allocate(size) {
        Ok(id) => return Ok(id),
        Err(signal) if signal.kind() == FailureKind::Allocation && reserve.is_held() => signal,
        Err(signal) => return Err(signal),
    };

    if size > arena.available() + reserve.bytes() {
        tracing::debug!(size, reserve = reserve.bytes(), "reserve too small, not released");
        return Err(signal);
    }

    let freed = reserve.release(arena)?;
    tracing::warn!(freed, size, "allocation retried on memory reserve");
    match arena.allocate(size) {
        Ok(id) => Ok(id),
        Err(_) => {
            reserve.replenish(arena)?;
            Err(signal)
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_free_track_budget() {
        let mut arena = Arena::new(100);
        let a = arena.allocate(40).unwrap();
        let b = arena.allocate(60).unwrap();
        assert_eq!(arena.available(), 0);
        assert_eq!(arena.block(a).map(<[u8]>::len), Some(40));

        assert_eq!(arena.free(a).unwrap(), 40);
        assert_eq!(arena.stats(), ArenaStats { capacity: 100, used: 60, live_blocks: 1 });
        assert!(arena.block(a).is_none());
        arena.block_mut(b).unwrap()[0] = 7;
        assert_eq!(arena.block(b).unwrap()[0], 7);
    }

    #[test]
    fn failed_allocation_leaves_arena_unchanged() {
        let mut arena = Arena::new(10);
        let _ = arena.allocate(4).unwrap();
        let before = arena.stats();

        let err = arena.allocate(100_000_000).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Allocation);
        assert_eq!(arena.stats(), before);

        assert_eq!(arena.allocate(0).unwrap_err().kind(), FailureKind::InvalidArgument);
        assert_eq!(arena.stats(), before);
    }

    #[test]
    fn double_free_is_rejected() {
        let mut arena = Arena::new(10);
        let id = arena.allocate(5).unwrap();
        arena.free(id).unwrap();
        let before = arena.stats();
        assert_eq!(arena.free(id).unwrap_err().kind(), FailureKind::InvalidArgument);
        assert_eq!(arena.stats(), before);
    }

    #[test]
    fn reserve_rescues_allocation() {
        let mut arena = Arena::new(100);
        let mut reserve = MemoryReserve::acquire(&mut arena, 20).unwrap();
        let _bulk = arena.allocate(70).unwrap();

        let id = allocate_with_reserve(&mut arena, &mut reserve, 25).unwrap();
        assert!(!reserve.is_held());
        assert_eq!(arena.block(id).map(<[u8]>::len), Some(25));
    }

    #[test]
    fn reserve_kept_when_not_needed() {
        let mut arena = Arena::new(100);
        let mut reserve = MemoryReserve::acquire(&mut arena, 20).unwrap();
        allocate_with_reserve(&mut arena, &mut reserve, 10).unwrap();
        assert!(reserve.is_held());
    }

    #[test]
    fn hopeless_request_restores_state() {
        let mut arena = Arena::new(100);
        let mut reserve = MemoryReserve::acquire(&mut arena, 20).unwrap();
        let _bulk = arena.allocate(70).unwrap();
        let before = arena.stats();

        let err = allocate_with_reserve(&mut arena, &mut reserve, 1_000).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Allocation);
        assert!(err.message().contains("1000 bytes requested"));
        assert!(reserve.is_held());
        assert_eq!(arena.stats(), before);
    }

    #[test]
    fn non_allocation_failure_skips_reserve() {
        let mut arena = Arena::new(100);
        let mut reserve = MemoryReserve::acquire(&mut arena, 20).unwrap();
        let err = allocate_with_reserve(&mut arena, &mut reserve, 0).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidArgument);
        assert!(reserve.is_held());
    }

    #[test]
    fn replenish_after_release() {
        let mut arena = Arena::new(50);
        let mut reserve = MemoryReserve::acquire(&mut arena, 10).unwrap();
        assert_eq!(reserve.release(&mut arena).unwrap(), 10);
        assert_eq!(reserve.release(&mut arena).unwrap(), 0);
        reserve.replenish(&mut arena).unwrap();
        assert!(reserve.is_held());
        assert_eq!(arena.stats().used, 10);
    }

    #[test]
    fn reserve_refused_by_foreign_arena() {
        let mut home = Arena::new(100);
        let mut reserve = MemoryReserve::acquire(&mut home, 20).unwrap();
        let mut other = Arena::new(50);
        let user = other.allocate(40).unwrap();
        let (home_before, other_before) = (home.stats(), other.stats());

        let err = allocate_with_reserve(&mut other, &mut reserve, 30).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidArgument);
        assert_eq!(other.stats(), other_before);
        assert_eq!(other.block(user).map(<[u8]>::len), Some(40));
        assert_eq!(home.stats(), home_before);
        assert!(reserve.is_held());

        assert!(reserve.release(&mut other).is_err());
        assert!(reserve.replenish(&mut other).is_err());
        assert!(reserve.is_held());
        assert_eq!(reserve.arena(), home.id());
    }

    #[test]
    fn foreign_block_handle_is_rejected() {
        let mut a = Arena::new(10);
        let mut b = Arena::new(10);
        let in_a = a.allocate(4).unwrap();
        let in_b = b.allocate(6).unwrap();
        assert_ne!(in_a.arena(), in_b.arena());

        assert_eq!(b.free(in_a).unwrap_err().kind(), FailureKind::InvalidArgument);
        assert!(b.block(in_a).is_none());
        assert!(b.block_mut(in_a).is_none());
        assert_eq!(b.stats().used, 6);
        assert_eq!(a.free(in_a).unwrap(), 4);
    }

    #[test]
    fn release_cycles_reuse_slots() {
        let mut arena = Arena::new(64);
        let mut reserve = MemoryReserve::acquire(&mut arena, 16).unwrap();
        let _keep = arena.allocate(8).unwrap();
        let slots = arena.slot_count();

        for _ in 0..100 {
            reserve.release(&mut arena).unwrap();
            reserve.replenish(&mut arena).unwrap();
        }
        assert_eq!(arena.slot_count(), slots);
        assert_eq!(arena.stats(), ArenaStats { capacity: 64, used: 24, live_blocks: 2 });
    }

    #[test]
    fn stale_handle_to_reused_slot_is_rejected() {
        let mut arena = Arena::new(32);
        let old = arena.allocate(8).unwrap();
        arena.free(old).unwrap();
        let new = arena.allocate(8).unwrap();
        assert_eq!(arena.slot_count(), 1);

        assert!(arena.block(old).is_none());
        assert_eq!(arena.free(old).unwrap_err().kind(), FailureKind::InvalidArgument);
        assert_eq!(arena.block(new).map(<[u8]>::len), Some(8));
    }
}
