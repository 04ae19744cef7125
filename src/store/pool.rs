//! Arena of coordinate blocks with a LIFO free list
//!
//! Blocks are created lazily on first touch. Retiring a block moves its slot
//! to the free list without clearing it; the slot is only reset when it is
//! handed out again, so read-only queries can still see the evidence of a
//! retired block until its memory is reused.

use std::collections::HashMap;

use bitvec::prelude::*;
use tracing::trace;

use super::cache::{LastBlockCache, SlotId};
use crate::blocking::{block_key, block_region, BlockKey, CoordinateBlock};
use crate::space::{SpaceProfile, SpaceTracker};
use crate::EvidenceError;

/// Owns every block slot of one store.
#[derive(Debug)]
pub struct BlockPool {
    slots: Vec<CoordinateBlock>,
    /// Key each slot was last bound to
    slot_keys: Vec<BlockKey>,
    live: HashMap<BlockKey, SlotId>,
    /// Retired slots whose contents have not been recycled yet
    retired: HashMap<BlockKey, SlotId>,
    free: Vec<SlotId>,
    live_mask: BitVec,
    cache: LastBlockCache,
    block_size: u32,
    track_read_summaries: bool,
    space: SpaceTracker,
}

impl BlockPool {
    /// Empty pool handing out blocks of `block_size` positions.
    pub fn new(block_size: u32, track_read_summaries: bool, profile_space: bool) -> Self {
        Self {
            slots: Vec::new(),
            slot_keys: Vec::new(),
            live: HashMap::new(),
            retired: HashMap::new(),
            free: Vec::new(),
            live_mask: BitVec::new(),
            cache: LastBlockCache::new(),
            block_size,
            track_read_summaries,
            space: SpaceTracker::new(profile_space),
        }
    }

    /// Block width.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Block index of `position`.
    pub fn key_of(&self, position: u32) -> Result<BlockKey, EvidenceError> {
        block_key(position, self.block_size)
    }

    fn live_slot(&self, position: u32) -> Result<Option<SlotId>, EvidenceError> {
        let key = self.key_of(position)?;
        if let Some(slot) = self.cache.get(position) {
            debug_assert!(self.live_mask[slot]);
            return Ok(Some(slot));
        }
        let slot = self.live.get(&key).copied();
        if let Some(slot) = slot {
            self.cache.set(slot, self.slots[slot].region());
        }
        Ok(slot)
    }

    /// Live block containing `position`, without creating one.
    pub fn get(&self, position: u32) -> Result<Option<&CoordinateBlock>, EvidenceError> {
        Ok(self.live_slot(position)?.map(|slot| &self.slots[slot]))
    }

    /// Live block containing `position`, or the retired one still holding its evidence.
    pub fn get_historical(&self, position: u32) -> Result<Option<&CoordinateBlock>, EvidenceError> {
        if let Some(block) = self.get(position)? {
            return Ok(Some(block));
        }
        let key = self.key_of(position)?;
        Ok(self.retired_block(key))
    }

    /// Live block containing `position`, created on first touch.
    pub fn get_or_create(&mut self, position: u32) -> Result<&mut CoordinateBlock, EvidenceError> {
        let slot = match self.live_slot(position)? {
            Some(slot) => slot,
            None => {
                let key = self.key_of(position)?;
                let slot = self.activate(key);
                self.cache.set(slot, self.slots[slot].region());
                slot
            }
        };
        Ok(&mut self.slots[slot])
    }

    fn activate(&mut self, key: BlockKey) -> SlotId {
        let region = block_region(key, self.block_size);
        self.retired.remove(&key);

        let slot = match self.free.pop() {
            Some(slot) => {
                let previous = self.slot_keys[slot];
                if self.retired.get(&previous) == Some(&slot) {
                    self.retired.remove(&previous);
                }
                self.slots[slot].reset(region);
                self.space.recycle_block();
                trace!(slot, key, previous, "recycled block");
                slot
            }
            None => {
                self.slots
                    .push(CoordinateBlock::new(region, self.track_read_summaries));
                self.slot_keys.push(key);
                self.live_mask.push(false);
                self.space.allocate_block();
                trace!(slot = self.slots.len() - 1, key, "allocated block");
                self.slots.len() - 1
            }
        };

        self.slot_keys[slot] = key;
        self.live_mask.set(slot, true);
        self.live.insert(key, slot);
        slot
    }

    /// Move the live block `key` to the free list. Returns false if it was not live.
    pub fn retire(&mut self, key: BlockKey) -> bool {
        let Some(slot) = self.live.remove(&key) else {
            return false;
        };
        self.live_mask.set(slot, false);
        self.cache.invalidate(slot);
        self.free.push(slot);
        self.retired.insert(key, slot);
        self.space.retire_block();
        trace!(slot, key, "retired block");
        true
    }

    /// Live block indices in ascending order.
    pub fn live_keys(&self) -> Vec<BlockKey> {
        let mut keys: Vec<BlockKey> = self.live.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Whether `key` has a live block.
    pub fn is_live(&self, key: BlockKey) -> bool {
        self.live.contains_key(&key)
    }

    /// Live block `key`.
    pub fn block(&self, key: BlockKey) -> Option<&CoordinateBlock> {
        self.live.get(&key).map(|&slot| &self.slots[slot])
    }

    /// Live block `key`, mutably.
    pub fn block_mut(&mut self, key: BlockKey) -> Option<&mut CoordinateBlock> {
        let slot = *self.live.get(&key)?;
        Some(&mut self.slots[slot])
    }

    /// Live block `key`, or the retired block that last held it.
    pub fn historical_block(&self, key: BlockKey) -> Option<&CoordinateBlock> {
        self.block(key).or_else(|| self.retired_block(key))
    }

    fn retired_block(&self, key: BlockKey) -> Option<&CoordinateBlock> {
        self.retired.get(&key).map(|&slot| &self.slots[slot])
    }

    /// Number of live blocks.
    pub fn live_count(&self) -> usize {
        self.live_mask.count_ones()
    }

    /// Number of slots on the free list.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Slot accounting.
    pub fn space(&self) -> &SpaceTracker {
        &self.space
    }

    /// Record a release for the space profile.
    pub fn snapshot(&mut self, cleared_up_to: u32) {
        self.space.snapshot(cleared_up_to);
    }

    /// Take the recorded space profile, if profiling was enabled.
    pub fn take_profile(&mut self) -> Option<SpaceProfile> {
        self.space.take_profile()
    }
}
