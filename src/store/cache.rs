use std::cell::Cell;

use crate::genomics::Region;

/// Arena index of a block slot.
pub type SlotId = usize;

/// Single-slot "last accessed block" cache.
///
/// Serves the common case of monotonically increasing access in O(1). It
/// must be invalidated whenever the slot it points at is retired.
#[derive(Debug, Default)]
pub struct LastBlockCache {
    entry: Cell<Option<(SlotId, Region)>>,
}

impl LastBlockCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot whose block contains `position`, if the cached one does.
    pub fn get(&self, position: u32) -> Option<SlotId> {
        match self.entry.get() {
            Some((slot, region)) if region.contains(position) => Some(slot),
            _ => None,
        }
    }

    /// Remember `slot` as covering `region`.
    pub fn set(&self, slot: SlotId, region: Region) {
        self.entry.set(Some((slot, region)));
    }

    /// Forget the cached slot if it is `slot`.
    pub fn invalidate(&self, slot: SlotId) {
        if matches!(self.entry.get(), Some((cached, _)) if cached == slot) {
            self.entry.set(None);
        }
    }

    /// Cached slot, regardless of position.
    pub fn slot(&self) -> Option<SlotId> {
        self.entry.get().map(|(slot, _)| slot)
    }
}
