//! Per-work-group memory-reference ledger.
//!
//! One slot per work-item (flattened local ID), each holding the ordered
//! sequence of non-private accesses since the last barrier. The parallel
//! spatial locality computation consumes the ledger at every work-group
//! barrier and at group completion, after which the slots are cleared.

use crate::error::{AiwcError, Result};
use crate::types::Size3;

/// One recorded memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Accessed address.
    pub address: u64,
    /// Timestep of the access. Currently always 0; ordering within a slot
    /// is carried by sequence position.
    pub timestep: u32,
}

/// Memory-reference ledger for one work-group.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    local_size: Size3,
    slots: Vec<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    /// Create an empty ledger; [`MemoryLedger::resize_for_group`] must run
    /// before recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the ledger for a work-group, one slot per work-item. Existing
    /// slot contents are discarded.
    pub fn resize_for_group(&mut self, local_size: Size3) {
        self.local_size = local_size;
        let slots = local_size.volume() as usize;
        self.slots.iter_mut().for_each(Vec::clear);
        self.slots.resize(slots, Vec::new());
    }

    /// Append an access to the slot of the given work-item.
    pub fn record(&mut self, local_id: Size3, address: u64) -> Result<()> {
        let index = self.local_size.linear_index(local_id);
        let slots = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(AiwcError::LocalIdOutOfRange {
                x: local_id.x,
                y: local_id.y,
                z: local_id.z,
                slots,
            })?;
        slot.push(LedgerEntry {
            address,
            timestep: 0,
        });
        Ok(())
    }

    /// Longest per-work-item sequence currently held.
    pub fn max_sequence_len(&self) -> u64 {
        self.slots.iter().map(Vec::len).max().unwrap_or(0) as u64
    }

    /// Clear every slot, keeping the group sizing.
    pub fn clear_slots(&mut self) {
        self.slots.iter_mut().for_each(Vec::clear);
    }

    /// Per-work-item access sequences.
    pub fn slots(&self) -> &[Vec<LedgerEntry>] {
        &self.slots
    }
}
