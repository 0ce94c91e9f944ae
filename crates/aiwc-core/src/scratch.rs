//! Per-worker scratch state.
//!
//! Every field is owned by exactly one worker and mutated without
//! synchronisation; the cross-work-group merge reads it under the engine
//! lock. The scratch is created once per worker and reused across
//! work-groups by clearing, so a freshly cleared scratch is
//! indistinguishable from a new one.

use std::collections::HashMap;

use crate::branch::BranchSite;
use crate::entropy::{parallel_spatial_locality, SpatialProfile};
use crate::error::{AiwcError, Result};
use crate::events::{InstructionRecord, ResultValue};
use crate::ledger::MemoryLedger;
use crate::types::{AccessDirection, AddressSpace, BlockId, Size3};

/// A conditional branch awaiting resolution by the next instruction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingBranch {
    pub(crate) site: BranchSite,
    pub(crate) taken: BlockId,
    pub(crate) not_taken: BlockId,
}

/// Thread-local counters and maps updated by every worker callback.
#[derive(Debug, Default)]
pub struct WorkerScratch {
    pub(crate) compute_ops: HashMap<crate::types::Opcode, u64>,
    pub(crate) load_ops: HashMap<u64, u32>,
    pub(crate) store_ops: HashMap<u64, u32>,
    pub(crate) load_labels: HashMap<String, u64>,
    pub(crate) store_labels: HashMap<String, u64>,
    pub(crate) branch_histories: HashMap<BranchSite, Vec<bool>>,
    pub(crate) pending_branch: Option<PendingBranch>,
    pub(crate) instructions_between_barriers: Vec<u32>,
    pub(crate) instructions_per_work_item: Vec<u32>,
    pub(crate) instructions_between_memory_ops: Vec<u32>,
    pub(crate) simd_widths: HashMap<u16, u64>,
    pub(crate) ledger: MemoryLedger,
    pub(crate) psl_per_barrier: Vec<(SpatialProfile, u64)>,
    pub(crate) threads_invoked: u64,
    pub(crate) barriers_hit: u64,
    pub(crate) instruction_count: u32,
    pub(crate) work_item_instruction_count: u32,
    pub(crate) ops_since_memory_op: u32,
    pub(crate) global_accesses: u64,
    pub(crate) local_accesses: u64,
    pub(crate) constant_accesses: u64,
}

impl WorkerScratch {
    /// Create empty scratch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all contents and size the ledger for a new work-group.
    pub fn begin_group(&mut self, local_size: Size3) {
        self.compute_ops.clear();
        self.load_ops.clear();
        self.store_ops.clear();
        self.load_labels.clear();
        self.store_labels.clear();
        self.branch_histories.clear();
        self.pending_branch = None;
        self.instructions_between_barriers.clear();
        self.instructions_per_work_item.clear();
        self.instructions_between_memory_ops.clear();
        self.simd_widths.clear();
        self.psl_per_barrier.clear();
        self.threads_invoked = 0;
        self.barriers_hit = 0;
        self.instruction_count = 0;
        self.work_item_instruction_count = 0;
        self.ops_since_memory_op = 0;
        self.global_accesses = 0;
        self.local_accesses = 0;
        self.constant_accesses = 0;
        self.ledger.resize_for_group(local_size);
    }

    /// Start a work-item: zero its counters and count the thread.
    pub fn begin_item(&mut self) {
        self.threads_invoked += 1;
        self.instruction_count = 0;
        self.work_item_instruction_count = 0;
        self.ops_since_memory_op = 0;
    }

    /// Account one executed instruction.
    ///
    /// Fails only when a recorded conditional branch is followed by an
    /// instruction in neither target block, which invalidates the trace.
    pub fn record_instruction(
        &mut self,
        instruction: &InstructionRecord<'_>,
        result: &ResultValue,
    ) -> Result<()> {
        *self.compute_ops.entry(instruction.opcode).or_insert(0) += 1;

        self.ops_since_memory_op += 1;
        self.instruction_count += 1;
        self.work_item_instruction_count += 1;

        if instruction.opcode.is_load() || instruction.opcode.is_store() {
            self.instructions_between_memory_ops
                .push(self.ops_since_memory_op);
            self.ops_since_memory_op = 0;

            let label = instruction.pointer_operand.unwrap_or("");
            let labels = if instruction.opcode.is_load() {
                &mut self.load_labels
            } else {
                &mut self.store_labels
            };
            if let Some(count) = labels.get_mut(label) {
                *count += 1;
            } else {
                labels.insert(label.to_owned(), 1);
            }

            match instruction.address_space {
                Some(AddressSpace::Local) => self.local_accesses += 1,
                Some(AddressSpace::Global) => self.global_accesses += 1,
                Some(AddressSpace::Constant) => self.constant_accesses += 1,
                // Private accesses are never counted.
                Some(AddressSpace::Private) | None => {}
            }
        }

        if let Some(pending) = self.pending_branch.take() {
            let taken = if instruction.block == pending.taken {
                true
            } else if instruction.block == pending.not_taken {
                false
            } else {
                return Err(AiwcError::BranchTargetMismatch {
                    observed: instruction.block,
                    taken: pending.taken,
                    not_taken: pending.not_taken,
                });
            };
            self.branch_histories
                .entry(pending.site)
                .or_default()
                .push(taken);
        }

        if instruction.opcode.is_branch() {
            if let Some((taken, not_taken)) = instruction.branch_targets {
                self.pending_branch = Some(PendingBranch {
                    site: BranchSite::new(instruction.id, instruction.source_line),
                    taken,
                    not_taken,
                });
            }
        }

        *self.simd_widths.entry(result.lanes).or_insert(0) += 1;
        Ok(())
    }

    /// Account one non-private memory access: address histogram + ledger.
    pub fn record_memory_access(
        &mut self,
        direction: AccessDirection,
        local_id: Size3,
        address: u64,
    ) -> Result<()> {
        let histogram = match direction {
            AccessDirection::Load => &mut self.load_ops,
            AccessDirection::Store => &mut self.store_ops,
        };
        *histogram.entry(address).or_insert(0) += 1;
        self.ledger.record(local_id, address)
    }

    /// A work-item reached a barrier.
    pub fn item_barrier(&mut self) {
        self.barriers_hit += 1;
        self.instructions_between_barriers
            .push(self.instruction_count);
        self.instruction_count = 0;
    }

    /// A work-item's barrier state was cleared without synchronising.
    pub fn clear_barrier(&mut self) {
        self.instruction_count = 0;
    }

    /// A work-item completed.
    pub fn item_complete(&mut self) {
        self.instructions_between_barriers
            .push(self.instruction_count);
        self.instructions_per_work_item
            .push(self.work_item_instruction_count);
    }

    /// All work-items reached a work-group barrier: snapshot spatial
    /// locality and start a fresh ledger interval.
    pub fn group_barrier(&mut self) {
        let psl = parallel_spatial_locality(&self.ledger);
        let max_len = self.ledger.max_sequence_len();
        self.psl_per_barrier.push((psl, max_len));
        self.ledger.clear_slots();
    }
}
