//! Kernel-global aggregates and the cross-work-group merge.
//!
//! All fields are guarded by the engine-wide mutex; workers fold their
//! scratch in at `work_group_complete` and the metric computation consumes
//! the result at `kernel_end`. Every merge step is a semigroup fold, so
//! work-group completion order does not affect the totals.

use std::collections::HashMap;

use crate::branch::{fold_history_patterns, BranchSite};
use crate::entropy::{parallel_spatial_locality, SpatialProfile, PROFILE_LEVELS};
use crate::scratch::WorkerScratch;
use crate::types::Opcode;

/// Aggregated per-kernel observations across all work-groups.
#[derive(Debug, Default)]
pub struct KernelAggregates {
    pub(crate) compute_ops: HashMap<Opcode, u64>,
    pub(crate) load_ops: HashMap<u64, u64>,
    pub(crate) store_ops: HashMap<u64, u64>,
    pub(crate) load_labels: HashMap<String, u64>,
    pub(crate) store_labels: HashMap<String, u64>,
    pub(crate) simd_widths: HashMap<u16, u64>,
    pub(crate) branch_counts: HashMap<BranchSite, u64>,
    pub(crate) branch_patterns: HashMap<BranchSite, HashMap<u16, u32>>,
    pub(crate) instructions_between_barriers: Vec<u32>,
    pub(crate) instructions_per_work_item: Vec<u32>,
    pub(crate) instructions_between_memory_ops: Vec<u32>,
    pub(crate) threads_invoked: u64,
    pub(crate) barriers_hit: u64,
    pub(crate) global_accesses: u64,
    pub(crate) local_accesses: u64,
    pub(crate) constant_accesses: u64,
    pub(crate) psl_per_group: Vec<SpatialProfile>,
}

impl KernelAggregates {
    /// Create empty aggregates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the empty state for the next kernel.
    pub fn clear(&mut self) {
        self.compute_ops.clear();
        self.load_ops.clear();
        self.store_ops.clear();
        self.load_labels.clear();
        self.store_labels.clear();
        self.simd_widths.clear();
        self.branch_counts.clear();
        self.branch_patterns.clear();
        self.instructions_between_barriers.clear();
        self.instructions_per_work_item.clear();
        self.instructions_between_memory_ops.clear();
        self.threads_invoked = 0;
        self.barriers_hit = 0;
        self.global_accesses = 0;
        self.local_accesses = 0;
        self.constant_accesses = 0;
        self.psl_per_group.clear();
    }

    /// Fold a completed work-group's scratch into the kernel totals.
    ///
    /// Also snapshots spatial locality over the residual ledger (accesses
    /// after the last barrier) and folds the group's per-barrier profiles
    /// into one weight-averaged profile.
    pub fn merge_group(&mut self, scratch: &mut WorkerScratch) {
        for (&opcode, &count) in &scratch.compute_ops {
            *self.compute_ops.entry(opcode).or_insert(0) += count;
        }
        for (&address, &count) in &scratch.load_ops {
            *self.load_ops.entry(address).or_insert(0) += u64::from(count);
        }
        for (&address, &count) in &scratch.store_ops {
            *self.store_ops.entry(address).or_insert(0) += u64::from(count);
        }
        for (label, &count) in &scratch.load_labels {
            *self.load_labels.entry(label.clone()).or_insert(0) += count;
        }
        for (label, &count) in &scratch.store_labels {
            *self.store_labels.entry(label.clone()).or_insert(0) += count;
        }
        for (&width, &count) in &scratch.simd_widths {
            *self.simd_widths.entry(width).or_insert(0) += count;
        }

        for (site, history) in &scratch.branch_histories {
            *self.branch_counts.entry(*site).or_insert(0) += history.len() as u64;
            fold_history_patterns(history, self.branch_patterns.entry(*site).or_default());
        }

        self.instructions_between_barriers
            .extend_from_slice(&scratch.instructions_between_barriers);
        self.instructions_per_work_item
            .extend_from_slice(&scratch.instructions_per_work_item);
        self.instructions_between_memory_ops
            .extend_from_slice(&scratch.instructions_between_memory_ops);

        self.threads_invoked += scratch.threads_invoked;
        self.barriers_hit += scratch.barriers_hit;
        self.global_accesses += scratch.global_accesses;
        self.local_accesses += scratch.local_accesses;
        self.constant_accesses += scratch.constant_accesses;

        // Residual ledger interval: accesses after the last barrier.
        let psl = parallel_spatial_locality(&scratch.ledger);
        let max_len = scratch.ledger.max_sequence_len();
        scratch.ledger.clear_slots();
        scratch.psl_per_barrier.push((psl, max_len));

        let mut weighted = [0.0; PROFILE_LEVELS];
        let mut weight_sum: u64 = 0;
        for (profile, weight) in &scratch.psl_per_barrier {
            weight_sum += weight;
            for (acc, value) in weighted.iter_mut().zip(profile.iter()) {
                *acc += value * *weight as f64;
            }
        }
        if weight_sum != 0 {
            for value in &mut weighted {
                *value /= (weight_sum + 1) as f64;
            }
        }
        self.psl_per_group.push(weighted);
    }
}
