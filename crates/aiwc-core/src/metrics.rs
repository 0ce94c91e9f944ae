//! Metric computation at kernel end.
//!
//! Derives the full architecture-independent metric battery from the
//! kernel-global aggregates. Every derivation guards the empty-trace case:
//! entropy-like metrics report 0 when no accesses were observed, and
//! min/max/median/mean over empty lists report 0 rather than failing.

use std::collections::HashMap;

use serde::Serialize;

use crate::aggregate::KernelAggregates;
use crate::branch::{BranchEntropies, BRANCH_HISTORY_LENGTH};
use crate::entropy::{entropy_bits, SpatialProfile, PROFILE_LEVELS};
use crate::events::KernelInvocation;
use crate::types::{Opcode, Size3};

/// Number of coarsening shifts reported by the local memory-address
/// entropy metric (shifts 1..=10).
pub const LMAE_LEVELS: usize = PROFILE_LEVELS - 1;

/// The computed metric set for one kernel invocation.
#[derive(Debug, Clone, Serialize)]
pub struct KernelMetrics {
    /// Kernel name.
    pub kernel_name: String,
    /// Whether the host specified the work-group size.
    pub work_group_size_specified: bool,
    /// Opcode histogram, count descending (opcode ascending on ties).
    pub opcode_counts: Vec<(Opcode, u64)>,
    /// Mean instructions between memory operations.
    pub freedom_to_reorder: f64,
    /// Mean load/store operand references per work-item.
    pub resource_pressure: f64,
    /// Total work-items invoked.
    pub work_items: u64,
    /// Work-group count per dimension.
    pub work_groups: Size3,
    /// Work-items per work-group per dimension.
    pub work_items_per_work_group: Size3,
    /// Sum of result-vector widths over all instructions.
    pub simd_operand_sum: u64,
    /// Total barriers hit across all work-items.
    pub total_barriers_hit: u64,
    /// Minimum instructions between barriers.
    pub min_itb: u32,
    /// Maximum instructions between barriers.
    pub max_itb: u32,
    /// Median instructions between barriers.
    pub median_itb: f64,
    /// Minimum instructions per work-item.
    pub min_ipt: u32,
    /// Maximum instructions per work-item.
    pub max_ipt: u32,
    /// Median instructions per work-item.
    pub median_ipt: f64,
    /// Smallest observed result-vector width.
    pub min_simd_width: u16,
    /// Largest observed result-vector width.
    pub max_simd_width: u16,
    /// Mean result-vector width.
    pub mean_simd_width: f64,
    /// Standard deviation of result-vector widths.
    pub sd_simd_width: f64,
    /// Total counted memory accesses (loads + stores).
    pub num_memory_accesses: u64,
    /// Distinct addresses touched.
    pub total_memory_footprint: u64,
    /// Distinct addresses in the store histogram (emitted under this name
    /// for output compatibility).
    pub unique_reads: u64,
    /// Distinct addresses in the load histogram (emitted under this name
    /// for output compatibility).
    pub unique_writes: u64,
    /// Distinct-load to distinct-store address ratio.
    pub unique_read_write_ratio: f64,
    /// Total loads.
    pub total_reads: u64,
    /// Total stores.
    pub total_writes: u64,
    /// Loads per distinct loaded address.
    pub rereads: f64,
    /// Stores per distinct stored address.
    pub rewrites: f64,
    /// Distinct addresses covering 90% of all accesses.
    pub memory_footprint_90pc: u64,
    /// Shannon entropy of the access distribution over raw addresses.
    pub global_memory_address_entropy: f64,
    /// Entropy after discarding 1..=10 low address bits.
    pub local_memory_address_entropy: [f64; LMAE_LEVELS],
    /// Parallel spatial locality profile, normalised to [0, 1].
    pub normed_psl: SpatialProfile,
    /// Accesses tagged global.
    pub total_global_memory_accessed: u64,
    /// Accesses tagged local.
    pub total_local_memory_accessed: u64,
    /// Accesses tagged constant.
    pub total_constant_memory_accessed: u64,
    /// Branch sites and execution counts, count descending then identity
    /// ascending.
    pub branch_counts: Vec<(u64, u64)>,
    /// Branch history window length.
    pub branch_history_size: usize,
    /// Per-workload Yokota branch entropy (the emitted variant).
    pub yokota_branch_entropy: f64,
    /// Occurrence-weighted Yokota branch entropy (computed, not emitted).
    pub yokota_branch_entropy_weighted: f64,
    /// Occurrence-weighted linear branch entropy.
    pub average_linear_branch_entropy: f64,
}

/// Min, max and median of a count list; zeros when empty.
fn list_stats(values: &[u32]) -> (u32, u32, f64) {
    if values.is_empty() {
        return (0, 0, 0.0);
    }
    let min = *values.iter().min().unwrap_or(&0);
    let max = *values.iter().max().unwrap_or(&0);

    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0
    } else {
        f64::from(sorted[mid])
    };
    (min, max, median)
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl KernelMetrics {
    /// Derive the metric set from kernel aggregates.
    pub fn from_aggregates(aggregates: &KernelAggregates, invocation: &KernelInvocation) -> Self {
        let mut opcode_counts: Vec<(Opcode, u64)> = aggregates
            .compute_ops
            .iter()
            .map(|(&opcode, &count)| (opcode, count))
            .collect();
        opcode_counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let between = &aggregates.instructions_between_memory_ops;
        let freedom_to_reorder = if between.is_empty() {
            0.0
        } else {
            between.iter().map(|&v| f64::from(v)).sum::<f64>() / between.len() as f64
        };

        let label_references: u64 = aggregates.load_labels.values().sum::<u64>()
            + aggregates.store_labels.values().sum::<u64>();
        let resource_pressure = if aggregates.threads_invoked == 0 {
            0.0
        } else {
            label_references as f64 / aggregates.threads_invoked as f64
        };

        let (min_itb, max_itb, median_itb) = list_stats(&aggregates.instructions_between_barriers);
        let (min_ipt, max_ipt, median_ipt) = list_stats(&aggregates.instructions_per_work_item);

        // Width order is fixed so repeated runs emit identical bytes.
        let mut simd_widths: Vec<(u16, u64)> = aggregates
            .simd_widths
            .iter()
            .map(|(&width, &count)| (width, count))
            .collect();
        simd_widths.sort_unstable_by_key(|&(width, _)| width);

        let min_simd_width = simd_widths.first().map(|&(width, _)| width).unwrap_or(0);
        let max_simd_width = simd_widths.last().map(|&(width, _)| width).unwrap_or(0);
        let simd_operand_sum: u64 = simd_widths
            .iter()
            .map(|&(width, count)| u64::from(width) * count)
            .sum();
        let simd_samples: u64 = simd_widths.iter().map(|&(_, count)| count).sum();
        let mean_simd_width = if simd_samples == 0 {
            0.0
        } else {
            simd_operand_sum as f64 / simd_samples as f64
        };
        let sd_simd_width = if simd_samples == 0 {
            0.0
        } else {
            let sq_sum: f64 = simd_widths
                .iter()
                .map(|&(width, count)| {
                    let delta = f64::from(width) - mean_simd_width;
                    delta * delta * count as f64
                })
                .sum();
            (sq_sum / simd_samples as f64).sqrt()
        };

        // Coarsened access histograms over the combined load+store domain.
        let mut combined: Vec<HashMap<u64, u64>> = vec![HashMap::new(); PROFILE_LEVELS];
        let mut total_writes: u64 = 0;
        let mut total_reads: u64 = 0;
        for (&address, &count) in &aggregates.store_ops {
            for (nskip, level) in combined.iter_mut().enumerate() {
                *level.entry(address >> nskip).or_insert(0) += count;
            }
            total_writes += count;
        }
        for (&address, &count) in &aggregates.load_ops {
            for (nskip, level) in combined.iter_mut().enumerate() {
                *level.entry(address >> nskip).or_insert(0) += count;
            }
            total_reads += count;
        }
        let num_memory_accesses = total_reads + total_writes;

        let mut sorted_counts: Vec<u64> = combined[0].values().copied().collect();
        sorted_counts.sort_unstable_by(|a, b| b.cmp(a));

        let significant = (num_memory_accesses as f64 * 0.9).ceil() as u64;
        let mut covered: u64 = 0;
        let mut memory_footprint_90pc: u64 = 0;
        for &count in &sorted_counts {
            if covered >= significant {
                break;
            }
            covered += count;
            memory_footprint_90pc += 1;
        }

        let global_memory_address_entropy =
            entropy_bits(sorted_counts.iter().copied(), num_memory_accesses);
        let mut local_memory_address_entropy = [0.0; LMAE_LEVELS];
        for nskip in 1..PROFILE_LEVELS {
            let mut counts: Vec<u64> = combined[nskip].values().copied().collect();
            counts.sort_unstable();
            local_memory_address_entropy[nskip - 1] =
                entropy_bits(counts, num_memory_accesses);
        }

        let items_per_group = invocation.local_size.volume();
        let psl_norm = ((items_per_group + 1) as f64).log2();
        let mut normed_psl = [0.0; PROFILE_LEVELS];
        if !aggregates.psl_per_group.is_empty() && psl_norm > 0.0 {
            let groups = aggregates.psl_per_group.len() as f64;
            for (level, value) in normed_psl.iter_mut().enumerate() {
                let column: f64 = aggregates
                    .psl_per_group
                    .iter()
                    .map(|profile| profile[level])
                    .sum();
                *value = (column / groups) / psl_norm;
            }
        }

        let mut branch_counts: Vec<(u64, u64)> = aggregates
            .branch_counts
            .iter()
            .map(|(site, &count)| (site.identity(), count))
            .collect();
        branch_counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let entropies = BranchEntropies::from_patterns(&aggregates.branch_patterns);

        Self {
            kernel_name: invocation.name.clone(),
            work_group_size_specified: invocation.work_group_size_specified,
            opcode_counts,
            freedom_to_reorder,
            resource_pressure,
            work_items: aggregates.threads_invoked,
            work_groups: invocation.num_groups,
            work_items_per_work_group: invocation.local_size,
            simd_operand_sum,
            total_barriers_hit: aggregates.barriers_hit,
            min_itb,
            max_itb,
            median_itb,
            min_ipt,
            max_ipt,
            median_ipt,
            min_simd_width,
            max_simd_width,
            mean_simd_width,
            sd_simd_width,
            num_memory_accesses,
            total_memory_footprint: combined[0].len() as u64,
            unique_reads: aggregates.store_ops.len() as u64,
            unique_writes: aggregates.load_ops.len() as u64,
            unique_read_write_ratio: ratio(
                aggregates.load_ops.len() as u64,
                aggregates.store_ops.len() as u64,
            ),
            total_reads,
            total_writes,
            rereads: ratio(total_reads, aggregates.load_ops.len() as u64),
            rewrites: ratio(total_writes, aggregates.store_ops.len() as u64),
            memory_footprint_90pc,
            global_memory_address_entropy,
            local_memory_address_entropy,
            normed_psl,
            total_global_memory_accessed: aggregates.global_accesses,
            total_local_memory_accessed: aggregates.local_accesses,
            total_constant_memory_accessed: aggregates.constant_accesses,
            branch_counts,
            branch_history_size: BRANCH_HISTORY_LENGTH,
            yokota_branch_entropy: entropies.yokota_per_workload,
            yokota_branch_entropy_weighted: entropies.yokota_weighted,
            average_linear_branch_entropy: entropies.linear_average,
        }
    }
}
