//! Branch history folding and branch-predictability entropies.
//!
//! Each two-way conditional branch accumulates an ordered taken/not-taken
//! history per work-group. At merge time the history is folded into a
//! histogram of 16-bit patterns (bit 0 holds the most recent outcome);
//! histories shorter than the window contribute nothing. The pattern
//! histograms feed two scalar predictability measures at kernel end.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::InstructionId;

/// Length of the branch history window, in outcomes.
pub const BRANCH_HISTORY_LENGTH: usize = 16;

/// Identity of one conditional branch site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BranchSite {
    /// Stable instruction identity.
    pub instruction: InstructionId,
    /// Source line from debug info, when present.
    pub source_line: Option<u32>,
}

impl BranchSite {
    /// Create a branch site.
    pub fn new(instruction: InstructionId, source_line: Option<u32>) -> Self {
        Self {
            instruction,
            source_line,
        }
    }

    /// Reported identity: the source line when debug info exists, otherwise
    /// the stable instruction number.
    pub fn identity(&self) -> u64 {
        self.source_line
            .map(u64::from)
            .unwrap_or(self.instruction.0)
    }
}

/// Fold a taken/not-taken history into the 16-bit pattern histogram.
///
/// The window slides one outcome at a time; a history of length `n >= 16`
/// produces exactly `n - 15` increments, shorter histories none.
pub fn fold_history_patterns(history: &[bool], patterns: &mut HashMap<u16, u32>) {
    if history.len() < BRANCH_HISTORY_LENGTH {
        return;
    }
    let mut pattern: u16 = 0;
    for (i, &taken) in history.iter().enumerate() {
        pattern = (pattern << 1) | u16::from(taken);
        if i >= BRANCH_HISTORY_LENGTH - 1 {
            *patterns.entry(pattern).or_insert(0) += 1;
        }
    }
}

/// Scalar branch-predictability measures over all pattern histograms.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BranchEntropies {
    /// Yokota entropy, each distinct pattern contributing once.
    pub yokota_per_workload: f64,
    /// Yokota entropy weighted by pattern occurrences. Computed for
    /// completeness; not part of the CSV output.
    pub yokota_weighted: f64,
    /// Occurrence-weighted linear branch entropy, `2 * min(p, 1 - p)`.
    pub linear_average: f64,
}

impl BranchEntropies {
    /// Compute the measures from per-branch pattern histograms.
    pub fn from_patterns(patterns: &HashMap<BranchSite, HashMap<u16, u32>>) -> Self {
        let mut yokota_per_workload = 0.0;
        let mut yokota_weighted = 0.0;
        let mut linear_sum = 0.0;
        let mut occurrences: u64 = 0;

        // Accumulation order is fixed so repeated runs emit identical bytes.
        let mut sites: Vec<(&BranchSite, &HashMap<u16, u32>)> = patterns.iter().collect();
        sites.sort_unstable_by_key(|(site, _)| (site.instruction, site.source_line));

        for (_, histogram) in sites {
            let mut entries: Vec<(u16, u32)> =
                histogram.iter().map(|(&pattern, &count)| (pattern, count)).collect();
            entries.sort_unstable();
            for (pattern, count) in entries {
                let taken = pattern.count_ones() as f64;
                let p_taken = taken / BRANCH_HISTORY_LENGTH as f64;

                if p_taken != 0.0 {
                    let term = p_taken * p_taken.log2();
                    yokota_weighted -= f64::from(count) * term;
                    yokota_per_workload -= term;
                }

                let linear = 2.0 * p_taken.min(1.0 - p_taken);
                linear_sum += f64::from(count) * linear;
                occurrences += u64::from(count);
            }
        }

        let linear_average = if occurrences == 0 {
            0.0
        } else {
            linear_sum / occurrences as f64
        };

        Self {
            yokota_per_workload,
            yokota_weighted,
            linear_average,
        }
    }
}
