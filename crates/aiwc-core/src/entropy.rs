//! Shannon entropy over address histograms and parallel spatial locality.
//!
//! Spatial metrics are computed at 11 coarsening levels: level 0 uses raw
//! addresses, level k discards the k least-significant address bits. The
//! per-timestep entropies and their average over the timeline carry a +1
//! bias in the denominator, a Laplace-like smoothing kept for output
//! compatibility.

use std::collections::HashMap;

use crate::ledger::MemoryLedger;

/// Number of address-coarsening levels in a spatial profile (shifts 0..=10).
pub const PROFILE_LEVELS: usize = 11;

/// An 11-element entropy profile, one value per coarsening level.
pub type SpatialProfile = [f64; PROFILE_LEVELS];

/// Shannon entropy in bits of a count distribution, with probabilities
/// normalised by `total`. Returns 0 when `total` is 0.
pub fn entropy_bits<I>(counts: I, total: u64) -> f64
where
    I: IntoIterator<Item = u64>,
{
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .into_iter()
        .map(|count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Entropy profile of one timestep's address histogram, smoothed by
/// normalising with `total + 1`.
fn smoothed_entropy_profile(histogram: &HashMap<u64, u32>) -> SpatialProfile {
    let mut coarse: Vec<HashMap<u64, u32>> = vec![HashMap::new(); PROFILE_LEVELS - 1];
    let mut total: u64 = 0;

    for (&address, &count) in histogram {
        for (nskip, level) in coarse.iter_mut().enumerate() {
            *level.entry(address >> (nskip + 1)).or_insert(0) += count;
        }
        total += u64::from(count);
    }

    let mut profile = [0.0; PROFILE_LEVELS];
    if total == 0 {
        return profile;
    }

    let denom = (total + 1) as f64;
    // Accumulation order is fixed so identical traces emit identical bytes.
    let smoothed = |counts: &HashMap<u64, u32>| -> f64 {
        let mut counts: Vec<u32> = counts.values().copied().collect();
        counts.sort_unstable();
        counts
            .into_iter()
            .map(|count| {
                let p = f64::from(count) / denom;
                -p * p.log2()
            })
            .sum()
    };

    profile[0] = smoothed(histogram);
    for (nskip, level) in coarse.iter().enumerate() {
        profile[nskip + 1] = smoothed(level);
    }
    profile
}

/// Parallel spatial locality of a work-group's ledger.
///
/// For each timestep the addresses touched simultaneously across work-items
/// form a histogram; its smoothed entropy profile is averaged over the
/// timeline with denominator `T + 1`.
pub fn parallel_spatial_locality(ledger: &MemoryLedger) -> SpatialProfile {
    let timeline = ledger.max_sequence_len() as usize;

    let mut psl = [0.0; PROFILE_LEVELS];
    let mut histogram: HashMap<u64, u32> = HashMap::new();

    for t in 0..timeline {
        histogram.clear();
        for slot in ledger.slots() {
            if let Some(entry) = slot.get(t) {
                *histogram.entry(entry.address).or_insert(0) += 1;
            }
        }
        let profile = smoothed_entropy_profile(&histogram);
        for (acc, value) in psl.iter_mut().zip(profile.iter()) {
            *acc += value;
        }
    }

    let denom = (timeline + 1) as f64;
    for value in &mut psl {
        *value /= denom;
    }
    psl
}
