//! Output-path selection and per-kernel CSV emission.
//!
//! Per-kernel CSVs carry one `metric,category,count` row per metric;
//! list-valued metrics pack their payload into the third field with `;` as
//! list separator and `=` as key-value separator. Files open in append
//! mode and every emission writes its own header line, so a pinned output
//! path collects consecutive kernel invocations in order.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AiwcError, Result};
use crate::metrics::KernelMetrics;
use crate::types::Size3;

/// Environment variable pinning the exact per-kernel CSV path.
pub const OUTPUT_PATH_ENV: &str = "AIWC_OUTPUT_PATH";

/// Environment variable choosing the per-kernel CSV directory.
pub const OUTPUT_DIR_ENV: &str = "AIWC_OUTPUT_DIR";

const LIST_DELIM: char = ';';
const KEYVAL_SEP: char = '=';

/// Where the engine writes its CSVs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Exact per-kernel CSV path; takes precedence over `dir`.
    pub path: Option<PathBuf>,
    /// Directory receiving `aiwc_<kernel>_<n>.csv` files.
    pub dir: Option<PathBuf>,
    /// Directory receiving the transfers CSV. Not environment-driven; the
    /// default is the working directory.
    pub transfers_dir: Option<PathBuf>,
}

impl OutputConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os(OUTPUT_PATH_ENV).map(PathBuf::from),
            dir: std::env::var_os(OUTPUT_DIR_ENV).map(PathBuf::from),
            transfers_dir: None,
        }
    }

    /// Resolve the per-kernel CSV path for one invocation.
    pub fn kernel_output_path(&self, kernel_name: &str) -> PathBuf {
        if let Some(path) = &self.path {
            if self.dir.is_some() {
                warn!("both output path and directory configured, using path");
            }
            return path.clone();
        }
        let dir = self.dir.clone().unwrap_or_else(|| PathBuf::from("."));
        next_free_file(&dir, &format!("aiwc_{}_", kernel_name))
    }

    /// Resolve the transfers CSV path.
    pub fn transfers_output_path(&self) -> PathBuf {
        let dir = self
            .transfers_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        next_free_file(&dir, "aiwc_memory_transfers_")
    }
}

/// Smallest-n `<stem><n>.csv` that does not exist yet in `dir`.
fn next_free_file(dir: &Path, stem: &str) -> PathBuf {
    let mut n: u32 = 0;
    loop {
        let candidate = dir.join(format!("{}{}.csv", stem, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Append the metric set to the CSV at `path`, header included.
pub fn write_kernel_csv(metrics: &KernelMetrics, path: &Path) -> Result<()> {
    let output_error = |source: std::io::Error| AiwcError::Output {
        path: path.display().to_string(),
        source,
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(output_error)?;
    let mut out = BufWriter::new(file);
    write_kernel_rows(&mut out, metrics).map_err(output_error)?;
    out.flush().map_err(output_error)
}

fn size_list(size: Size3) -> String {
    format!(
        "{}{d}{}{d}{}{d}",
        size.x,
        size.y,
        size.z,
        d = LIST_DELIM
    )
}

fn write_kernel_rows<W: Write>(out: &mut W, m: &KernelMetrics) -> std::io::Result<()> {
    writeln!(out, "metric,category,count")?;
    writeln!(out, "kernel_name,Meta,{}", m.kernel_name)?;
    writeln!(
        out,
        "work_group_size_specified,Meta,{}",
        u8::from(m.work_group_size_specified)
    )?;

    write!(out, "opcode_counts,Compute,")?;
    for (opcode, count) in &m.opcode_counts {
        write!(out, "{}{}{}{}", opcode, KEYVAL_SEP, count, LIST_DELIM)?;
    }
    writeln!(out)?;

    writeln!(out, "freedom_to_reorder,Compute,{}", m.freedom_to_reorder)?;
    writeln!(out, "resource_pressure,Compute,{}", m.resource_pressure)?;
    writeln!(out, "work_items,Parallelism,{}", m.work_items)?;
    writeln!(out, "work_groups,Parallelism,{}", size_list(m.work_groups))?;
    writeln!(
        out,
        "work_items_per_work_group,Parallelism,{}",
        size_list(m.work_items_per_work_group)
    )?;
    writeln!(out, "SIMD_operand_sum,Parallelism,{}", m.simd_operand_sum)?;
    writeln!(out, "total_barriers_hit,Parallelism,{}", m.total_barriers_hit)?;
    writeln!(out, "min_ITB,Parallelism,{}", m.min_itb)?;
    writeln!(out, "max_ITB,Parallelism,{}", m.max_itb)?;
    writeln!(out, "median_ITB,Parallelism,{}", m.median_itb)?;
    writeln!(out, "min_IPT,Parallelism,{}", m.min_ipt)?;
    writeln!(out, "max_IPT,Parallelism,{}", m.max_ipt)?;
    writeln!(out, "median_IPT,Parallelism,{}", m.median_ipt)?;
    writeln!(out, "min_SIMD_width,Parallelism,{}", m.min_simd_width)?;
    writeln!(out, "max_SIMD_width,Parallelism,{}", m.max_simd_width)?;
    writeln!(out, "mean_SIMD_width,Parallelism,{}", m.mean_simd_width)?;
    writeln!(out, "sd_SIMD_width,Parallelism,{}", m.sd_simd_width)?;
    writeln!(out, "num_memory_accesses,Memory,{}", m.num_memory_accesses)?;
    writeln!(out, "total_memory_footprint,Memory,{}", m.total_memory_footprint)?;
    writeln!(out, "unique_reads,Memory,{}", m.unique_reads)?;
    writeln!(out, "unique_writes,Memory,{}", m.unique_writes)?;
    writeln!(
        out,
        "unique_read_write_ratio,Memory,{}",
        m.unique_read_write_ratio
    )?;
    writeln!(out, "total_reads,Memory,{}", m.total_reads)?;
    writeln!(out, "total_writes,Memory,{}", m.total_writes)?;
    writeln!(out, "rereads,Memory,{}", m.rereads)?;
    writeln!(out, "rewrites,Memory,{}", m.rewrites)?;
    writeln!(out, "memory_footprint_90pc,Memory,{}", m.memory_footprint_90pc)?;
    writeln!(
        out,
        "global_memory_address_entropy,Memory,{}",
        m.global_memory_address_entropy
    )?;

    write!(out, "LMAE,Memory,")?;
    for (index, value) in m.local_memory_address_entropy.iter().enumerate() {
        write!(out, "{}{}{}{}", index + 1, KEYVAL_SEP, value, LIST_DELIM)?;
    }
    writeln!(out)?;

    write!(out, "normed_PSL,Memory,")?;
    for (index, value) in m.normed_psl.iter().enumerate() {
        write!(out, "{}{}{}{}", index, KEYVAL_SEP, value, LIST_DELIM)?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "total_global_memory_accessed,Memory,{}",
        m.total_global_memory_accessed
    )?;
    writeln!(
        out,
        "total_local_memory_accessed,Memory,{}",
        m.total_local_memory_accessed
    )?;
    writeln!(
        out,
        "total_constant_memory_accessed,Memory,{}",
        m.total_constant_memory_accessed
    )?;

    write!(out, "branch_counts,Control,")?;
    for (identity, count) in &m.branch_counts {
        write!(out, "{}{}{}{}", identity, KEYVAL_SEP, count, LIST_DELIM)?;
    }
    writeln!(out)?;

    writeln!(out, "branch_history_size,Memory,{}", m.branch_history_size)?;
    writeln!(out, "yokota_branch_entropy,Memory,{}", m.yokota_branch_entropy)?;
    writeln!(
        out,
        "average_linear_branch_entropy,Memory,{}",
        m.average_linear_branch_entropy
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::KernelAggregates;
    use crate::events::KernelInvocation;
    use crate::types::Opcode;

    fn sample_metrics() -> KernelMetrics {
        let mut aggregates = KernelAggregates::new();
        aggregates.compute_ops.insert(Opcode::Add, 4);
        aggregates.compute_ops.insert(Opcode::Load, 2);
        aggregates.load_ops.insert(0x100, 2);
        aggregates.simd_widths.insert(1, 6);
        aggregates.threads_invoked = 2;
        let invocation =
            KernelInvocation::new("vec_add", Size3::new(4, 2, 1), Size3::new(8, 1, 1));
        KernelMetrics::from_aggregates(&aggregates, &invocation)
    }

    const EXPECTED_ROWS: [&str; 41] = [
        "metric",
        "kernel_name",
        "work_group_size_specified",
        "opcode_counts",
        "freedom_to_reorder",
        "resource_pressure",
        "work_items",
        "work_groups",
        "work_items_per_work_group",
        "SIMD_operand_sum",
        "total_barriers_hit",
        "min_ITB",
        "max_ITB",
        "median_ITB",
        "min_IPT",
        "max_IPT",
        "median_IPT",
        "min_SIMD_width",
        "max_SIMD_width",
        "mean_SIMD_width",
        "sd_SIMD_width",
        "num_memory_accesses",
        "total_memory_footprint",
        "unique_reads",
        "unique_writes",
        "unique_read_write_ratio",
        "total_reads",
        "total_writes",
        "rereads",
        "rewrites",
        "memory_footprint_90pc",
        "global_memory_address_entropy",
        "LMAE",
        "normed_PSL",
        "total_global_memory_accessed",
        "total_local_memory_accessed",
        "total_constant_memory_accessed",
        "branch_counts",
        "branch_history_size",
        "yokota_branch_entropy",
        "average_linear_branch_entropy",
    ];

    #[test]
    fn test_row_order_and_shape() {
        let mut buffer = Vec::new();
        write_kernel_rows(&mut buffer, &sample_metrics()).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let names: Vec<&str> = text
            .lines()
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(names, EXPECTED_ROWS);

        for line in text.lines() {
            assert_eq!(
                line.matches(',').count(),
                2,
                "row has stray commas: {}",
                line
            );
        }
    }

    #[test]
    fn test_list_rows_use_trailing_delimiters() {
        let mut buffer = Vec::new();
        write_kernel_rows(&mut buffer, &sample_metrics()).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let row = |name: &str| {
            text.lines()
                .find(|line| line.starts_with(name))
                .unwrap()
                .rsplit(',')
                .next()
                .unwrap()
                .to_string()
        };

        assert_eq!(row("opcode_counts"), "add=4;load=2;");
        assert_eq!(row("work_groups"), "4;2;1;");
        assert_eq!(row("work_items_per_work_group"), "8;1;1;");
        assert!(row("LMAE").starts_with("1="));
        assert!(row("LMAE").ends_with(';'));
        assert!(row("normed_PSL").starts_with("0="));
    }

    #[test]
    fn test_append_mode_keeps_previous_emission() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pinned.csv");
        let metrics = sample_metrics();

        write_kernel_csv(&metrics, &path).unwrap();
        write_kernel_csv(&metrics, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let headers = text
            .lines()
            .filter(|line| *line == "metric,category,count")
            .count();
        assert_eq!(headers, 2);
        assert_eq!(text.lines().count(), EXPECTED_ROWS.len() * 2);
    }

    #[test]
    fn test_kernel_path_counter_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            dir: Some(dir.path().to_path_buf()),
            ..OutputConfig::default()
        };

        let first = config.kernel_output_path("k");
        assert_eq!(first, dir.path().join("aiwc_k_0.csv"));
        std::fs::write(&first, "taken").unwrap();
        let second = config.kernel_output_path("k");
        assert_eq!(second, dir.path().join("aiwc_k_1.csv"));
    }

    #[test]
    fn test_pinned_path_wins_over_dir() {
        let config = OutputConfig {
            path: Some(PathBuf::from("/tmp/exact.csv")),
            dir: Some(PathBuf::from("/elsewhere")),
            transfers_dir: None,
        };
        assert_eq!(
            config.kernel_output_path("k"),
            PathBuf::from("/tmp/exact.csv")
        );
    }

    #[test]
    fn test_unopenable_path_is_reported() {
        let metrics = sample_metrics();
        let err = write_kernel_csv(&metrics, Path::new("/nonexistent-dir/out.csv")).unwrap_err();
        assert!(matches!(err, AiwcError::Output { .. }));
    }
}
