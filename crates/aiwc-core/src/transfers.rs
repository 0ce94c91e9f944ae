//! Host↔device transfer attribution.
//!
//! Copies are observed outside any kernel invocation, so host→device
//! copies are attributed retroactively: the tracker counts copies seen
//! since the last `kernel_begin` and relabels them once the next kernel's
//! name is known. Device→host copies follow the most recently named
//! kernel. The log accumulates across all kernels and is written once at
//! engine teardown.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{AiwcError, Result};

/// Accumulated host↔device copy log.
#[derive(Debug, Default)]
pub struct TransferTracker {
    host_to_device: Vec<String>,
    device_to_host: Vec<String>,
    pending_host_to_device: usize,
    last_kernel_name: String,
}

impl TransferTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// The host wrote device memory.
    pub fn record_host_to_device(&mut self) {
        self.host_to_device.push(self.last_kernel_name.clone());
        self.pending_host_to_device += 1;
    }

    /// The host read device memory.
    pub fn record_device_to_host(&mut self) {
        self.device_to_host.push(self.last_kernel_name.clone());
    }

    /// A kernel was enqueued: relabel the host→device copies seen since
    /// the previous kernel with its name.
    pub fn kernel_named(&mut self, name: &str) {
        self.last_kernel_name = name.to_owned();
        let len = self.host_to_device.len();
        for entry in &mut self.host_to_device[len - self.pending_host_to_device..] {
            entry.clear();
            entry.push_str(name);
        }
        self.pending_host_to_device = 0;
    }

    /// Whether any copy was observed.
    pub fn is_empty(&self) -> bool {
        self.host_to_device.is_empty() && self.device_to_host.is_empty()
    }

    /// Write the transfer log as `metric,kernel,count` rows, grouped by
    /// kernel in first-appearance order.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let output_error = |source: std::io::Error| AiwcError::Output {
            path: path.display().to_string(),
            source,
        };

        let file = File::create(path).map_err(output_error)?;
        let mut out = BufWriter::new(file);
        self.write_rows(&mut out).map_err(output_error)?;
        out.flush().map_err(output_error)
    }

    fn write_rows<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "metric,kernel,count")?;
        for (kernel, count) in grouped(&self.host_to_device) {
            writeln!(out, "transfer: host to device,{},{}", kernel, count)?;
        }
        for (kernel, count) in grouped(&self.device_to_host) {
            writeln!(out, "transfer: device to host,{},{}", kernel, count)?;
        }
        Ok(())
    }
}

/// Counts per kernel, ordered by each kernel's first appearance.
fn grouped(log: &[String]) -> Vec<(&str, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in log {
        let count = counts.entry(name.as_str()).or_insert(0);
        if *count == 0 {
            order.push(name);
        }
        *count += 1;
    }
    order.into_iter().map(|name| (name, counts[name])).collect()
}
