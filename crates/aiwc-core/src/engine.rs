//! The characterisation engine.
//!
//! [`Characteriser`] is the host-facing half: it owns the kernel-global
//! aggregates behind a single mutex, the transfer log, and the output
//! configuration. [`Characteriser::worker`] mints one [`Worker`] per
//! simulator thread; workers own their scratch outright and only take the
//! engine lock when a work-group completes.
//!
//! Lifecycle: aggregates are cleared at `kernel_begin`, folded on every
//! `work_group_complete`, consumed and cleared again at `kernel_end`. The
//! transfer log survives across kernels and is written when the engine is
//! finished or dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::aggregate::KernelAggregates;
use crate::emit::{write_kernel_csv, OutputConfig};
use crate::error::Result;
use crate::events::{
    AtomicOp, InstructionRecord, KernelInvocation, KernelObserver, MemoryRegion, ResultValue,
    WorkGroup, WorkItem, WorkerObserver,
};
use crate::metrics::KernelMetrics;
use crate::scratch::WorkerScratch;
use crate::transfers::TransferTracker;
use crate::types::AccessDirection;

struct EngineShared {
    aggregates: Mutex<KernelAggregates>,
    transfers: Mutex<TransferTracker>,
    output: OutputConfig,
    transfers_emitted: AtomicBool,
}

impl EngineShared {
    fn emit_transfers(&self) -> Result<()> {
        if self.transfers_emitted.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let path = self.output.transfers_output_path();
        match self.transfers.lock().write_csv(&path) {
            Ok(()) => {
                info!(path = %path.display(), "memory transfer log written");
                Ok(())
            }
            Err(err) => {
                error!(%err, "failed to write memory transfer log");
                Err(err)
            }
        }
    }
}

impl Drop for EngineShared {
    fn drop(&mut self) {
        let _ = self.emit_transfers();
    }
}

/// Builder for a [`Characteriser`].
///
/// Starts from the process environment (`AIWC_OUTPUT_PATH`,
/// `AIWC_OUTPUT_DIR`) and lets hosts pin output locations explicitly.
#[derive(Debug, Default)]
pub struct CharacteriserBuilder {
    output: OutputConfig,
}

impl CharacteriserBuilder {
    /// Pin the exact per-kernel CSV path.
    pub fn output_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.output.path = Some(path.into());
        self
    }

    /// Choose the directory for per-kernel CSVs.
    pub fn output_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.output.dir = Some(dir.into());
        self
    }

    /// Choose the directory for the transfers CSV.
    pub fn transfers_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.output.transfers_dir = Some(dir.into());
        self
    }

    /// Build the engine.
    pub fn build(self) -> Characteriser {
        Characteriser {
            shared: Arc::new(EngineShared {
                aggregates: Mutex::new(KernelAggregates::new()),
                transfers: Mutex::new(TransferTracker::new()),
                output: self.output,
                transfers_emitted: AtomicBool::new(false),
            }),
        }
    }
}

/// The workload characterisation engine.
pub struct Characteriser {
    shared: Arc<EngineShared>,
}

impl Characteriser {
    /// Create an engine configured from the process environment.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder seeded from the process environment.
    pub fn builder() -> CharacteriserBuilder {
        CharacteriserBuilder {
            output: OutputConfig::from_env(),
        }
    }

    /// Mint the observer for one simulator worker thread.
    ///
    /// The worker owns its scratch; create exactly one per thread and
    /// reuse it across work-groups and kernels.
    pub fn worker(&self) -> Worker {
        Worker {
            shared: Arc::clone(&self.shared),
            scratch: WorkerScratch::new(),
        }
    }

    /// Write the transfer log now instead of at drop time.
    ///
    /// Subsequent calls (and the drop-time fallback) are no-ops.
    pub fn finish(&self) -> Result<()> {
        self.shared.emit_transfers()
    }
}

impl Default for Characteriser {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelObserver for Characteriser {
    fn kernel_begin(&self, invocation: &KernelInvocation) {
        info!(kernel = %invocation.name, "kernel invocation begins");
        self.shared.transfers.lock().kernel_named(&invocation.name);
        self.shared.aggregates.lock().clear();
    }

    fn kernel_end(&self, invocation: &KernelInvocation) {
        let metrics = {
            let mut aggregates = self.shared.aggregates.lock();
            let metrics = KernelMetrics::from_aggregates(&aggregates, invocation);
            aggregates.clear();
            metrics
        };

        let path = self.shared.output.kernel_output_path(&invocation.name);
        match write_kernel_csv(&metrics, &path) {
            Ok(()) => {
                info!(
                    kernel = %invocation.name,
                    path = %path.display(),
                    "workload characterisation written"
                );
            }
            // Non-fatal: later kernels still characterise.
            Err(err) => error!(kernel = %invocation.name, %err, "failed to write metrics"),
        }
    }

    fn host_memory_load(&self, _memory: &MemoryRegion, _address: u64, _size: u64) {
        self.shared.transfers.lock().record_device_to_host();
    }

    fn host_memory_store(&self, _memory: &MemoryRegion, _address: u64, _size: u64) {
        self.shared.transfers.lock().record_host_to_device();
    }
}

/// Per-thread observer feeding one [`WorkerScratch`].
pub struct Worker {
    shared: Arc<EngineShared>,
    scratch: WorkerScratch,
}

impl Worker {
    fn record_access(&mut self, direction: AccessDirection, item: &WorkItem, address: u64) {
        if let Err(err) = self
            .scratch
            .record_memory_access(direction, item.local_id, address)
        {
            error!(%err, "trace invariant violated");
            panic!("{}", err);
        }
    }
}

impl WorkerObserver for Worker {
    fn work_group_begin(&mut self, group: &WorkGroup) {
        self.scratch.begin_group(group.local_size);
    }

    fn work_group_barrier(&mut self, _group: &WorkGroup, _flags: u32) {
        self.scratch.group_barrier();
    }

    fn work_group_complete(&mut self, group: &WorkGroup) {
        debug!(group = %group.group_id, "merging completed work-group");
        self.shared.aggregates.lock().merge_group(&mut self.scratch);
    }

    fn work_item_begin(&mut self, _item: &WorkItem) {
        self.scratch.begin_item();
    }

    fn work_item_barrier(&mut self, _item: &WorkItem) {
        self.scratch.item_barrier();
    }

    fn work_item_clear_barrier(&mut self, _item: &WorkItem) {
        self.scratch.clear_barrier();
    }

    fn work_item_complete(&mut self, _item: &WorkItem) {
        self.scratch.item_complete();
    }

    fn instruction_executed(
        &mut self,
        _item: &WorkItem,
        instruction: &InstructionRecord<'_>,
        result: &ResultValue,
    ) {
        if let Err(err) = self.scratch.record_instruction(instruction, result) {
            // The trace is unreliable from here on; abort loudly.
            error!(%err, "trace invariant violated");
            panic!("{}", err);
        }
    }

    fn memory_load(&mut self, memory: &MemoryRegion, item: &WorkItem, address: u64, _size: u64) {
        if memory.address_space.is_counted() {
            self.record_access(AccessDirection::Load, item, address);
        }
    }

    fn memory_store(&mut self, memory: &MemoryRegion, item: &WorkItem, address: u64, _size: u64) {
        if memory.address_space.is_counted() {
            self.record_access(AccessDirection::Store, item, address);
        }
    }

    fn memory_atomic_load(
        &mut self,
        memory: &MemoryRegion,
        item: &WorkItem,
        _op: AtomicOp,
        address: u64,
        _size: u64,
    ) {
        if memory.address_space.is_counted() {
            self.record_access(AccessDirection::Load, item, address);
        }
    }

    fn memory_atomic_store(
        &mut self,
        memory: &MemoryRegion,
        item: &WorkItem,
        _op: AtomicOp,
        address: u64,
        _size: u64,
    ) {
        if memory.address_space.is_counted() {
            self.record_access(AccessDirection::Store, item, address);
        }
    }
}
