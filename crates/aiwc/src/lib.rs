//! # AIWC
//!
//! Architecture-Independent Workload Characterisation for data-parallel
//! kernel simulators.
//!
//! This crate re-exports the [`aiwc-core`](aiwc_core) engine. A simulator
//! host forwards its trace callbacks — kernel and work-group lifecycle,
//! executed IR instructions, memory accesses, barriers, host↔device
//! copies — and receives one hardware-neutral metric CSV per kernel
//! invocation plus a transfer-count CSV at teardown.
//!
//! ## Quick Start
//!
//! ```ignore
//! use aiwc::prelude::*;
//!
//! let engine = Characteriser::builder().output_dir("results").build();
//!
//! // One worker per simulator thread.
//! let mut worker = engine.worker();
//!
//! engine.kernel_begin(&invocation);
//! worker.work_group_begin(&group);
//! // ... per-item trace events ...
//! worker.work_group_complete(&group);
//! engine.kernel_end(&invocation);
//!
//! engine.finish()?;
//! ```
//!
//! ## Output
//!
//! Per-kernel CSVs land at `AIWC_OUTPUT_PATH` if set, otherwise
//! `aiwc_<kernel>_<n>.csv` under `AIWC_OUTPUT_DIR` (default: the working
//! directory) with `n` chosen as the smallest unused counter.

#![warn(missing_docs)]

pub use aiwc_core::*;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use aiwc_core::prelude::*;
}
