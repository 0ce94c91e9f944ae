//! # AIWC Core
//!
//! Architecture-independent workload characterisation for data-parallel
//! kernel simulators.
//!
//! The engine is a trace sink: the simulator host reports every executed
//! IR instruction, memory access, barrier, and lifecycle event, and the
//! engine aggregates them into a hardware-neutral metric battery (compute
//! mix, parallelism, SIMD widths, memory entropy and spatial locality,
//! branch predictability, footprint statistics). Each kernel invocation
//! produces one `metric,category,count` CSV; host↔device transfer counts
//! are written to a separate CSV at engine teardown.
//!
//! ## Core Abstractions
//!
//! - [`Characteriser`] - the engine; handles host-thread events
//! - [`Worker`] - per-thread observer owning its scratch state
//! - [`KernelObserver`] / [`WorkerObserver`] - the event surface
//! - [`KernelMetrics`] - the computed metric set for one invocation
//!
//! ## Example
//!
//! ```ignore
//! use aiwc_core::prelude::*;
//!
//! let engine = Characteriser::builder().output_dir("results").build();
//! let mut worker = engine.worker();
//!
//! engine.kernel_begin(&invocation);
//! worker.work_group_begin(&group);
//! worker.work_item_begin(&item);
//! worker.instruction_executed(&item, &instruction, &result);
//! // ... remaining trace events ...
//! engine.kernel_end(&invocation);
//! ```
//!
//! ## Threading
//!
//! Worker observers are wait-free on the hot path; the only shared lock
//! is taken when a work-group completes and its scratch folds into the
//! kernel-global aggregates. Within one work-item, events must arrive in
//! IR program order.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod branch;
pub mod emit;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod events;
pub mod ledger;
pub mod metrics;
pub mod scratch;
pub mod transfers;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::branch::{BranchEntropies, BranchSite, BRANCH_HISTORY_LENGTH};
    pub use crate::emit::{OutputConfig, OUTPUT_DIR_ENV, OUTPUT_PATH_ENV};
    pub use crate::engine::{Characteriser, CharacteriserBuilder, Worker};
    pub use crate::entropy::{SpatialProfile, PROFILE_LEVELS};
    pub use crate::error::{AiwcError, Result};
    pub use crate::events::{
        AtomicOp, InstructionRecord, KernelInvocation, KernelObserver, MemoryRegion, ResultValue,
        WorkGroup, WorkItem, WorkerObserver,
    };
    pub use crate::metrics::{KernelMetrics, LMAE_LEVELS};
    pub use crate::types::{
        AccessDirection, AddressSpace, BlockId, InstructionId, Opcode, Size3,
    };
}

pub use engine::{Characteriser, CharacteriserBuilder, Worker};
pub use error::{AiwcError, Result};
pub use events::{KernelInvocation, KernelObserver, WorkerObserver};
pub use metrics::KernelMetrics;
pub use types::{AddressSpace, Opcode, Size3};
