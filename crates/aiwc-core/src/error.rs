//! Collector error types.

use thiserror::Error;

use crate::types::BlockId;

/// Collector result type.
pub type Result<T> = std::result::Result<T, AiwcError>;

/// Errors raised by the characterisation engine.
#[derive(Debug, Error)]
pub enum AiwcError {
    /// The instruction following a two-way conditional branch landed in a
    /// basic block that is neither recorded target. The trace is unreliable
    /// from this point on; callers must treat this as fatal.
    #[error(
        "branch target mismatch: next instruction in block {observed}, \
         recorded targets were {taken} and {not_taken}"
    )]
    BranchTargetMismatch {
        /// Basic block of the instruction that followed the branch.
        observed: BlockId,
        /// Recorded taken-side target.
        taken: BlockId,
        /// Recorded fall-through target.
        not_taken: BlockId,
    },

    /// A memory access named a work-item outside the current work-group
    /// shape.
    #[error("work-item local id {x},{y},{z} outside work-group of {slots} slots")]
    LocalIdOutOfRange {
        /// Local x coordinate.
        x: u64,
        /// Local y coordinate.
        y: u64,
        /// Local z coordinate.
        z: u64,
        /// Number of ledger slots in the current group.
        slots: usize,
    },

    /// Output file could not be opened or written.
    #[error("output error for {path}: {source}")]
    Output {
        /// Path the emitter attempted to write.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error outside the emitter paths.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
