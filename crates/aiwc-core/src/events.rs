//! Trace event vocabulary and observer traits.
//!
//! The simulator host drives the engine through two observer traits, split
//! by thread role:
//!
//! - [`KernelObserver`] — host-thread events: kernel lifecycle and
//!   host↔device transfers. Shared references only; implementations must be
//!   internally synchronised.
//! - [`WorkerObserver`] — worker-thread events: work-group and work-item
//!   lifecycle, executed instructions, and device memory accesses. Takes
//!   `&mut self` so per-worker state needs no locking; the host creates one
//!   observer per worker thread and reuses it across work-groups.
//!
//! Within one work-item the host must deliver events in IR program order;
//! branch-taken inference depends on it.

use crate::types::{AddressSpace, BlockId, InstructionId, Opcode, Size3};

/// One kernel enqueue as seen by the simulator.
#[derive(Debug, Clone)]
pub struct KernelInvocation {
    /// Kernel function name.
    pub name: String,
    /// Number of work-groups per dimension.
    pub num_groups: Size3,
    /// Work-items per work-group per dimension.
    pub local_size: Size3,
    /// Whether the host specified the work-group size at enqueue time.
    pub work_group_size_specified: bool,
}

impl KernelInvocation {
    /// Create an invocation record.
    pub fn new(name: impl Into<String>, num_groups: Size3, local_size: Size3) -> Self {
        Self {
            name: name.into(),
            num_groups,
            local_size,
            work_group_size_specified: true,
        }
    }

    /// Mark the work-group size as chosen by the runtime rather than the
    /// host.
    pub fn with_unspecified_work_group_size(mut self) -> Self {
        self.work_group_size_specified = false;
        self
    }
}

/// A work-group instance.
#[derive(Debug, Clone, Copy)]
pub struct WorkGroup {
    /// Group coordinates within the dispatch.
    pub group_id: Size3,
    /// Work-items per dimension in this group.
    pub local_size: Size3,
}

impl WorkGroup {
    /// Create a work-group record.
    pub fn new(group_id: Size3, local_size: Size3) -> Self {
        Self {
            group_id,
            local_size,
        }
    }
}

/// A work-item instance, identified by its local coordinates.
#[derive(Debug, Clone, Copy)]
pub struct WorkItem {
    /// Local coordinates within the work-group.
    pub local_id: Size3,
}

impl WorkItem {
    /// Create a work-item record.
    pub fn new(local_id: Size3) -> Self {
        Self { local_id }
    }
}

/// The memory region an access touched.
#[derive(Debug, Clone, Copy)]
pub struct MemoryRegion {
    /// Address space of the region.
    pub address_space: AddressSpace,
}

impl MemoryRegion {
    /// Create a region record.
    pub fn new(address_space: AddressSpace) -> Self {
        Self { address_space }
    }
}

/// Atomic operation kinds carried by atomic memory callbacks.
///
/// The engine records atomic accesses like plain loads and stores and does
/// not distinguish the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicOp {
    /// Atomic add.
    Add,
    /// Atomic subtract.
    Sub,
    /// Atomic and.
    And,
    /// Atomic or.
    Or,
    /// Atomic xor.
    Xor,
    /// Atomic minimum.
    Min,
    /// Atomic maximum.
    Max,
    /// Atomic exchange.
    Exchange,
    /// Atomic compare-exchange.
    CompareExchange,
}

/// The typed result of an executed instruction.
#[derive(Debug, Clone, Copy)]
pub struct ResultValue {
    /// Number of lanes in the result vector (1 for scalars).
    pub lanes: u16,
}

impl ResultValue {
    /// A scalar result.
    pub fn scalar() -> Self {
        Self { lanes: 1 }
    }

    /// A vector result of the given width.
    pub fn vector(lanes: u16) -> Self {
        Self { lanes }
    }
}

/// One executed IR instruction as reported by the simulator.
///
/// `pointer_operand` and `address_space` are meaningful only for loads and
/// stores; `branch_targets` only for two-way conditional branches.
#[derive(Debug, Clone, Copy)]
pub struct InstructionRecord<'a> {
    /// Stable identity of the instruction.
    pub id: InstructionId,
    /// Instruction kind.
    pub opcode: Opcode,
    /// Basic block containing the instruction.
    pub block: BlockId,
    /// Name of the pointer operand for loads/stores. Unnamed operands
    /// report an empty string through `None`.
    pub pointer_operand: Option<&'a str>,
    /// Address space of the pointer operand for loads/stores.
    pub address_space: Option<AddressSpace>,
    /// Taken and fall-through targets of a two-way conditional branch.
    pub branch_targets: Option<(BlockId, BlockId)>,
    /// Source line, when debug info is present.
    pub source_line: Option<u32>,
}

impl<'a> InstructionRecord<'a> {
    /// Create an instruction record with no operand detail.
    pub fn new(id: InstructionId, opcode: Opcode, block: BlockId) -> Self {
        Self {
            id,
            opcode,
            block,
            pointer_operand: None,
            address_space: None,
            branch_targets: None,
            source_line: None,
        }
    }

    /// Attach the pointer operand of a load/store.
    pub fn with_pointer_operand(mut self, name: &'a str, space: AddressSpace) -> Self {
        self.pointer_operand = Some(name);
        self.address_space = Some(space);
        self
    }

    /// Attach the two targets of a conditional branch.
    pub fn with_branch_targets(mut self, taken: BlockId, not_taken: BlockId) -> Self {
        self.branch_targets = Some((taken, not_taken));
        self
    }

    /// Attach a source line from debug info.
    pub fn with_source_line(mut self, line: u32) -> Self {
        self.source_line = Some(line);
        self
    }
}

/// Host-thread trace events.
pub trait KernelObserver {
    /// A kernel invocation is about to execute.
    fn kernel_begin(&self, invocation: &KernelInvocation);

    /// A kernel invocation finished; all work-groups have completed.
    fn kernel_end(&self, invocation: &KernelInvocation);

    /// The host read device memory (device→host copy).
    fn host_memory_load(&self, memory: &MemoryRegion, address: u64, size: u64);

    /// The host wrote device memory (host→device copy).
    fn host_memory_store(&self, memory: &MemoryRegion, address: u64, size: u64);
}

/// Worker-thread trace events.
pub trait WorkerObserver {
    /// A work-group starts executing on this worker.
    fn work_group_begin(&mut self, group: &WorkGroup);

    /// All work-items of the group reached a barrier.
    fn work_group_barrier(&mut self, group: &WorkGroup, flags: u32);

    /// The work-group finished; merge into kernel-global state.
    fn work_group_complete(&mut self, group: &WorkGroup);

    /// A work-item starts executing.
    fn work_item_begin(&mut self, item: &WorkItem);

    /// A work-item reached a barrier.
    fn work_item_barrier(&mut self, item: &WorkItem);

    /// A work-item's barrier state was cleared without a synchronisation
    /// point.
    fn work_item_clear_barrier(&mut self, item: &WorkItem);

    /// A work-item ran to completion.
    fn work_item_complete(&mut self, item: &WorkItem);

    /// A work-item executed one IR instruction.
    fn instruction_executed(
        &mut self,
        item: &WorkItem,
        instruction: &InstructionRecord<'_>,
        result: &ResultValue,
    );

    /// A work-item loaded from memory.
    fn memory_load(&mut self, memory: &MemoryRegion, item: &WorkItem, address: u64, size: u64);

    /// A work-item stored to memory.
    fn memory_store(&mut self, memory: &MemoryRegion, item: &WorkItem, address: u64, size: u64);

    /// A work-item performed an atomic load.
    fn memory_atomic_load(
        &mut self,
        memory: &MemoryRegion,
        item: &WorkItem,
        op: AtomicOp,
        address: u64,
        size: u64,
    );

    /// A work-item performed an atomic store.
    fn memory_atomic_store(
        &mut self,
        memory: &MemoryRegion,
        item: &WorkItem,
        op: AtomicOp,
        address: u64,
        size: u64,
    );
}
