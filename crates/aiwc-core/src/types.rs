//! Shared vocabulary for trace events and metrics.
//!
//! These types model the simulator's view of a data-parallel kernel: 3-D
//! work sizes, IR opcodes, address spaces, and the opaque identities the
//! engine uses in place of raw instruction pointers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A three-dimensional size or index (work-group counts, local sizes,
/// work-item local IDs).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size3 {
    /// X extent / coordinate.
    pub x: u64,
    /// Y extent / coordinate.
    pub y: u64,
    /// Z extent / coordinate.
    pub z: u64,
}

impl Size3 {
    /// Create a new size.
    pub fn new(x: u64, y: u64, z: u64) -> Self {
        Self { x, y, z }
    }

    /// Total element count `x * y * z`.
    pub fn volume(&self) -> u64 {
        self.x * self.y * self.z
    }

    /// Flatten a local ID within this size to a linear slot index
    /// (`x * Ly * Lz + y * Lz + z`).
    pub fn linear_index(&self, id: Size3) -> usize {
        (id.x * self.y * self.z + id.y * self.z + id.z) as usize
    }
}

impl fmt::Display for Size3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Address-space tag of a memory operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressSpace {
    /// Per-work-item memory. Never counted toward memory metrics.
    Private,
    /// Device-wide memory.
    Global,
    /// Read-only constant memory.
    Constant,
    /// Per-work-group shared memory.
    Local,
}

impl AddressSpace {
    /// Whether accesses in this space contribute to memory metrics.
    pub fn is_counted(&self) -> bool {
        !matches!(self, AddressSpace::Private)
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSpace::Private => write!(f, "private"),
            AddressSpace::Global => write!(f, "global"),
            AddressSpace::Constant => write!(f, "constant"),
            AddressSpace::Local => write!(f, "local"),
        }
    }
}

/// Direction of a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessDirection {
    /// Read from memory.
    Load,
    /// Write to memory.
    Store,
}

/// Opaque, address-stable identity of an IR instruction.
///
/// Valid for the lifetime of the kernel program; equality is identity
/// equality. Stands in for raw instruction pointers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct InstructionId(pub u64);

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inst{}", self.0)
    }
}

/// Opaque identity of a basic block, used to resolve branch targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// IR instruction kinds observed in traces.
///
/// Mnemonics follow the usual LLVM spelling; `Other` carries opcodes the
/// engine has no dedicated handling for (they still count in the opcode
/// histogram).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Opcode {
    /// Return from function.
    Ret,
    /// Branch (conditional or unconditional).
    Br,
    /// Multi-way branch.
    Switch,
    /// Unreachable marker.
    Unreachable,
    /// Floating-point negation.
    FNeg,
    /// Integer addition.
    Add,
    /// Floating-point addition.
    FAdd,
    /// Integer subtraction.
    Sub,
    /// Floating-point subtraction.
    FSub,
    /// Integer multiplication.
    Mul,
    /// Floating-point multiplication.
    FMul,
    /// Unsigned division.
    UDiv,
    /// Signed division.
    SDiv,
    /// Floating-point division.
    FDiv,
    /// Unsigned remainder.
    URem,
    /// Signed remainder.
    SRem,
    /// Floating-point remainder.
    FRem,
    /// Shift left.
    Shl,
    /// Logical shift right.
    LShr,
    /// Arithmetic shift right.
    AShr,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise xor.
    Xor,
    /// Stack allocation.
    Alloca,
    /// Memory load.
    Load,
    /// Memory store.
    Store,
    /// Address computation.
    GetElementPtr,
    /// Memory fence.
    Fence,
    /// Atomic read-modify-write.
    AtomicRmw,
    /// Atomic compare-exchange.
    CmpXchg,
    /// Integer truncation.
    Trunc,
    /// Zero extension.
    ZExt,
    /// Sign extension.
    SExt,
    /// Floating-point truncation.
    FPTrunc,
    /// Floating-point extension.
    FPExt,
    /// Float to unsigned int.
    FPToUI,
    /// Float to signed int.
    FPToSI,
    /// Unsigned int to float.
    UIToFP,
    /// Signed int to float.
    SIToFP,
    /// Pointer to integer.
    PtrToInt,
    /// Integer to pointer.
    IntToPtr,
    /// Bit reinterpretation.
    BitCast,
    /// Address-space cast.
    AddrSpaceCast,
    /// Integer comparison.
    ICmp,
    /// Floating-point comparison.
    FCmp,
    /// SSA phi node.
    Phi,
    /// Function call.
    Call,
    /// Value select.
    Select,
    /// Vector element extraction.
    ExtractElement,
    /// Vector element insertion.
    InsertElement,
    /// Vector shuffle.
    ShuffleVector,
    /// Aggregate value extraction.
    ExtractValue,
    /// Aggregate value insertion.
    InsertValue,
    /// Any opcode without a dedicated variant, keyed by its raw number.
    Other(u16),
}

impl Opcode {
    /// Whether this is a memory load.
    pub fn is_load(&self) -> bool {
        matches!(self, Opcode::Load)
    }

    /// Whether this is a memory store.
    pub fn is_store(&self) -> bool {
        matches!(self, Opcode::Store)
    }

    /// Whether this is a branch instruction.
    pub fn is_branch(&self) -> bool {
        matches!(self, Opcode::Br)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Ret => "ret",
            Opcode::Br => "br",
            Opcode::Switch => "switch",
            Opcode::Unreachable => "unreachable",
            Opcode::FNeg => "fneg",
            Opcode::Add => "add",
            Opcode::FAdd => "fadd",
            Opcode::Sub => "sub",
            Opcode::FSub => "fsub",
            Opcode::Mul => "mul",
            Opcode::FMul => "fmul",
            Opcode::UDiv => "udiv",
            Opcode::SDiv => "sdiv",
            Opcode::FDiv => "fdiv",
            Opcode::URem => "urem",
            Opcode::SRem => "srem",
            Opcode::FRem => "frem",
            Opcode::Shl => "shl",
            Opcode::LShr => "lshr",
            Opcode::AShr => "ashr",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Alloca => "alloca",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::GetElementPtr => "getelementptr",
            Opcode::Fence => "fence",
            Opcode::AtomicRmw => "atomicrmw",
            Opcode::CmpXchg => "cmpxchg",
            Opcode::Trunc => "trunc",
            Opcode::ZExt => "zext",
            Opcode::SExt => "sext",
            Opcode::FPTrunc => "fptrunc",
            Opcode::FPExt => "fpext",
            Opcode::FPToUI => "fptoui",
            Opcode::FPToSI => "fptosi",
            Opcode::UIToFP => "uitofp",
            Opcode::SIToFP => "sitofp",
            Opcode::PtrToInt => "ptrtoint",
            Opcode::IntToPtr => "inttoptr",
            Opcode::BitCast => "bitcast",
            Opcode::AddrSpaceCast => "addrspacecast",
            Opcode::ICmp => "icmp",
            Opcode::FCmp => "fcmp",
            Opcode::Phi => "phi",
            Opcode::Call => "call",
            Opcode::Select => "select",
            Opcode::ExtractElement => "extractelement",
            Opcode::InsertElement => "insertelement",
            Opcode::ShuffleVector => "shufflevector",
            Opcode::ExtractValue => "extractvalue",
            Opcode::InsertValue => "insertvalue",
            Opcode::Other(n) => return write!(f, "op{}", n),
        };
        write!(f, "{}", name)
    }
}
