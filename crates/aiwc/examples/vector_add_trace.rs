//! # Vector Add Trace Example
//!
//! Replays the trace a simulator would produce for a small vector-add
//! kernel and writes the characterisation CSVs into `./aiwc_demo`.
//!
//! ## Run this example:
//! ```bash
//! cargo run -p aiwc --example vector_add_trace
//! ```

use aiwc::prelude::*;

const GROUPS: u64 = 2;
const LANES: u64 = 8;

fn main() -> aiwc::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let out_dir = std::path::Path::new("aiwc_demo");
    std::fs::create_dir_all(out_dir)?;

    let engine = Characteriser::builder()
        .output_dir(out_dir)
        .transfers_dir(out_dir)
        .build();

    // The host stages both input vectors before launching.
    let region = MemoryRegion::new(AddressSpace::Global);
    engine.host_memory_store(&region, 0x1000, 4 * GROUPS * LANES);
    engine.host_memory_store(&region, 0x2000, 4 * GROUPS * LANES);

    let invocation = KernelInvocation::new(
        "vector_add",
        Size3::new(GROUPS, 1, 1),
        Size3::new(LANES, 1, 1),
    );
    engine.kernel_begin(&invocation);

    let load_a = InstructionRecord::new(InstructionId(1), Opcode::Load, BlockId(0))
        .with_pointer_operand("a", AddressSpace::Global)
        .with_source_line(3);
    let load_b = InstructionRecord::new(InstructionId(2), Opcode::Load, BlockId(0))
        .with_pointer_operand("b", AddressSpace::Global)
        .with_source_line(3);
    let add = InstructionRecord::new(InstructionId(3), Opcode::FAdd, BlockId(0));
    let store_c = InstructionRecord::new(InstructionId(4), Opcode::Store, BlockId(0))
        .with_pointer_operand("c", AddressSpace::Global)
        .with_source_line(3);

    let mut worker = engine.worker();
    for group_x in 0..GROUPS {
        let group = WorkGroup::new(Size3::new(group_x, 0, 0), invocation.local_size);
        worker.work_group_begin(&group);
        for lane in 0..LANES {
            let item = WorkItem::new(Size3::new(lane, 0, 0));
            let element = (group_x * LANES + lane) * 4;
            worker.work_item_begin(&item);
            worker.instruction_executed(&item, &load_a, &ResultValue::scalar());
            worker.memory_load(&region, &item, 0x1000 + element, 4);
            worker.instruction_executed(&item, &load_b, &ResultValue::scalar());
            worker.memory_load(&region, &item, 0x2000 + element, 4);
            worker.instruction_executed(&item, &add, &ResultValue::scalar());
            worker.instruction_executed(&item, &store_c, &ResultValue::scalar());
            worker.memory_store(&region, &item, 0x3000 + element, 4);
            worker.work_item_complete(&item);
        }
        worker.work_group_complete(&group);
    }

    engine.kernel_end(&invocation);

    // The host copies the result back out.
    engine.host_memory_load(&region, 0x3000, 4 * GROUPS * LANES);
    engine.finish()?;

    println!("characterisation written to {}", out_dir.display());
    Ok(())
}
