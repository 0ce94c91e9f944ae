//! Trace-replay benchmarks.
//!
//! Measures the per-event cost of the worker hot path (instruction and
//! memory callbacks) and the work-group merge, using a synthetic
//! compute-plus-load kernel shape.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use aiwc::prelude::*;

const LANES: u64 = 64;
const ROUNDS: u64 = 16;

fn drive_group(worker: &mut Worker, group: &WorkGroup) {
    let add = InstructionRecord::new(InstructionId(1), Opcode::Add, BlockId(0));
    let load = InstructionRecord::new(InstructionId(2), Opcode::Load, BlockId(0))
        .with_pointer_operand("src", AddressSpace::Global);
    let region = MemoryRegion::new(AddressSpace::Global);

    worker.work_group_begin(group);
    for lane in 0..LANES {
        let item = WorkItem::new(Size3::new(lane, 0, 0));
        worker.work_item_begin(&item);
        for round in 0..ROUNDS {
            worker.instruction_executed(&item, &add, &ResultValue::scalar());
            worker.instruction_executed(&item, &load, &ResultValue::scalar());
            worker.memory_load(&region, &item, 0x1000 + (lane * ROUNDS + round) * 4, 4);
        }
        worker.work_item_complete(&item);
    }
}

fn bench_worker_hot_path(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("temp dir");
    let engine = Characteriser::builder()
        .output_dir(dir.path())
        .transfers_dir(dir.path())
        .build();
    let mut worker = engine.worker();
    let group = WorkGroup::new(Size3::new(0, 0, 0), Size3::new(LANES, 1, 1));

    let mut bench_group = c.benchmark_group("replay");
    bench_group.throughput(Throughput::Elements(LANES * ROUNDS * 3));

    bench_group.bench_function("work_group_events", |b| {
        b.iter(|| {
            drive_group(&mut worker, &group);
            black_box(&worker);
        });
    });

    bench_group.finish();
}

fn bench_group_merge(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("temp dir");
    let engine = Characteriser::builder()
        .output_dir(dir.path())
        .transfers_dir(dir.path())
        .build();
    let mut worker = engine.worker();
    let group = WorkGroup::new(Size3::new(0, 0, 0), Size3::new(LANES, 1, 1));

    c.bench_function("merge/work_group_complete", |b| {
        b.iter(|| {
            drive_group(&mut worker, &group);
            worker.work_group_complete(&group);
        });
    });
}

criterion_group!(benches, bench_worker_hot_path, bench_group_merge);
criterion_main!(benches);
