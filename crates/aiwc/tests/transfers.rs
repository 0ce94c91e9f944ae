//! Host↔device transfer attribution, end to end.

mod common;

use aiwc::prelude::*;
use common::*;

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("transfers CSV should exist")
        .lines()
        .map(str::to_string)
        .collect()
}

/// Copies made before the first kernel is named are attributed to it
/// retroactively; the copy back out follows it.
#[test]
fn test_copies_bracket_one_kernel() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Characteriser::builder()
        .output_dir(dir.path())
        .transfers_dir(dir.path())
        .build();

    for _ in 0..3 {
        engine.host_memory_store(&global_region(), 0x0, 1024);
    }

    let invocation = KernelInvocation::new("saxpy", Size3::new(1, 1, 1), Size3::new(1, 1, 1));
    let group = WorkGroup::new(Size3::new(0, 0, 0), invocation.local_size);
    let item = WorkItem::new(Size3::new(0, 0, 0));

    let mut worker = engine.worker();
    engine.kernel_begin(&invocation);
    worker.work_group_begin(&group);
    worker.work_item_begin(&item);
    worker.instruction_executed(&item, &add_instr(1, 0), &ResultValue::scalar());
    worker.work_item_complete(&item);
    worker.work_group_complete(&group);
    engine.kernel_end(&invocation);

    engine.host_memory_load(&global_region(), 0x0, 1024);
    engine.finish().unwrap();

    let lines = read_lines(&dir.path().join("aiwc_memory_transfers_0.csv"));
    assert_eq!(
        lines,
        vec![
            "metric,kernel,count",
            "transfer: host to device,saxpy,3",
            "transfer: device to host,saxpy,1",
        ]
    );
}

/// Each kernel claims only the host→device copies since the previous one.
#[test]
fn test_copies_split_between_kernels() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Characteriser::builder()
        .output_dir(dir.path())
        .transfers_dir(dir.path())
        .build();

    engine.host_memory_store(&global_region(), 0x0, 64);
    engine.host_memory_store(&global_region(), 0x40, 64);
    let first = KernelInvocation::new("first", Size3::new(1, 1, 1), Size3::new(1, 1, 1));
    engine.kernel_begin(&first);
    engine.kernel_end(&first);

    engine.host_memory_store(&global_region(), 0x80, 64);
    let second = KernelInvocation::new("second", Size3::new(1, 1, 1), Size3::new(1, 1, 1));
    engine.kernel_begin(&second);
    engine.kernel_end(&second);
    engine.host_memory_load(&global_region(), 0x80, 64);

    engine.finish().unwrap();

    let lines = read_lines(&dir.path().join("aiwc_memory_transfers_0.csv"));
    assert_eq!(
        lines,
        vec![
            "metric,kernel,count",
            "transfer: host to device,first,2",
            "transfer: host to device,second,1",
            "transfer: device to host,second,1",
        ]
    );
}

/// The transfer log file counter skips names already taken.
#[test]
fn test_transfer_log_counter_advances() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("aiwc_memory_transfers_0.csv"), "older run").unwrap();

    let engine = Characteriser::builder()
        .output_dir(dir.path())
        .transfers_dir(dir.path())
        .build();
    engine.host_memory_store(&global_region(), 0x0, 64);
    engine.finish().unwrap();

    assert!(dir.path().join("aiwc_memory_transfers_1.csv").exists());
    let preserved = std::fs::read_to_string(dir.path().join("aiwc_memory_transfers_0.csv")).unwrap();
    assert_eq!(preserved, "older run");
}
