//! Output-file selection behaviour across kernel invocations.

mod common;

use aiwc::prelude::*;
use common::*;

fn run_empty_kernel(engine: &Characteriser, name: &str) {
    let invocation = KernelInvocation::new(name, Size3::new(1, 1, 1), Size3::new(1, 1, 1));
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
}

/// A pinned output path collects consecutive kernels in order.
#[test]
fn test_pinned_path_appends_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let pinned = dir.path().join("all_kernels.csv");
    let engine = Characteriser::builder()
        .output_path(&pinned)
        .transfers_dir(dir.path())
        .build();

    run_empty_kernel(&engine, "first");
    run_empty_kernel(&engine, "second");

    let text = std::fs::read_to_string(&pinned).unwrap();
    let kernel_rows: Vec<&str> = text
        .lines()
        .filter(|line| line.starts_with("kernel_name,"))
        .collect();
    assert_eq!(kernel_rows, vec!["kernel_name,Meta,first", "kernel_name,Meta,second"]);

    let headers = text
        .lines()
        .filter(|line| *line == "metric,category,count")
        .count();
    assert_eq!(headers, 2);
}

/// Directory mode gives every invocation its own numbered file.
#[test]
fn test_directory_mode_numbers_invocations() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Characteriser::builder()
        .output_dir(dir.path())
        .transfers_dir(dir.path())
        .build();

    run_empty_kernel(&engine, "stencil");
    run_empty_kernel(&engine, "stencil");

    assert!(dir.path().join("aiwc_stencil_0.csv").exists());
    assert!(dir.path().join("aiwc_stencil_1.csv").exists());

    let rows = read_metrics(&dir.path().join("aiwc_stencil_1.csv"));
    assert_eq!(value(&rows, "kernel_name"), "stencil");
}

/// Kernels with distinct names never share a numbered file.
#[test]
fn test_kernel_names_partition_files() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Characteriser::builder()
        .output_dir(dir.path())
        .transfers_dir(dir.path())
        .build();

    run_empty_kernel(&engine, "alpha");
    run_empty_kernel(&engine, "beta");

    assert!(dir.path().join("aiwc_alpha_0.csv").exists());
    assert!(dir.path().join("aiwc_beta_0.csv").exists());
}
