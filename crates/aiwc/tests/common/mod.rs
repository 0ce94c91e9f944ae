//! Shared helpers for integration tests: trace-event constructors and a
//! small reader for the emitted CSVs.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use aiwc::prelude::*;

/// A non-memory arithmetic instruction.
pub fn add_instr(id: u64, block: u64) -> InstructionRecord<'static> {
    InstructionRecord::new(InstructionId(id), Opcode::Add, BlockId(block))
}

/// A load instruction with its pointer operand.
pub fn load_instr(
    id: u64,
    block: u64,
    label: &'static str,
    space: AddressSpace,
) -> InstructionRecord<'static> {
    InstructionRecord::new(InstructionId(id), Opcode::Load, BlockId(block))
        .with_pointer_operand(label, space)
}

/// A store instruction with its pointer operand.
pub fn store_instr(
    id: u64,
    block: u64,
    label: &'static str,
    space: AddressSpace,
) -> InstructionRecord<'static> {
    InstructionRecord::new(InstructionId(id), Opcode::Store, BlockId(block))
        .with_pointer_operand(label, space)
}

/// A two-way conditional branch.
pub fn branch_instr(id: u64, block: u64, taken: u64, not_taken: u64) -> InstructionRecord<'static> {
    InstructionRecord::new(InstructionId(id), Opcode::Br, BlockId(block))
        .with_branch_targets(BlockId(taken), BlockId(not_taken))
}

/// A global-memory region tag.
pub fn global_region() -> MemoryRegion {
    MemoryRegion::new(AddressSpace::Global)
}

/// Parse an emitted per-kernel CSV into metric -> (category, value).
pub fn read_metrics(path: &Path) -> HashMap<String, (String, String)> {
    let text = std::fs::read_to_string(path).expect("metrics CSV should exist");
    let mut rows = HashMap::new();
    for line in text.lines().skip(1) {
        let mut fields = line.splitn(3, ',');
        let metric = fields.next().expect("metric field").to_string();
        let category = fields.next().expect("category field").to_string();
        let value = fields.next().expect("value field").to_string();
        rows.insert(metric, (category, value));
    }
    rows
}

/// Fetch a metric value as text.
pub fn value<'a>(rows: &'a HashMap<String, (String, String)>, metric: &str) -> &'a str {
    &rows.get(metric).unwrap_or_else(|| panic!("missing metric {}", metric)).1
}

/// Fetch a metric value as a float.
pub fn value_f64(rows: &HashMap<String, (String, String)>, metric: &str) -> f64 {
    value(rows, metric)
        .parse()
        .unwrap_or_else(|_| panic!("metric {} is not numeric", metric))
}

/// Split a `key=value;`-packed metric payload into pairs.
pub fn parse_list(payload: &str) -> Vec<(String, f64)> {
    payload
        .split(';')
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (key, value) = entry.split_once('=').expect("key=value entry");
            (key.to_string(), value.parse().expect("numeric list value"))
        })
        .collect()
}
