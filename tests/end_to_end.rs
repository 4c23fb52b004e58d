// end_to_end.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end CSV-output scenarios, covering the concrete (base, digits)
//! cases and stability properties.

use std::path::Path;

use kaprekar_engine::Cli;

fn cli(min_base: u64, max_base: u64, min_digits: u64, max_digits: u64, cpu_cores: usize, high_mem: bool, data_dir: &Path) -> Cli {
    Cli {
        min_base,
        max_base,
        min_digits,
        max_digits,
        cpu_cores,
        data_dir: data_dir.to_path_buf(),
        digit_threshold: 13,
        verbose: false,
        high_mem,
    }
}

fn read_csv(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join("csv").join(name)).unwrap()
}

#[test]
fn base10_digits4_has_exactly_kaprekars_constant() {
    let dir = tempfile::tempdir().unwrap();
    let opts = cli(10, 10, 4, 4, 2, false, dir.path());
    kaprekar_engine::driver::run(&opts).unwrap();

    let summary = read_csv(dir.path(), "kaprekar_summary_base10-10_digits4-4.csv");
    assert_eq!(summary.lines().nth(1).unwrap(), "10,4,0,1");

    let fp = read_csv(dir.path(), "kaprekar_fp_base10-10_digits4-4.csv");
    assert_eq!(fp.lines().nth(1).unwrap(), "10,4,6174");

    let cycles = read_csv(dir.path(), "kaprekar_cycles_base10-10_digits4-4.csv");
    assert_eq!(cycles.lines().nth(1).unwrap(), "10,4,0");
}

#[test]
fn base10_digits3_has_exactly_495() {
    let dir = tempfile::tempdir().unwrap();
    let opts = cli(10, 10, 3, 3, 1, false, dir.path());
    kaprekar_engine::driver::run(&opts).unwrap();

    let fp = read_csv(dir.path(), "kaprekar_fp_base10-10_digits3-3.csv");
    assert_eq!(fp.lines().nth(1).unwrap(), "10,3,495");
}

#[test]
fn base10_digits2_has_one_cycle_canonical_nine() {
    let dir = tempfile::tempdir().unwrap();
    let opts = cli(10, 10, 2, 2, 1, false, dir.path());
    kaprekar_engine::driver::run(&opts).unwrap();

    // zero non-zero fixed points: the fp file has only the header row
    let fp = read_csv(dir.path(), "kaprekar_fp_base10-10_digits2-2.csv");
    assert_eq!(fp.lines().count(), 1);

    let cycles = read_csv(dir.path(), "kaprekar_cycles_base10-10_digits2-2.csv");
    assert_eq!(cycles.lines().nth(1).unwrap(), "10,2,1");

    let summary = read_csv(dir.path(), "kaprekar_summary_base10-10_digits2-2.csv");
    assert_eq!(summary.lines().nth(1).unwrap(), "10,2,90,0");
}

#[test]
fn base2_digits3_collapses_to_the_degenerate_fixed_point() {
    let dir = tempfile::tempdir().unwrap();
    let opts = cli(2, 2, 3, 3, 1, false, dir.path());
    kaprekar_engine::driver::run(&opts).unwrap();

    let summary = read_csv(dir.path(), "kaprekar_summary_base2-2_digits3-3.csv");
    assert_eq!(summary.lines().nth(1).unwrap(), "2,3,0,0");

    let fp = read_csv(dir.path(), "kaprekar_fp_base2-2_digits3-3.csv");
    assert_eq!(fp.lines().count(), 1);
}

#[test]
fn output_rows_are_strictly_ordered_by_base_then_digits() {
    let dir = tempfile::tempdir().unwrap();
    let opts = cli(2, 6, 2, 4, 3, false, dir.path());
    kaprekar_engine::driver::run(&opts).unwrap();

    let summary = read_csv(dir.path(), "kaprekar_summary_base2-6_digits2-4.csv");
    let rows: Vec<(u64, u64)> = summary
        .lines()
        .skip(1)
        .map(|l| {
            let mut parts = l.split(',');
            let b: u64 = parts.next().unwrap().parse().unwrap();
            let d: u64 = parts.next().unwrap().parse().unwrap();
            (b, d)
        })
        .collect();

    let mut expected = Vec::new();
    for base in 2..=6u64 {
        for digits in 2..=4u64 {
            expected.push((base, digits));
        }
    }
    assert_eq!(rows, expected);
}

#[test]
fn base10_digits5_counts_are_stable_across_worker_counts_and_high_mem() {
    let mut baseline: Option<String> = None;
    for &(cpu_cores, high_mem) in &[(1usize, false), (4, false), (4, true), (1, true)] {
        let dir = tempfile::tempdir().unwrap();
        let opts = cli(10, 10, 5, 5, cpu_cores, high_mem, dir.path());
        kaprekar_engine::driver::run(&opts).unwrap();

        let summary = read_csv(dir.path(), "kaprekar_summary_base10-10_digits5-5.csv");
        let row = summary.lines().nth(1).unwrap().to_string();
        let cycles = read_csv(dir.path(), "kaprekar_cycles_base10-10_digits5-5.csv");
        let cycle_row = cycles.lines().nth(1).unwrap().to_string();
        let combined = format!("{}|{}", row, cycle_row);

        match &baseline {
            None => baseline = Some(combined),
            Some(expected) => assert_eq!(&combined, expected, "cpu_cores={cpu_cores} high_mem={high_mem}"),
        }
    }
}

#[test]
fn complex_pair_counts_are_stable_across_worker_counts_and_high_mem() {
    // base + digits == 20: smallest pair that actually exercises the
    // parallel orchestrator rather than the serial pool.
    let mut baseline: Option<String> = None;
    for &(cpu_cores, high_mem) in &[(1usize, false), (4, false), (4, true), (1, true)] {
        let dir = tempfile::tempdir().unwrap();
        let opts = cli(15, 15, 5, 5, cpu_cores, high_mem, dir.path());
        kaprekar_engine::driver::run(&opts).unwrap();

        let summary = read_csv(dir.path(), "kaprekar_summary_base15-15_digits5-5.csv");
        let row = summary.lines().nth(1).unwrap().to_string();
        let cycles = read_csv(dir.path(), "kaprekar_cycles_base15-15_digits5-5.csv");
        let cycle_row = cycles.lines().nth(1).unwrap().to_string();
        let combined = format!("{}|{}", row, cycle_row);

        match &baseline {
            None => baseline = Some(combined),
            Some(expected) => assert_eq!(&combined, expected, "cpu_cores={cpu_cores} high_mem={high_mem}"),
        }
    }
}
