// driver.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The top-level driver: walks the `(base, digits)` rectangle, classifies
//! each pair as simple or complex, dispatches to the serial pool or the
//! parallel orchestrator accordingly, and emits CSV rows in strictly
//! increasing `(base, digits)` order regardless of completion order.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::arithmetic::multiset_count;
use crate::cli::Cli;
use crate::csv_writer::CsvWriters;
use crate::error::EngineResult;
use crate::orchestrator::{self, TaskResult};
use crate::progress::ProgressReporter;
use crate::serial;

/// Runs the full rectangle described by `cli`, writing CSV output under
/// `cli.data_dir`. This is the crate's single public entry point.
pub fn run(cli: &Cli) -> EngineResult<()> {
    let mut simple_pairs = Vec::new();
    let mut complex_pairs = Vec::new();

    for base in cli.min_base..=cli.max_base {
        for digits in cli.min_digits..=cli.max_digits {
            let digits = digits as u32;
            if serial::is_simple(base, digits) {
                simple_pairs.push((base, digits));
            } else {
                complex_pairs.push((base, digits));
            }
        }
    }

    let total_multisets: u128 = simple_pairs
        .iter()
        .chain(complex_pairs.iter())
        .map(|&(base, digits)| multiset_count(base, digits))
        .sum();

    info!(
        "processing {} base-digit pairs ({} simple, {} complex), {} total multisets",
        simple_pairs.len() + complex_pairs.len(),
        simple_pairs.len(),
        complex_pairs.len(),
        total_multisets
    );

    let progress = ProgressReporter::new("kaprekar", total_multisets.min(usize::MAX as u128) as usize);
    let mut writers = CsvWriters::create(
        &cli.data_dir,
        cli.min_base,
        cli.max_base,
        cli.min_digits,
        cli.max_digits,
    )?;

    let total_pairs = simple_pairs.len() + complex_pairs.len();
    let digits_per_base = (cli.max_digits - cli.min_digits + 1) as usize;
    let mut results: BTreeMap<u64, BTreeMap<u32, TaskResult>> = BTreeMap::new();
    let mut bases_complete: BTreeSet<u64> = BTreeSet::new();
    let mut bases_written: BTreeSet<u64> = BTreeSet::new();

    if !simple_pairs.is_empty() {
        debug!("running {} simple pairs through the serial pool", simple_pairs.len());
        let outcomes = serial::run_simple_pool(&simple_pairs, cli.cpu_cores, &progress)?;
        for ((base, digits), result) in outcomes {
            results.entry(base).or_default().insert(digits, result);
        }
        refresh_complete_bases(&results, &mut bases_complete, cli.min_base, cli.max_base, digits_per_base);
        flush_writable_bases(&mut writers, &results, &mut bases_complete, &mut bases_written, cli.min_base)?;
    }

    for (base, digits) in complex_pairs {
        debug!("running complex pair base={} digits={} through the parallel orchestrator", base, digits);
        let result = orchestrator::run_parallel(base, digits, cli.cpu_cores, cli.high_mem, &progress)?;
        results.entry(base).or_default().insert(digits, result);
        refresh_complete_bases(&results, &mut bases_complete, cli.min_base, cli.max_base, digits_per_base);
        flush_writable_bases(&mut writers, &results, &mut bases_complete, &mut bases_written, cli.min_base)?;
    }

    info!("completed all {} pairs", total_pairs);
    info!("wrote {}", writers.summary_path.display());
    info!("wrote {}", writers.fp_path.display());
    info!("wrote {}", writers.cycles_path.display());

    Ok(())
}

fn refresh_complete_bases(
    results: &BTreeMap<u64, BTreeMap<u32, TaskResult>>,
    bases_complete: &mut BTreeSet<u64>,
    min_base: u64,
    max_base: u64,
    digits_per_base: usize,
) {
    for base in min_base..=max_base {
        if let Some(by_digits) = results.get(&base) {
            if by_digits.len() == digits_per_base {
                bases_complete.insert(base);
            }
        }
    }
}

/// Emits every base in `bases_complete` that is not yet written and whose
/// every smaller base (`>= min_base`) is already written, in increasing
/// order. This is what guarantees the crate's total output order is
/// strictly `(base, digits)` regardless of which pair finished computing
/// first.
fn flush_writable_bases(
    writers: &mut CsvWriters,
    results: &BTreeMap<u64, BTreeMap<u32, TaskResult>>,
    bases_complete: &mut BTreeSet<u64>,
    bases_written: &mut BTreeSet<u64>,
    min_base: u64,
) -> EngineResult<()> {
    for &base in bases_complete.iter() {
        if bases_written.contains(&base) {
            continue;
        }
        let can_write = (min_base..base).all(|lower| bases_written.contains(&lower));
        if !can_write {
            continue;
        }

        let by_digits = &results[&base];
        let rows: Vec<(u32, &TaskResult)> = by_digits.iter().map(|(&d, r)| (d, r)).collect();
        writers.write_base(base, &rows)?;
        debug!("wrote base {} ({} rows)", base, rows.len());
        bases_written.insert(base);
    }
    Ok(())
}
