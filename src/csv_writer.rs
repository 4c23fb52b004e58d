// csv_writer.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The three output CSV streams. Hand-rolled rather than pulled from a `csv`
//! crate: rows are a handful of integers and one comma-joined list, with no
//! quoting or escaping concerns, so `writeln!` against a `BufWriter` is all
//! the format needs.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::EngineResult;
use crate::orchestrator::TaskResult;

pub struct CsvWriters {
    summary: BufWriter<File>,
    fp: BufWriter<File>,
    cycles: BufWriter<File>,
    pub summary_path: PathBuf,
    pub fp_path: PathBuf,
    pub cycles_path: PathBuf,
}

impl CsvWriters {
    pub fn create(
        data_dir: &Path,
        min_base: u64,
        max_base: u64,
        min_digits: u64,
        max_digits: u64,
    ) -> EngineResult<Self> {
        let csv_dir = data_dir.join("csv");
        fs::create_dir_all(&csv_dir)?;

        let suffix = format!("base{}-{}_digits{}-{}.csv", min_base, max_base, min_digits, max_digits);
        let summary_path = csv_dir.join(format!("kaprekar_summary_{}", suffix));
        let fp_path = csv_dir.join(format!("kaprekar_fp_{}", suffix));
        let cycles_path = csv_dir.join(format!("kaprekar_cycles_{}", suffix));

        let mut summary = BufWriter::new(File::create(&summary_path)?);
        let mut fp = BufWriter::new(File::create(&fp_path)?);
        let mut cycles = BufWriter::new(File::create(&cycles_path)?);

        writeln!(summary, "base,digits,num_cycles,fixed_points")?;
        writeln!(fp, "base,digits,fixed_point_values")?;
        writeln!(cycles, "base,digits,unique_cycle_ids")?;

        Ok(CsvWriters {
            summary,
            fp,
            cycles,
            summary_path,
            fp_path,
            cycles_path,
        })
    }

    /// Emits every digit row for one base, in increasing-digits order, then
    /// flushes all three streams. Callers must only invoke this once a base
    /// is emit-eligible (see [`crate::driver`]'s ordering invariant).
    pub fn write_base(&mut self, base: u64, rows: &[(u32, &TaskResult)]) -> EngineResult<()> {
        for &(digits, result) in rows {
            writeln!(
                self.summary,
                "{},{},{},{}",
                base,
                digits,
                result.weighted_cycle_count,
                result.fixed_point_values.len()
            )?;

            if !result.fixed_point_values.is_empty() {
                let joined = result
                    .fixed_point_values
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                writeln!(self.fp, "{},{},{}", base, digits, joined)?;
            }

            writeln!(self.cycles, "{},{},{}", base, digits, result.unique_cycle_ids)?;
        }

        self.summary.flush()?;
        self.fp.flush()?;
        self.cycles.flush()?;
        Ok(())
    }
}
