// serial.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The serial per-task path, active for "simple" pairs (`digits + base < 20`):
//! one process, one local memo, no token, no merger, no sampling. Also hosts
//! [`run_simple_pool`], which lets the driver run many simple pairs
//! concurrently across a fixed worker count, since no single simple pair is
//! expensive enough to warrant its own parallel orchestrator.

use std::panic::{self, AssertUnwindSafe};
use std::thread;

use hashbrown::HashSet;

use crate::arithmetic::{first_step_of_multiset, multiset_count, MultisetIter};
use crate::error::{EngineError, EngineResult};
use crate::memo::{Kind, Memo, MemoView};
use crate::orchestrator::TaskResult;
use crate::progress::ProgressReporter;
use crate::tracer::trace;

/// Runs one `(base, digits)` pair to completion in the current thread.
pub fn run_serial(base: u64, digits: u32, progress: &ProgressReporter) -> TaskResult {
    let mut memo = Memo::new();
    let mut fixed_points: Vec<u64> = Vec::new();
    let mut weighted_cycle_count: u128 = 0;
    let mut handle = progress.handle();

    for (ds, perm_count) in MultisetIter::new(base, digits) {
        let first_step = first_step_of_multiset(&ds, base);
        let outcome = trace(first_step, base, digits, &mut memo);
        match outcome.kind {
            Kind::FixedPoint => fixed_points.push(outcome.canonical_id),
            Kind::Cycle => weighted_cycle_count += perm_count,
        }
        handle.report(1);
    }

    let mut fixed_point_values: Vec<u64> = fixed_points.into_iter().filter(|&n| n != 0).collect();
    fixed_point_values.sort_unstable();
    fixed_point_values.dedup();

    let unique_cycle_ids = memo
        .values()
        .filter(|(kind, _)| *kind == Kind::Cycle)
        .map(|(_, id)| *id)
        .collect::<HashSet<_>>()
        .len() as u64;

    TaskResult {
        weighted_cycle_count,
        fixed_point_values,
        unique_cycle_ids,
    }
}

/// Runs every pair in `pairs` through [`run_serial`], spread across
/// `worker_count` OS threads via a shared work queue. Returns results in the
/// same order as `pairs` regardless of completion order. Aborts (and
/// propagates) on the first worker panic, matching the parallel path's
/// failure semantics: a lost pair would silently under-report the rectangle.
pub fn run_simple_pool(
    pairs: &[(u64, u32)],
    worker_count: usize,
    progress: &ProgressReporter,
) -> EngineResult<Vec<((u64, u32), TaskResult)>> {
    let (task_tx, task_rx) = crossbeam_channel::unbounded::<(u64, u32)>();
    let (result_tx, result_rx) =
        crossbeam_channel::unbounded::<Result<((u64, u32), TaskResult), Box<dyn std::any::Any + Send>>>();

    for &pair in pairs {
        task_tx.send(pair).expect("task receiver outlives this loop");
    }
    drop(task_tx);

    let worker_count = worker_count.max(1).min(pairs.len().max(1));

    thread::scope(|scope| {
        for _ in 0..worker_count {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok((base, digits)) = task_rx.recv() {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        ((base, digits), run_serial(base, digits, progress))
                    }));
                    if result_tx.send(outcome).is_err() {
                        return;
                    }
                }
            });
        }
        drop(result_tx);
        drop(task_rx);

        let mut by_pair: hashbrown::HashMap<(u64, u32), TaskResult> = hashbrown::HashMap::new();
        let mut fault: Option<EngineError> = None;

        for outcome in result_rx.iter() {
            match outcome {
                Ok((pair, result)) => {
                    by_pair.insert(pair, result);
                }
                Err(payload) => {
                    if fault.is_none() {
                        let detail = payload
                            .downcast_ref::<&str>()
                            .map(|s| s.to_string())
                            .or_else(|| payload.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "worker panicked with an unrecognized payload".to_string());
                        fault = Some(EngineError::WorkerFault {
                            base: 0,
                            digits: 0,
                            detail,
                        });
                    }
                }
            }
        }

        if let Some(err) = fault {
            return Err(err);
        }

        Ok(pairs
            .iter()
            .map(|&pair| {
                let result = by_pair.remove(&pair).expect("every dispatched pair returns a result");
                (pair, result)
            })
            .collect())
    })
}

/// Whether `(base, digits)` belongs on the serial path.
pub fn is_simple(base: u64, digits: u32) -> bool {
    base + digits as u64 < 20
}
