// orchestrator.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Per-task orchestration for one `(base, digits)` problem: adaptive chunk
//! sizing, the worker pool, and (for the token-passing path) the async memo
//! merger. Dispatch between this module's parallel path and the serial path
//! in [`crate::serial`] is the driver's job — this module only ever runs
//! once `digits + base >= 20`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread;

use hashbrown::HashSet;

use crate::arithmetic::multiset_count;
use crate::error::{EngineError, EngineResult};
use crate::memo::{Kind, Memo};
use crate::progress::ProgressReporter;
use crate::sampler::WriteRateSampler;
use crate::token::TokenRing;
use crate::worker::{self, ChunkDescriptor, ChunkResult, TokenWorker};

const CHUNKS_PER_CORE: u128 = 20;
const MIN_CHUNK: u128 = 5_000;
const MAX_CHUNK: u128 = 100_000;

#[derive(Debug, Clone)]
pub struct TaskResult {
    pub weighted_cycle_count: u128,
    pub fixed_point_values: Vec<u64>,
    pub unique_cycle_ids: u64,
}

fn adaptive_chunk_size(total: u128, worker_count: usize) -> u128 {
    let denom = (worker_count as u128) * CHUNKS_PER_CORE;
    let raw = if denom == 0 { total } else { (total / denom).max(1) };
    raw.clamp(MIN_CHUNK, MAX_CHUNK)
}

fn chunk_bounds(total: u128, chunk_size: u128) -> Vec<(u128, u128)> {
    let num_chunks = (total + chunk_size - 1) / chunk_size;
    (0..num_chunks)
        .map(|i| {
            let lo = i * chunk_size;
            let hi = ((i + 1) * chunk_size).min(total);
            (lo, hi)
        })
        .collect()
}

fn worker_fault(base: u64, digits: u32, payload: Box<dyn std::any::Any + Send>) -> EngineError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked with an unrecognized payload".to_string());
    EngineError::WorkerFault {
        base,
        digits: digits as u64,
        detail,
    }
}

/// Runs the full W-way parallel orchestrator for one `(base, digits)` pair.
/// Picks the token-passing path when `high_mem` is set, the direct-write
/// path otherwise — the two differ in how the shared memo is written, not
/// in chunking, dispatch, or termination.
pub fn run_parallel(
    base: u64,
    digits: u32,
    worker_count: usize,
    high_mem: bool,
    progress: &ProgressReporter,
) -> EngineResult<TaskResult> {
    let total = multiset_count(base, digits);
    let chunk_size = adaptive_chunk_size(total, worker_count);
    let bounds = chunk_bounds(total, chunk_size);

    if high_mem {
        run_token_mode(base, digits, worker_count, bounds, progress)
    } else {
        run_direct_mode(base, digits, worker_count, bounds, progress)
    }
}

fn run_token_mode(
    base: u64,
    digits: u32,
    worker_count: usize,
    bounds: Vec<(u128, u128)>,
    progress: &ProgressReporter,
) -> EngineResult<TaskResult> {
    let shared = Mutex::new(Memo::new());
    let token = TokenRing::new(worker_count);

    let (chunk_tx, chunk_rx) = crossbeam_channel::unbounded::<ChunkDescriptor>();
    let (result_tx, result_rx) =
        crossbeam_channel::unbounded::<Result<ChunkResult, Box<dyn std::any::Any + Send>>>();
    let (delta_tx, delta_rx) = crossbeam_channel::unbounded::<Memo>();

    for (lo, hi) in bounds {
        chunk_tx
            .send(ChunkDescriptor { base, digits, lo, hi })
            .expect("chunk receiver outlives this loop");
    }
    drop(chunk_tx);

    let mut weighted_cycle_count: u128 = 0;
    let mut fault: Option<EngineError> = None;

    thread::scope(|scope| {
        let merger = scope.spawn(|| {
            while let Ok(delta) = delta_rx.recv() {
                let mut guard = shared.lock().unwrap();
                crate::memo::merge_delta(&mut guard, &delta);
            }
        });

        for id in 0..worker_count {
            let chunk_rx = chunk_rx.clone();
            let result_tx = result_tx.clone();
            let delta_tx = delta_tx.clone();
            let shared = &shared;
            let token = &token;
            scope.spawn(move || {
                let mut w = TokenWorker::new(id);
                while let Ok(chunk) = chunk_rx.recv() {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        w.process_chunk(chunk, shared, token, progress)
                    }));
                    match outcome {
                        Ok(result) => {
                            if !result.memo_delta.is_empty() {
                                let _ = delta_tx.send(result.memo_delta.clone());
                            }
                            if result_tx.send(Ok(result)).is_err() {
                                return;
                            }
                        }
                        Err(payload) => {
                            let _ = result_tx.send(Err(payload));
                            return;
                        }
                    }
                }
            });
        }
        drop(result_tx);
        drop(delta_tx);
        drop(chunk_rx);

        let mut fixed_points: HashSet<u64> = HashSet::new();
        for outcome in result_rx.iter() {
            match outcome {
                Ok(result) => {
                    weighted_cycle_count += result.weighted_cycle_count;
                    fixed_points.extend(result.fixed_points);
                }
                Err(payload) => {
                    if fault.is_none() {
                        fault = Some(worker_fault(base, digits, payload));
                    }
                }
            }
        }

        // Every worker has now returned its last result, so every delta_tx
        // clone (one per worker, plus the one dropped above) is gone; the
        // merger's `recv()` loop will drain whatever is still queued and
        // exit on its own. Join it here, before reading `shared`, rather
        // than relying on `thread::scope`'s implicit join at the end of
        // this closure — that join happens after this closure returns,
        // which is too late for a read that happens inside it.
        merger.join().expect("merger thread panicked");

        if let Some(err) = fault.take() {
            return Err(err);
        }

        let mut fixed_point_values: Vec<u64> = fixed_points.into_iter().filter(|&n| n != 0).collect();
        fixed_point_values.sort_unstable();

        let unique_cycle_ids = {
            let guard = shared.lock().unwrap();
            guard
                .values()
                .filter(|(kind, _)| *kind == Kind::Cycle)
                .map(|(_, id)| *id)
                .collect::<HashSet<_>>()
                .len() as u64
        };

        Ok(TaskResult {
            weighted_cycle_count,
            fixed_point_values,
            unique_cycle_ids,
        })
    })
}

fn run_direct_mode(
    base: u64,
    digits: u32,
    worker_count: usize,
    bounds: Vec<(u128, u128)>,
    progress: &ProgressReporter,
) -> EngineResult<TaskResult> {
    let shared = Mutex::new(Memo::new());
    let sampler = WriteRateSampler::new(bounds.len() as u64);

    let (chunk_tx, chunk_rx) = crossbeam_channel::unbounded::<ChunkDescriptor>();
    let (result_tx, result_rx) =
        crossbeam_channel::unbounded::<Result<ChunkResult, Box<dyn std::any::Any + Send>>>();

    for (lo, hi) in bounds {
        chunk_tx
            .send(ChunkDescriptor { base, digits, lo, hi })
            .expect("chunk receiver outlives this loop");
    }
    drop(chunk_tx);

    thread::scope(|scope| {
        for _ in 0..worker_count {
            let chunk_rx = chunk_rx.clone();
            let result_tx = result_tx.clone();
            let shared = &shared;
            let sampler = &sampler;
            scope.spawn(move || {
                while let Ok(chunk) = chunk_rx.recv() {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        worker::process_chunk_direct(chunk, shared, sampler, progress)
                    }));
                    if result_tx.send(outcome).is_err() {
                        return;
                    }
                }
            });
        }
        drop(result_tx);
        drop(chunk_rx);

        let mut weighted_cycle_count: u128 = 0;
        let mut fixed_points: HashSet<u64> = HashSet::new();
        let mut fault: Option<EngineError> = None;

        for outcome in result_rx.iter() {
            match outcome {
                Ok(result) => {
                    weighted_cycle_count += result.weighted_cycle_count;
                    fixed_points.extend(result.fixed_points);
                }
                Err(payload) => {
                    if fault.is_none() {
                        fault = Some(worker_fault(base, digits, payload));
                    }
                }
            }
        }

        if let Some(err) = fault {
            return Err(err);
        }

        let mut fixed_point_values: Vec<u64> = fixed_points.into_iter().filter(|&n| n != 0).collect();
        fixed_point_values.sort_unstable();

        let unique_cycle_ids = {
            let guard = shared.lock().unwrap();
            guard
                .values()
                .filter(|(kind, _)| *kind == Kind::Cycle)
                .map(|(_, id)| *id)
                .collect::<HashSet<_>>()
                .len() as u64
        };

        Ok(TaskResult {
            weighted_cycle_count,
            fixed_point_values,
            unique_cycle_ids,
        })
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_adaptive_chunk_size_clamps_to_bounds() {
        assert_eq!(adaptive_chunk_size(1_000, 4), MIN_CHUNK);
        assert_eq!(adaptive_chunk_size(u128::from(u64::MAX), 1), MAX_CHUNK);
    }

    #[test]
    fn test_chunk_bounds_cover_whole_range_without_overlap() {
        let bounds = chunk_bounds(23_456, 5_000);
        assert_eq!(bounds.first().unwrap().0, 0);
        assert_eq!(bounds.last().unwrap().1, 23_456);
        for w in bounds.windows(2) {
            assert_eq!(w[0].1, w[1].0);
        }
    }

    #[test]
    fn test_token_mode_weighted_cycle_count_never_exceeds_total_space() {
        let progress = ProgressReporter::new("test", 1);
        let result = run_parallel(10, 5, 4, true, &progress).unwrap();
        assert!(result.weighted_cycle_count <= (10u128).pow(5));
        assert!(!result.fixed_point_values.is_empty());
    }

    #[test]
    fn test_direct_mode_matches_token_mode_counts() {
        let progress = ProgressReporter::new("test", 1);
        let direct = run_parallel(10, 5, 4, false, &progress).unwrap();
        let token = run_parallel(10, 5, 4, true, &progress).unwrap();
        assert_eq!(direct.weighted_cycle_count, token.weighted_cycle_count);
        assert_eq!(direct.fixed_point_values, token.fixed_point_values);
    }
}
