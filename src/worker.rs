// worker.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Chunk processing. A worker receives a contiguous range of the multiset
//! index space and returns the fixed points and weighted cycle count it
//! found, plus whatever memo state needs to flow back upward.
//!
//! Two regimes, matching the two parallel orchestrator paths:
//! - [`TokenWorker`] — persistent per-thread state (a read-only shared
//!   snapshot plus a private write delta), reconciled with the shared memo
//!   only when holding the sync token.
//! - [`process_chunk_direct`] — stateless: every chunk reloads a fresh copy
//!   of the shared memo and writes straight back through a mutex, with
//!   optional write-rate sampling.

use std::sync::Mutex;

use crate::arithmetic::{first_step_of_multiset, MultisetIter};
use crate::memo::{CompositeMemo, Kind, Memo, MemoView};
use crate::progress::ProgressReporter;
use crate::sampler::{keep_sampled, WriteRateSampler};
use crate::token::TokenRing;
use crate::tracer::trace;

pub struct ChunkDescriptor {
    pub base: u64,
    pub digits: u32,
    pub lo: u128,
    pub hi: u128,
}

#[derive(Default)]
pub struct ChunkResult {
    pub fixed_points: Vec<u64>,
    pub weighted_cycle_count: u128,
    pub multisets_processed: u64,
    pub write_count: u64,
    pub memo_delta: Memo,
}

fn run_multisets(
    chunk: &ChunkDescriptor,
    memo: &mut impl MemoView,
    progress: &ProgressReporter,
) -> (Vec<u64>, u128, u64) {
    let mut fixed_points = Vec::new();
    let mut weighted_cycle_count: u128 = 0;
    let mut multisets_processed: u64 = 0;
    let mut handle = progress.handle();

    for (ds, perm_count) in MultisetIter::range(chunk.base, chunk.digits, chunk.lo, chunk.hi) {
        let first_step = first_step_of_multiset(&ds, chunk.base);
        let outcome = trace(first_step, chunk.base, chunk.digits, memo);
        match outcome.kind {
            Kind::FixedPoint => fixed_points.push(outcome.canonical_id),
            Kind::Cycle => weighted_cycle_count += perm_count,
        }
        multisets_processed += 1;
        handle.report(1);
    }

    (fixed_points, weighted_cycle_count, multisets_processed)
}

/// Persistent per-thread worker for the token-passing (`--high-mem`) path.
/// One instance lives for the whole orchestrator run and is handed every
/// chunk assigned to its thread, in order.
pub struct TokenWorker {
    id: usize,
    snapshot: Memo,
    private: Memo,
}

impl TokenWorker {
    pub fn new(id: usize) -> Self {
        TokenWorker {
            id,
            snapshot: Memo::new(),
            private: Memo::new(),
        }
    }

    pub fn process_chunk(
        &mut self,
        chunk: ChunkDescriptor,
        shared: &Mutex<Memo>,
        token: &TokenRing,
        progress: &ProgressReporter,
    ) -> ChunkResult {
        let has_token = token.try_take(self.id);
        if has_token {
            self.snapshot = shared.lock().unwrap().clone();
            self.private.clear();
        }

        let (fixed_points, weighted_cycle_count, multisets_processed) = {
            let mut view = CompositeMemo {
                snapshot: &self.snapshot,
                private: &mut self.private,
            };
            run_multisets(&chunk, &mut view, progress)
        };

        let memo_delta = if has_token {
            self.private.clone()
        } else {
            Memo::new()
        };

        ChunkResult {
            fixed_points,
            weighted_cycle_count,
            multisets_processed,
            write_count: memo_delta.len() as u64,
            memo_delta,
        }
    }
}

/// Stateless chunk handler for the direct-write path: reloads a fresh copy
/// of the shared memo every chunk, processes against it, and writes new
/// discoveries straight back through `shared`, applying `sampler`'s current
/// write-rate reduction if one has engaged.
pub fn process_chunk_direct(
    chunk: ChunkDescriptor,
    shared: &Mutex<Memo>,
    sampler: &WriteRateSampler,
    progress: &ProgressReporter,
) -> ChunkResult {
    let mut local = shared.lock().unwrap().clone();
    let initial_keys: hashbrown::HashSet<u64> = local.keys().copied().collect();

    let (fixed_points, weighted_cycle_count, multisets_processed) =
        run_multisets(&chunk, &mut local, progress);

    let factor = sampler.current_factor();
    let mut memo_delta = Memo::new();
    for (&k, &v) in local.iter() {
        if initial_keys.contains(&k) {
            continue;
        }
        if !keep_sampled(k, factor) {
            continue;
        }
        memo_delta.insert(k, v);
    }

    {
        let mut guard = shared.lock().unwrap();
        crate::memo::merge_delta(&mut guard, &memo_delta);
    }

    let write_count = memo_delta.len() as u64;
    sampler.record(write_count, multisets_processed);

    ChunkResult {
        fixed_points,
        weighted_cycle_count,
        multisets_processed,
        write_count,
        memo_delta,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn chunk(base: u64, digits: u32, lo: u128, hi: u128) -> ChunkDescriptor {
        ChunkDescriptor { base, digits, lo, hi }
    }

    #[test]
    fn test_token_worker_sync_chunk_returns_delta() {
        let shared = Mutex::new(Memo::new());
        let token = TokenRing::new(1);
        let progress = ProgressReporter::new("test", 100);
        let mut worker = TokenWorker::new(0);

        let result = worker.process_chunk(chunk(10, 4, 0, 50), &shared, &token, &progress);
        assert!(result.write_count > 0);
        assert_eq!(result.memo_delta.len() as u64, result.write_count);
    }

    #[test]
    fn test_token_worker_non_sync_chunk_returns_empty_delta() {
        let shared = Mutex::new(Memo::new());
        let token = TokenRing::new(2);
        let progress = ProgressReporter::new("test", 100);
        let mut worker1 = TokenWorker::new(1);

        // worker 1 never holds the token while worker 0 does (num_workers=2)
        let result = worker1.process_chunk(chunk(10, 4, 0, 10), &shared, &token, &progress);
        assert_eq!(result.write_count, 0);
        assert!(result.memo_delta.is_empty());
    }

    #[test]
    fn test_direct_chunk_merges_into_shared() {
        let shared = Mutex::new(Memo::new());
        let sampler = WriteRateSampler::new(100);
        let progress = ProgressReporter::new("test", 100);

        let result = process_chunk_direct(chunk(10, 3, 0, 50), &shared, &sampler, &progress);
        assert!(result.multisets_processed > 0);
        assert!(!shared.lock().unwrap().is_empty());
    }
}
