// sampler.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Adaptive write-rate control for the direct-write (non-token) parallel
//! path. Sampling new memo entries by hash is a documented accuracy/perf
//! trade — it can permanently drop a cycle discovery — so it only ever
//! engages after measuring a genuinely dense-write workload, never by
//! default.

use std::sync::atomic::{AtomicU64, Ordering};

const SAMPLE_FACTOR: u64 = 10;
const WRITE_RATE_THRESHOLD: f64 = 0.20;

pub struct WriteRateSampler {
    sample_window: u64,
    chunks_seen: AtomicU64,
    writes_sampled: AtomicU64,
    multisets_sampled: AtomicU64,
    factor: AtomicU64,
    decided: std::sync::atomic::AtomicBool,
}

impl WriteRateSampler {
    /// `total_chunks` determines the sample window: the first
    /// `min(10, max(1, total_chunks / 10))` chunks are measured before a
    /// decision is made.
    pub fn new(total_chunks: u64) -> Self {
        let window = (total_chunks / 10).max(1).min(10);
        WriteRateSampler {
            sample_window: window,
            chunks_seen: AtomicU64::new(0),
            writes_sampled: AtomicU64::new(0),
            multisets_sampled: AtomicU64::new(0),
            factor: AtomicU64::new(1),
            decided: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// The sampling factor a chunk should apply to its own new discoveries:
    /// `1` means keep everything, `k > 1` means keep roughly 1-in-k.
    pub fn current_factor(&self) -> u64 {
        self.factor.load(Ordering::Acquire)
    }

    /// Feeds one completed chunk's write/multiset counts into the rolling
    /// sample. Once `sample_window` chunks have reported, decides whether to
    /// engage 1-in-10 sampling for the remainder of the task and freezes
    /// that decision.
    pub fn record(&self, writes: u64, multisets: u64) {
        if self.decided.load(Ordering::Acquire) {
            return;
        }
        let seen = self.chunks_seen.fetch_add(1, Ordering::AcqRel) + 1;
        self.writes_sampled.fetch_add(writes, Ordering::AcqRel);
        self.multisets_sampled.fetch_add(multisets, Ordering::AcqRel);

        if seen >= self.sample_window {
            if self
                .decided
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let w = self.writes_sampled.load(Ordering::Acquire) as f64;
                let m = self.multisets_sampled.load(Ordering::Acquire) as f64;
                let rate = if m > 0.0 { w / m } else { 0.0 };
                if rate > WRITE_RATE_THRESHOLD {
                    self.factor.store(SAMPLE_FACTOR, Ordering::Release);
                }
            }
        }
    }
}

/// Deterministic keep/drop decision for one candidate key under sampling
/// factor `k` (`k == 1` always keeps).
pub fn keep_sampled(key: u64, factor: u64) -> bool {
    if factor <= 1 {
        return true;
    }
    // FNV-1a style mix so the decision doesn't correlate with the
    // sequential structure of Kaprekar orbit values.
    let mut h = key ^ 0xcbf29ce484222325;
    h = h.wrapping_mul(0x100000001b3);
    h % factor == 0
}
