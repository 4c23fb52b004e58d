// tracer.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The orbit tracer: follows `T` from a starting value until it lands on a
//! fixed point or closes a cycle, consulting and updating a memo view as it
//! goes. Never suspends, never performs I/O — the hot loop of the whole
//! engine.

use hashbrown::HashSet;

use crate::arithmetic::kaprekar_step;
use crate::memo::{Kind, MemoView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceOutcome {
    pub kind: Kind,
    pub canonical_id: u64,
    /// Distinct values visited this trace, in iteration order, before the
    /// terminating value. Not needed by callers outside tests, but kept to
    /// match the documented tracer signature.
    pub path: Vec<u64>,
}

/// Runs the Kaprekar routine from `start` in `(base, digits)` until it
/// reaches a fixed point or cycle, short-circuiting on anything `memo`
/// already knows about `current`.
pub fn trace(start: u64, base: u64, digits: u32, memo: &mut impl MemoView) -> TraceOutcome {
    let mut current = start;
    let mut path: Vec<u64> = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();

    loop {
        if let Some((kind, id)) = memo.get(current) {
            let (kind, canonical_id) = match kind {
                Kind::Cycle => {
                    let path_min = path.iter().copied().chain(std::iter::once(current)).min().unwrap();
                    let canonical = id.min(path_min);
                    if canonical < id {
                        for &p in path.iter().chain(std::iter::once(&current)) {
                            memo.put(p, (Kind::Cycle, canonical));
                        }
                    }
                    (Kind::Cycle, canonical)
                }
                Kind::FixedPoint => (Kind::FixedPoint, id),
            };
            // Covers the edge case where `path` is empty (start itself was
            // already memoized) — otherwise `start` is already one of the
            // path/current entries just rewritten above.
            memo.put(start, (kind, canonical_id));
            return TraceOutcome { kind, canonical_id, path };
        }

        let next = kaprekar_step(current, base, digits)
            .expect("n out of [0, base^digits) violates totality of T");

        if next == current {
            for &p in &path {
                memo.put(p, (Kind::FixedPoint, current));
            }
            memo.put(start, (Kind::FixedPoint, current));
            memo.put(current, (Kind::FixedPoint, current));
            return TraceOutcome {
                kind: Kind::FixedPoint,
                canonical_id: current,
                path,
            };
        }

        if seen.contains(&next) {
            let cycle_start_idx = path.iter().position(|&x| x == next).unwrap();
            let cycle_id = path[cycle_start_idx..]
                .iter()
                .copied()
                .chain(std::iter::once(next))
                .min()
                .unwrap();
            for &p in &path {
                memo.put(p, (Kind::Cycle, cycle_id));
            }
            memo.put(start, (Kind::Cycle, cycle_id));
            return TraceOutcome {
                kind: Kind::Cycle,
                canonical_id: cycle_id,
                path,
            };
        }

        seen.insert(current);
        path.push(current);
        current = next;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memo::Memo;

    #[test]
    fn test_zero_is_always_a_fixed_point() {
        let mut memo = Memo::new();
        let outcome = trace(0, 10, 4, &mut memo);
        assert_eq!(outcome.kind, Kind::FixedPoint);
        assert_eq!(outcome.canonical_id, 0);
        assert!(outcome.path.is_empty());
    }

    #[test]
    fn test_reaches_kaprekars_constant() {
        let mut memo = Memo::new();
        let outcome = trace(3524, 10, 4, &mut memo);
        assert_eq!(outcome.kind, Kind::FixedPoint);
        assert_eq!(outcome.canonical_id, 6174);
        assert!(outcome.path.len() <= 7);
    }

    #[test]
    fn test_two_digit_base_ten_cycle_canonical_id() {
        let mut memo = Memo::new();
        let outcome = trace(10, 10, 2, &mut memo);
        assert_eq!(outcome.kind, Kind::Cycle);
        assert_eq!(outcome.canonical_id, 9);
    }

    #[test]
    fn test_memo_short_circuits_repeat_trace() {
        let mut memo = Memo::new();
        let first = trace(3524, 10, 4, &mut memo);
        let second = trace(3524, 10, 4, &mut memo);
        assert_eq!(first.kind, second.kind);
        assert_eq!(first.canonical_id, second.canonical_id);
        // second trace hits the memo immediately, no path accumulated
        assert!(second.path.is_empty());
    }

    #[test]
    fn test_cached_cycle_id_rewritten_to_smaller_minimum() {
        let mut memo = Memo::new();
        memo.insert(81, (Kind::Cycle, 81));
        let outcome = trace(63, 10, 2, &mut memo);
        assert_eq!(outcome.kind, Kind::Cycle);
        assert_eq!(outcome.canonical_id, 9);
        assert_eq!(memo.get(&81), Some(&(Kind::Cycle, 9)));
    }
}
