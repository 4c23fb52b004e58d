// memo.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The per-task memo: `n -> (kind, canonical_id)`. A flat hash map suffices
//! since a memo never outlives one (base, digits) task and never crosses
//! tasks (orbits in different moduli are incomparable).

use hashbrown::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    FixedPoint,
    Cycle,
}

pub type Entry = (Kind, u64);
pub type Memo = HashMap<u64, Entry>;

/// A memo as seen by one trace: cheap reads, writes that go wherever the
/// caller decides (a plain map for the serial path, a private delta for a
/// token-holding worker).
pub trait MemoView {
    fn get(&self, n: u64) -> Option<Entry>;
    fn put(&mut self, n: u64, entry: Entry);
}

impl MemoView for Memo {
    fn get(&self, n: u64) -> Option<Entry> {
        self.get(&n).copied()
    }

    fn put(&mut self, n: u64, entry: Entry) {
        self.insert(n, entry);
    }
}

/// Composite view used by a token-passing worker: reads check the private
/// delta first (freshest), falling back to the read-only shared snapshot;
/// writes only ever land in the private delta. This is what keeps the
/// snapshot read-only between token syncs.
pub struct CompositeMemo<'a> {
    pub snapshot: &'a Memo,
    pub private: &'a mut Memo,
}

impl<'a> MemoView for CompositeMemo<'a> {
    fn get(&self, n: u64) -> Option<Entry> {
        self.private
            .get(&n)
            .copied()
            .or_else(|| self.snapshot.get(&n).copied())
    }

    fn put(&mut self, n: u64, entry: Entry) {
        self.private.insert(n, entry);
    }
}

/// Folds one `(key, incoming)` pair into `shared` under the collision
/// policy: missing keys are inserted outright; competing cycle entries keep
/// the smaller canonical ID; anything else keeps the existing entry
/// (fixed-point entries are unique by `n` so there is nothing to reconcile).
///
/// Applying the same `(key, incoming)` twice is a no-op the second time,
/// which is what makes delta merging idempotent.
pub fn merge_entry(shared: &mut Memo, key: u64, incoming: Entry) {
    match shared.get(&key).copied() {
        None => {
            shared.insert(key, incoming);
        }
        Some((Kind::Cycle, existing_id)) => {
            if let (Kind::Cycle, incoming_id) = incoming {
                if incoming_id < existing_id {
                    shared.insert(key, (Kind::Cycle, incoming_id));
                }
            }
        }
        Some((Kind::FixedPoint, _)) => {}
    }
}

/// Folds every entry of `delta` into `shared`.
pub fn merge_delta(shared: &mut Memo, delta: &Memo) {
    for (&k, &v) in delta.iter() {
        merge_entry(shared, k, v);
    }
}
