// token.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The round-robin sync token. Replaces the Python source's
//! `Manager.Value('i', 0)` + `Manager.Lock()` pair with a single mutex: the
//! holder check and the hand-off to the next worker happen under the same
//! critical section, so two workers can never both observe themselves as
//! the holder.

use std::sync::Mutex;

pub struct TokenRing {
    holder: Mutex<usize>,
    num_workers: usize,
}

impl TokenRing {
    pub fn new(num_workers: usize) -> Self {
        TokenRing {
            holder: Mutex::new(0),
            num_workers,
        }
    }

    /// If `worker_id` currently holds the token, atomically hands it to
    /// `(worker_id + 1) % num_workers` and returns `true`. Otherwise leaves
    /// the holder untouched and returns `false`.
    pub fn try_take(&self, worker_id: usize) -> bool {
        let mut holder = self.holder.lock().unwrap();
        if *holder == worker_id {
            *holder = (worker_id + 1) % self.num_workers;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_only_current_holder_takes_the_token() {
        let ring = TokenRing::new(3);
        assert!(!ring.try_take(1));
        assert!(!ring.try_take(2));
        assert!(ring.try_take(0));
    }

    #[test]
    fn test_token_advances_round_robin() {
        let ring = TokenRing::new(3);
        assert!(ring.try_take(0));
        assert!(ring.try_take(1));
        assert!(ring.try_take(2));
        assert!(ring.try_take(0));
    }

    #[test]
    fn test_single_worker_always_holds_token() {
        let ring = TokenRing::new(1);
        assert!(ring.try_take(0));
        assert!(ring.try_take(0));
    }
}
