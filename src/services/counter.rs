// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Process-wide count of searches currently in flight.
//!
//! Acquiring returns a guard that decrements on drop, so the count
//! unwinds on every exit path, including errors and cancellation.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct InflightCounter {
    count: AtomicUsize,
}

impl InflightCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and hand out a scoped guard. The guard remembers the
    /// pre-increment value for the admission check.
    pub fn acquire(&self) -> InflightGuard<'_> {
        let observed = self.count.fetch_add(1, Ordering::SeqCst);
        InflightGuard {
            counter: self,
            observed,
        }
    }

    pub fn current(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct InflightGuard<'a> {
    counter: &'a InflightCounter,
    observed: usize,
}

impl InflightGuard<'_> {
    /// Number of searches that were already in flight when this guard
    /// was acquired.
    pub fn observed(&self) -> usize {
        self.observed
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.counter.count.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observed_is_pre_increment() {
        let counter = InflightCounter::new();
        let first = counter.acquire();
        assert_eq!(first.observed(), 0);
        let second = counter.acquire();
        assert_eq!(second.observed(), 1);
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn test_guard_decrements_on_drop() {
        let counter = InflightCounter::new();
        {
            let _guard = counter.acquire();
            assert_eq!(counter.current(), 1);
        }
        assert_eq!(counter.current(), 0);
    }

    #[test]
    fn test_guard_decrements_on_early_return() {
        let counter = InflightCounter::new();
        fn rejected(counter: &InflightCounter) -> Result<(), ()> {
            let _guard = counter.acquire();
            Err(())
        }
        let _ = rejected(&counter);
        assert_eq!(counter.current(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_acquire_release_balances() {
        use std::sync::Arc;

        let counter = Arc::new(InflightCounter::new());
        let mut handles = Vec::new();
        for _ in 0..64 {
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let _guard = counter.acquire();
                tokio::task::yield_now().await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(counter.current(), 0);
    }
}
