use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashSet;

use crate::config::RunBudget;

/// Job URLs already turned into DETAIL requests or records during this run.
#[derive(Debug, Default)]
pub struct SeenSet(DashSet<String>);

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the URL was not seen before.
    pub fn insert(&self, url: &str) -> bool {
        self.0.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.0.contains(url)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Shared run state: the budget, the saved counter and the seen set.
///
/// `saved` never exceeds `budget.results_wanted`; slots are reserved
/// atomically before a record is emitted.
#[derive(Debug)]
pub struct CrawlState {
    pub budget: RunBudget,
    saved: AtomicUsize,
    seen: SeenSet,
}

impl CrawlState {
    pub fn new(budget: RunBudget) -> Self {
        Self {
            budget,
            saved: AtomicUsize::new(0),
            seen: SeenSet::new(),
        }
    }

    pub fn saved(&self) -> usize {
        self.saved.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn remaining(&self) -> usize {
        self.budget.results_wanted.saturating_sub(self.saved())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Reserves up to `n` output slots and returns how many were granted.
    pub fn try_reserve(&self, n: usize) -> usize {
        let wanted = self.budget.results_wanted;
        match self
            .saved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |saved| {
                let granted = n.min(wanted.saturating_sub(saved));
                (granted > 0).then_some(saved + granted)
            }) {
            Ok(previous) => n.min(wanted.saturating_sub(previous)),
            Err(_) => 0,
        }
    }

    /// Reserves a single slot; returns the 1-based record number on success.
    pub fn try_claim_one(&self) -> Option<usize> {
        let wanted = self.budget.results_wanted;
        self.saved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |saved| {
                (saved < wanted).then_some(saved + 1)
            })
            .ok()
            .map(|previous| previous + 1)
    }

    /// Returns slots whose records could not be written.
    pub fn release(&self, n: usize) {
        let _ = self
            .saved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |saved| {
                Some(saved.saturating_sub(n))
            });
    }
}

/// Counters updated by crawl workers.
#[derive(Debug, Default)]
pub struct CrawlStats {
    pub list_pages_crawled: AtomicUsize,
    pub detail_pages_crawled: AtomicUsize,
    pub pages_failed: AtomicUsize,
    pub retries: AtomicUsize,
    pub links_discovered: AtomicUsize,
    pub details_skipped: AtomicUsize,
    pub extraction_failures: AtomicUsize,
}

impl CrawlStats {
    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CrawlResult {
    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
    pub list_pages_crawled: usize,
    pub detail_pages_crawled: usize,
    pub pages_failed: usize,
    pub retries: usize,
    pub links_discovered: usize,
    pub details_skipped: usize,
    pub extraction_failures: usize,
    pub records_saved: usize,
}

impl CrawlResult {
    pub fn from_stats(stats: &CrawlStats, records_saved: usize) -> Self {
        Self {
            list_pages_crawled: stats.list_pages_crawled.load(Ordering::Relaxed),
            detail_pages_crawled: stats.detail_pages_crawled.load(Ordering::Relaxed),
            pages_failed: stats.pages_failed.load(Ordering::Relaxed),
            retries: stats.retries.load(Ordering::Relaxed),
            links_discovered: stats.links_discovered.load(Ordering::Relaxed),
            details_skipped: stats.details_skipped.load(Ordering::Relaxed),
            extraction_failures: stats.extraction_failures.load(Ordering::Relaxed),
            records_saved,
            ..Default::default()
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            Some(end.duration_since(start))
        } else {
            None
        }
    }

    pub fn write_stats_to_stderr(&self) {
        let stderr = io::stderr();
        let mut handle = stderr.lock();

        let _ = writeln!(handle, "\n=== Crawl Statistics ===");
        let _ = writeln!(handle, "List pages crawled: {}", self.list_pages_crawled);
        let _ = writeln!(handle, "Detail pages crawled: {}", self.detail_pages_crawled);
        let _ = writeln!(handle, "Pages failed: {}", self.pages_failed);
        let _ = writeln!(handle, "Retries: {}", self.retries);
        let _ = writeln!(handle, "Job links discovered: {}", self.links_discovered);
        let _ = writeln!(handle, "Details skipped (budget reached): {}", self.details_skipped);
        let _ = writeln!(handle, "Extraction failures: {}", self.extraction_failures);
        let _ = writeln!(handle, "Records saved: {}", self.records_saved);

        if let Some(duration) = self.duration() {
            let _ = writeln!(handle, "Total duration: {:.2}s", duration.as_secs_f64());
        }
        let _ = writeln!(handle, "========================\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn state(results_wanted: usize) -> CrawlState {
        CrawlState::new(RunBudget {
            results_wanted,
            ..Default::default()
        })
    }

    #[test]
    fn test_seen_set_insert_once() {
        let seen = SeenSet::new();
        assert!(seen.insert("https://www.efinancialcareers.com/jobs-a.id1"));
        assert!(!seen.insert("https://www.efinancialcareers.com/jobs-a.id1"));
        assert!(seen.contains("https://www.efinancialcareers.com/jobs-a.id1"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_try_reserve_is_capped() {
        let state = state(5);
        assert_eq!(state.try_reserve(3), 3);
        assert_eq!(state.try_reserve(3), 2);
        assert_eq!(state.try_reserve(1), 0);
        assert!(state.is_exhausted());
        state.release(2);
        assert_eq!(state.remaining(), 2);
    }

    #[test]
    fn test_try_claim_one_numbers_records() {
        let state = state(2);
        assert_eq!(state.try_claim_one(), Some(1));
        assert_eq!(state.try_claim_one(), Some(2));
        assert_eq!(state.try_claim_one(), None);
        assert_eq!(state.saved(), 2);
    }

    #[test]
    fn test_concurrent_claims_never_exceed_budget() {
        let state = Arc::new(state(10));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || (0..50).filter(|_| state.try_claim_one().is_some()).count())
            })
            .collect();
        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 10);
        assert_eq!(state.saved(), 10);
    }

    #[test]
    fn test_unlimited_budget() {
        let state = state(usize::MAX);
        assert_eq!(state.try_reserve(1000), 1000);
        assert!(!state.is_exhausted());
    }

    #[test]
    fn test_crawl_result_duration_some() {
        let start = Instant::now();
        let end = start + Duration::from_secs(5);
        let result = CrawlResult {
            start_time: Some(start),
            end_time: Some(end),
            ..Default::default()
        };
        assert_eq!(result.duration(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_crawl_result_duration_none() {
        let result = CrawlResult::default();
        assert_eq!(result.duration(), None);

        let result = CrawlResult {
            start_time: Some(Instant::now()),
            ..Default::default()
        };
        assert_eq!(result.duration(), None);
    }

    #[test]
    fn test_crawl_result_from_stats() {
        let stats = CrawlStats::default();
        CrawlStats::incr(&stats.list_pages_crawled);
        CrawlStats::add(&stats.links_discovered, 4);
        let result = CrawlResult::from_stats(&stats, 3);
        assert_eq!(result.list_pages_crawled, 1);
        assert_eq!(result.links_discovered, 4);
        assert_eq!(result.records_saved, 3);
    }
}
