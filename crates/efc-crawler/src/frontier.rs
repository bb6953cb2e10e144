use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use url::Url;

use crate::error::FetchError;
use crate::state::CrawlStats;

/// Page classification, decided when the entry is enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    List { page_number: u32 },
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub label: Label,
    pub retry_count: u32,
}

impl FrontierEntry {
    pub fn list(url: Url, page_number: u32) -> Self {
        Self {
            url,
            label: Label::List { page_number },
            retry_count: 0,
        }
    }

    pub fn detail(url: Url) -> Self {
        Self {
            url,
            label: Label::Detail,
            retry_count: 0,
        }
    }

    fn retry(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }

    pub fn is_detail(&self) -> bool {
        self.label == Label::Detail
    }
}

#[derive(Debug)]
pub enum Outcome {
    Success,
    Failed(FetchError),
}

/// FIFO work queue shared by all crawl workers.
#[derive(Debug)]
pub struct Frontier {
    queue: Mutex<VecDeque<FrontierEntry>>,
    max_retries: u32,
    stats: Arc<CrawlStats>,
}

impl Frontier {
    pub fn new(max_retries: u32, stats: Arc<CrawlStats>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            max_retries,
            stats,
        }
    }

    /// Push and pop never leave the queue half-updated, so poisoning is ignored.
    fn queue(&self) -> MutexGuard<'_, VecDeque<FrontierEntry>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, entry: FrontierEntry) {
        self.queue().push_back(entry);
    }

    pub fn next(&self) -> Option<FrontierEntry> {
        self.queue().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-enqueues transient failures until the retry limit is reached.
    ///
    /// Returns `true` when the entry was scheduled again.
    pub fn report_result(&self, entry: &FrontierEntry, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Success => false,
            Outcome::Failed(error) if error.is_transient() && entry.retry_count < self.max_retries => {
                tracing::warn!(
                    "{} (attempt {}/{}), retrying",
                    error,
                    entry.retry_count + 1,
                    self.max_retries + 1
                );
                CrawlStats::incr(&self.stats.retries);
                self.enqueue(entry.retry());
                true
            }
            Outcome::Failed(error) => {
                tracing::warn!("Giving up on {}: {}", entry.url, error);
                CrawlStats::incr(&self.stats.pages_failed);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    fn url(path: &str) -> Url {
        Url::parse("https://www.efinancialcareers.com").unwrap().join(path).unwrap()
    }

    fn transient(entry: &FrontierEntry) -> Outcome {
        Outcome::Failed(FetchError::Transient {
            url: entry.url.to_string(),
            reason: "timeout".to_string(),
        })
    }

    #[test]
    fn test_fifo_order() {
        let frontier = Frontier::new(3, Arc::default());
        frontier.enqueue(FrontierEntry::list(url("/jobs"), 1));
        frontier.enqueue(FrontierEntry::detail(url("/jobs-a.id1")));
        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.next().unwrap().label, Label::List { page_number: 1 });
        assert!(frontier.next().unwrap().is_detail());
        assert!(frontier.next().is_none());
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_poisoned_queue_keeps_accepting_work() {
        let frontier = Arc::new(Frontier::new(3, Arc::default()));
        frontier.enqueue(FrontierEntry::list(url("/jobs"), 1));
        let holder = Arc::clone(&frontier);
        let _ = std::thread::spawn(move || {
            let _queue = holder.queue.lock().unwrap();
            panic!("worker panicked while holding the queue");
        })
        .join();
        assert!(frontier.queue.is_poisoned());

        frontier.enqueue(FrontierEntry::detail(url("/jobs-a.id1")));
        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.next().unwrap().label, Label::List { page_number: 1 });
        assert!(frontier.next().unwrap().is_detail());
    }

    #[test]
    fn test_transient_failure_is_retried_until_limit() {
        let stats = Arc::new(CrawlStats::default());
        let frontier = Frontier::new(2, Arc::clone(&stats));
        let mut entry = FrontierEntry::detail(url("/jobs-a.id1"));

        for expected_retry in 1..=2 {
            assert!(frontier.report_result(&entry, transient(&entry)));
            entry = frontier.next().unwrap();
            assert_eq!(entry.retry_count, expected_retry);
        }

        assert!(!frontier.report_result(&entry, transient(&entry)));
        assert!(frontier.is_empty());
        assert_eq!(stats.retries.load(Ordering::Relaxed), 2);
        assert_eq!(stats.pages_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_permanent_failure_is_dropped() {
        let stats = Arc::new(CrawlStats::default());
        let frontier = Frontier::new(3, Arc::clone(&stats));
        let entry = FrontierEntry::list(url("/jobs"), 1);
        let outcome = Outcome::Failed(FetchError::Permanent {
            url: entry.url.to_string(),
            status: 404,
        });
        assert!(!frontier.report_result(&entry, outcome));
        assert!(frontier.is_empty());
        assert_eq!(stats.pages_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_success_is_not_requeued() {
        let frontier = Frontier::new(3, Arc::default());
        let entry = FrontierEntry::detail(url("/jobs-a.id1"));
        assert!(!frontier.report_result(&entry, Outcome::Success));
        assert!(frontier.is_empty());
    }
}
