use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::config::{CrawlSettings, RunBudget};
use crate::dispatcher::Dispatcher;
use crate::frontier::{Frontier, FrontierEntry, Outcome};
use crate::http_client::{Fetcher, HeaderRotation};
use crate::politeness::{Politeness, RateShaper};
use crate::sink::RecordSink;
use crate::state::{CrawlResult, CrawlState, CrawlStats};

/// Two-stage LIST → DETAIL crawl over a shared frontier.
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn RecordSink>,
    budget: RunBudget,
    settings: CrawlSettings,
    category: Option<String>,
}

impl Crawler {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn RecordSink>,
        budget: RunBudget,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            fetcher,
            sink,
            budget,
            settings,
            category: None,
        }
    }

    /// Category label copied into every emitted record.
    pub fn with_category(mut self, category: Option<&str>) -> Self {
        self.category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToString::to_string);
        self
    }

    /// Crawls from the given listing URLs until the frontier drains.
    pub async fn run(&self, seeds: Vec<Url>) -> CrawlResult {
        let start_time = Instant::now();
        let stats = Arc::new(CrawlStats::default());
        let state = Arc::new(CrawlState::new(self.budget));
        let frontier = Arc::new(Frontier::new(self.settings.max_retries, Arc::clone(&stats)));
        let rate_shaper = RateShaper::new(self.settings.requests_per_minute);
        let max_concurrency = self.settings.max_concurrency.max(1);

        tracing::info!(
            "Crawler run initiated. Seeds: {}. Results wanted: {}. Max pages: {}. Collect details: {}. Concurrency: {}.{}",
            seeds.len(),
            if self.budget.results_wanted == usize::MAX {
                "unlimited".to_string()
            } else {
                self.budget.results_wanted.to_string()
            },
            self.budget.max_pages,
            self.budget.collect_details,
            max_concurrency,
            if rate_shaper.is_limited() {
                " Rate limited."
            } else {
                ""
            }
        );

        let worker = Arc::new(CrawlWorker {
            fetcher: Arc::clone(&self.fetcher),
            frontier: Arc::clone(&frontier),
            state: Arc::clone(&state),
            stats: Arc::clone(&stats),
            dispatcher: Dispatcher::new(
                Arc::clone(&state),
                Arc::clone(&stats),
                Arc::clone(&self.sink),
                self.category.clone(),
            ),
            politeness: Politeness::from_settings(&self.settings),
            rate_shaper,
            headers: HeaderRotation,
        });

        for seed in seeds {
            frontier.enqueue(FrontierEntry::list(seed, 1));
        }

        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let mut in_flight_tasks = JoinSet::new();

        loop {
            while let Some(entry) = frontier.next() {
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                let worker = Arc::clone(&worker);
                in_flight_tasks.spawn(async move {
                    let _permit = permit;
                    worker.process(entry).await;
                });
            }

            match in_flight_tasks.join_next().await {
                Some(Ok(())) => {}
                Some(Err(e)) => tracing::error!("Crawl task failed: {}", e),
                None => break,
            }
        }

        CrawlResult {
            start_time: Some(start_time),
            end_time: Some(Instant::now()),
            ..CrawlResult::from_stats(&stats, state.saved())
        }
    }
}

struct CrawlWorker {
    fetcher: Arc<dyn Fetcher>,
    frontier: Arc<Frontier>,
    state: Arc<CrawlState>,
    stats: Arc<CrawlStats>,
    dispatcher: Dispatcher,
    politeness: Politeness,
    rate_shaper: RateShaper,
    headers: HeaderRotation,
}

impl CrawlWorker {
    async fn process(&self, entry: FrontierEntry) {
        if entry.is_detail() && self.state.is_exhausted() {
            tracing::debug!("Budget reached, not fetching {}", entry.url);
            CrawlStats::incr(&self.stats.details_skipped);
            return;
        }

        let delay = self.politeness.delay_for(&entry);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.rate_shaper.wait_for_permit().await;

        tracing::debug!("Fetching {:?} {}", entry.label, entry.url);
        match self
            .fetcher
            .fetch(&entry.url, &self.headers.next_headers())
            .await
        {
            Ok(page) => {
                for follow_up in self.dispatcher.handle(&entry, &page) {
                    self.frontier.enqueue(follow_up);
                }
                self.frontier.report_result(&entry, Outcome::Success);
            }
            Err(e) => {
                self.frontier.report_result(&entry, Outcome::Failed(e));
            }
        }
    }
}
