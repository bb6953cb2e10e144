use std::sync::Arc;

use efc_extract::JobRecord;
use scraper::Html;
use url::Url;

use crate::frontier::{FrontierEntry, Label};
use crate::http_client::FetchedPage;
use crate::links::discover_job_links;
use crate::sink::RecordSink;
use crate::state::{CrawlState, CrawlStats};

const PAGE_PARAM: &str = "page";

/// Routes a fetched page to the LIST or DETAIL handler.
///
/// Handlers are synchronous so no parsed document lives across an await.
pub struct Dispatcher {
    state: Arc<CrawlState>,
    stats: Arc<CrawlStats>,
    sink: Arc<dyn RecordSink>,
    category: Option<String>,
}

impl Dispatcher {
    pub fn new(
        state: Arc<CrawlState>,
        stats: Arc<CrawlStats>,
        sink: Arc<dyn RecordSink>,
        category: Option<String>,
    ) -> Self {
        Self {
            state,
            stats,
            sink,
            category,
        }
    }

    /// Handles one page and returns the follow-up work it produced.
    pub fn handle(&self, entry: &FrontierEntry, page: &FetchedPage) -> Vec<FrontierEntry> {
        match entry.label {
            Label::List { page_number } => self.handle_list(entry, page_number, page),
            Label::Detail => {
                self.handle_detail(entry, page);
                Vec::new()
            }
        }
    }

    fn handle_list(
        &self,
        entry: &FrontierEntry,
        page_number: u32,
        page: &FetchedPage,
    ) -> Vec<FrontierEntry> {
        CrawlStats::incr(&self.stats.list_pages_crawled);
        let document = Html::parse_document(&page.body);
        let links = discover_job_links(
            &document,
            &page.final_url,
            self.state.seen(),
            self.state.remaining(),
        );
        drop(document);
        CrawlStats::add(&self.stats.links_discovered, links.len());
        tracing::info!(
            "LIST page {} ({}): {} new job links",
            page_number,
            entry.url,
            links.len()
        );

        let links_found = links.len();
        let mut follow_up = if self.state.budget.collect_details {
            links.into_iter().map(FrontierEntry::detail).collect()
        } else {
            self.emit_urls(links);
            Vec::new()
        };

        if self.should_paginate(page_number, links_found) {
            let next_page = page_number + 1;
            tracing::debug!("Enqueuing LIST page {}", next_page);
            follow_up.push(FrontierEntry::list(
                with_page_number(&entry.url, next_page),
                next_page,
            ));
        } else {
            tracing::info!(
                "Pagination stopped after page {} ({} of {} saved)",
                page_number,
                self.state.saved(),
                self.state.budget.results_wanted
            );
        }
        follow_up
    }

    /// Emits discovered links as URL-only records within the remaining budget.
    fn emit_urls(&self, links: Vec<Url>) {
        let granted = self.state.try_reserve(links.len());
        if granted == 0 {
            return;
        }
        let records: Vec<JobRecord> = links
            .iter()
            .take(granted)
            .map(|url| JobRecord::url_only(url.as_str(), self.category.as_deref()))
            .collect();

        match self.sink.emit(&records) {
            Ok(()) => tracing::info!(
                "Saved {} job URLs ({} total)",
                records.len(),
                self.state.saved()
            ),
            Err(e) => {
                self.state.release(granted);
                tracing::error!("Failed to save {} job URLs: {}", records.len(), e);
            }
        }
    }

    fn should_paginate(&self, page_number: u32, links_found: usize) -> bool {
        self.state.saved() < self.state.budget.results_wanted
            && page_number < self.state.budget.max_pages
            && links_found > 0
    }

    fn handle_detail(&self, entry: &FrontierEntry, page: &FetchedPage) {
        CrawlStats::incr(&self.stats.detail_pages_crawled);
        if self.state.is_exhausted() {
            tracing::debug!("Budget reached, skipping {}", entry.url);
            CrawlStats::incr(&self.stats.details_skipped);
            return;
        }

        let document = Html::parse_document(&page.body);
        let record = match efc_extract::extract_job_from_document(
            &document,
            &entry.url,
            self.category.as_deref(),
        ) {
            Ok(record) => record,
            Err(e) => {
                CrawlStats::incr(&self.stats.extraction_failures);
                tracing::warn!("Extraction failed: {}", e);
                return;
            }
        };
        drop(document);

        let missing = record.missing_fields();
        if !missing.is_empty() {
            tracing::debug!("{}: missing {}", entry.url, missing.join(", "));
        }
        self.save_detail(entry, record);
    }

    /// Claims one output slot for an extracted record; a record that loses
    /// the race for the last slot is discarded.
    fn save_detail(&self, entry: &FrontierEntry, record: JobRecord) {
        let Some(number) = self.state.try_claim_one() else {
            tracing::debug!("Budget reached, discarding {}", entry.url);
            CrawlStats::incr(&self.stats.details_skipped);
            return;
        };

        match self.sink.emit(std::slice::from_ref(&record)) {
            Ok(()) => tracing::info!(
                "Saved job #{}: {} at {}",
                number,
                record.title.as_deref().unwrap_or("(untitled)"),
                record.company.as_deref().unwrap_or("(unknown company)")
            ),
            Err(e) => {
                self.state.release(1);
                tracing::error!("Failed to save {}: {}", entry.url, e);
            }
        }
    }
}

/// `url` with its `page` query parameter set to `page_number`.
pub fn with_page_number(url: &Url, page_number: u32) -> Url {
    let mut next = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    next.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair(PAGE_PARAM, &page_number.to_string());
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunBudget;
    use crate::sink::MemorySink;
    use rstest::rstest;
    use std::sync::atomic::Ordering;

    const LIST_URL: &str = "https://www.efinancialcareers.com/jobs?q=analyst";

    const LISTING: &str = r#"<html><body>
        <a href="/jobs-NY-Analyst.id111">Analyst</a>
        <a href="/jobs-NY-Analyst.id111">Analyst</a>
        <a href="/jobs-LDN-Trader.id222">Trader</a>
        <a href="/jobs?q=analyst&page=2">Next</a>
    </body></html>"#;

    struct Fixture {
        state: Arc<CrawlState>,
        stats: Arc<CrawlStats>,
        sink: Arc<MemorySink>,
        dispatcher: Dispatcher,
    }

    fn fixture(budget: RunBudget) -> Fixture {
        let state = Arc::new(CrawlState::new(budget));
        let stats = Arc::new(CrawlStats::default());
        let sink = Arc::new(MemorySink::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&state),
            Arc::clone(&stats),
            Arc::clone(&sink) as Arc<dyn RecordSink>,
            Some("Banking".to_string()),
        );
        Fixture {
            state,
            stats,
            sink,
            dispatcher,
        }
    }

    fn page(url: &str, body: &str) -> FetchedPage {
        FetchedPage {
            final_url: Url::parse(url).unwrap(),
            body: body.to_string(),
        }
    }

    fn list_entry(page_number: u32) -> FrontierEntry {
        FrontierEntry::list(Url::parse(LIST_URL).unwrap(), page_number)
    }

    #[test]
    fn test_list_enqueues_deduplicated_details_and_next_page() {
        let fx = fixture(RunBudget {
            results_wanted: 10,
            ..Default::default()
        });
        let follow_up = fx.dispatcher.handle(&list_entry(1), &page(LIST_URL, LISTING));

        let details: Vec<&str> = follow_up
            .iter()
            .filter(|e| e.is_detail())
            .map(|e| e.url.as_str())
            .collect();
        assert_eq!(
            details,
            vec![
                "https://www.efinancialcareers.com/jobs-NY-Analyst.id111",
                "https://www.efinancialcareers.com/jobs-LDN-Trader.id222",
            ]
        );
        let next = follow_up.last().unwrap();
        assert_eq!(next.label, Label::List { page_number: 2 });
        assert_eq!(
            next.url.as_str(),
            "https://www.efinancialcareers.com/jobs?q=analyst&page=2"
        );
        assert_eq!(fx.state.saved(), 0);
    }

    #[test]
    fn test_list_stops_without_new_links() {
        let fx = fixture(RunBudget::default());
        let first = fx.dispatcher.handle(&list_entry(1), &page(LIST_URL, LISTING));
        assert_eq!(first.len(), 3);

        let repeat = fx.dispatcher.handle(&list_entry(2), &page(LIST_URL, LISTING));
        assert!(repeat.is_empty());
    }

    #[test]
    fn test_list_stops_at_max_pages() {
        let fx = fixture(RunBudget {
            max_pages: 1,
            ..Default::default()
        });
        let follow_up = fx.dispatcher.handle(&list_entry(1), &page(LIST_URL, LISTING));
        assert_eq!(follow_up.len(), 2);
        assert!(follow_up.iter().all(FrontierEntry::is_detail));
    }

    #[test]
    fn test_list_details_capped_by_budget() {
        let fx = fixture(RunBudget {
            results_wanted: 1,
            ..Default::default()
        });
        let follow_up = fx.dispatcher.handle(&list_entry(1), &page(LIST_URL, LISTING));
        assert_eq!(follow_up.iter().filter(|e| e.is_detail()).count(), 1);
    }

    #[test]
    fn test_list_without_details_emits_urls() {
        let fx = fixture(RunBudget {
            results_wanted: 1,
            collect_details: false,
            ..Default::default()
        });
        let follow_up = fx.dispatcher.handle(&list_entry(1), &page(LIST_URL, LISTING));

        assert!(follow_up.is_empty());
        let records = fx.sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_id.as_deref(), Some("111"));
        assert_eq!(records[0].category.as_deref(), Some("Banking"));
        assert_eq!(records[0].title, None);
        assert_eq!(fx.state.saved(), 1);
    }

    #[test]
    fn test_detail_emits_record() {
        let fx = fixture(RunBudget::default());
        let url = "https://www.efinancialcareers.com/jobs-UK-London-Analyst.id9";
        let body = r#"<html><head><title>Credit Analyst | eFinancialCareers</title></head>
            <body><h1>Credit Analyst</h1><p>Barclays London, United Kingdom</p></body></html>"#;

        let follow_up = fx
            .dispatcher
            .handle(&FrontierEntry::detail(Url::parse(url).unwrap()), &page(url, body));

        assert!(follow_up.is_empty());
        let records = fx.sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_id.as_deref(), Some("9"));
        assert_eq!(records[0].title.as_deref(), Some("Credit Analyst"));
        assert_eq!(records[0].url, url);
        assert_eq!(fx.state.saved(), 1);
    }

    #[test]
    fn test_detail_discarded_when_budget_reached() {
        let fx = fixture(RunBudget {
            results_wanted: 1,
            ..Default::default()
        });
        let url = "https://www.efinancialcareers.com/jobs-UK-Analyst.id1";
        let body = "<html><body><h1>Analyst</h1></body></html>";
        let entry = FrontierEntry::detail(Url::parse(url).unwrap());

        fx.dispatcher.handle(&entry, &page(url, body));
        fx.dispatcher.handle(&entry, &page(url, body));

        assert_eq!(fx.sink.records().len(), 1);
        assert_eq!(fx.state.saved(), 1);
    }

    #[test]
    fn test_extracted_detail_discarded_after_losing_last_slot() {
        let fx = fixture(RunBudget {
            results_wanted: 1,
            ..Default::default()
        });
        let url = "https://www.efinancialcareers.com/jobs-UK-Analyst.id2";
        let record = JobRecord {
            title: Some("Analyst".to_string()),
            url: url.to_string(),
            ..Default::default()
        };
        assert_eq!(fx.state.try_claim_one(), Some(1));

        fx.dispatcher
            .save_detail(&FrontierEntry::detail(Url::parse(url).unwrap()), record);

        assert!(fx.sink.records().is_empty());
        assert_eq!(fx.state.saved(), 1);
        assert_eq!(fx.stats.details_skipped.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_detail_empty_page_is_skipped() {
        let fx = fixture(RunBudget::default());
        let url = "https://www.efinancialcareers.com/jobs-UK-Analyst.id1";
        fx.dispatcher.handle(
            &FrontierEntry::detail(Url::parse(url).unwrap()),
            &page(url, "<html><body>   </body></html>"),
        );
        assert!(fx.sink.records().is_empty());
        assert_eq!(fx.state.saved(), 0);
    }

    #[rstest]
    #[case("https://www.efinancialcareers.com/jobs?q=analyst", 2, "https://www.efinancialcareers.com/jobs?q=analyst&page=2")]
    #[case("https://www.efinancialcareers.com/jobs?page=3&q=a", 4, "https://www.efinancialcareers.com/jobs?q=a&page=4")]
    #[case("https://www.efinancialcareers.com/jobs", 2, "https://www.efinancialcareers.com/jobs?page=2")]
    fn test_with_page_number(#[case] url: &str, #[case] page_number: u32, #[case] expected: &str) {
        let url = Url::parse(url).unwrap();
        assert_eq!(with_page_number(&url, page_number).as_str(), expected);
    }
}
