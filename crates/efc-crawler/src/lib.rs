//! Two-stage crawler for eFinancialCareers job listings.
//!
//! Listing (LIST) pages are scanned for job posting links, which are either
//! fetched as DETAIL pages and run through [`efc_extract`], or emitted
//! directly as URL-only records.
//!
//! # Features
//!
//! - Bounded concurrent crawling over a shared FIFO frontier
//! - Per-request politeness delay with jitter and linear retry backoff
//! - Optional global request rate cap
//! - Global deduplication of job URLs and a hard cap on emitted records
//! - Pagination that stops on an empty page, the page cap or the record cap
//! - Browser-like header rotation and round-robin proxies
//! - JSON Lines output and crawl statistics
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use efc_crawler::config::{CrawlInput, CrawlSettings};
//! use efc_crawler::crawler::Crawler;
//! use efc_crawler::http_client::ReqwestFetcher;
//! use efc_crawler::sink::JsonLinesSink;
//!
//! #[tokio::main]
//! async fn main() -> miette::Result<()> {
//!     let input = CrawlInput::from_path("input.json")?;
//!     let settings = CrawlSettings::default();
//!     let fetcher = ReqwestFetcher::new(settings.request_timeout, &[])?;
//!     let crawler = Crawler::new(
//!         Arc::new(fetcher),
//!         Arc::new(JsonLinesSink::stdout()),
//!         input.budget(),
//!         settings,
//!     )
//!     .with_category(input.category());
//!     let result = crawler.run(input.seed_urls()?).await;
//!     println!("Saved {} records", result.records_saved);
//!     Ok(())
//! }
//! ```
//!
//! # Crawling Behavior
//!
//! The crawler:
//! - Starts from one LIST entry per seed URL
//! - Enqueues each job URL for DETAIL processing at most once per run
//! - Never emits more than `results_wanted` records, even under concurrency
//! - Retries transient fetch failures and drops permanent ones
//! - Treats per-page failures as non-fatal
//!
pub mod config;
pub mod crawler;
pub mod dispatcher;
pub mod error;
pub mod frontier;
pub mod http_client;
pub mod links;
pub mod politeness;
pub mod proxy;
pub mod sink;
pub mod state;
