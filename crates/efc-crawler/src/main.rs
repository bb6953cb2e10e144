use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use efc_crawler::config::{CrawlInput, CrawlSettings, LogFormat, SeedUrl};
use efc_crawler::crawler::Crawler;
use efc_crawler::http_client::ReqwestFetcher;
use efc_crawler::proxy::{APIFY_PROXY_PASSWORD_ENV, ProxyConfiguration};
use efc_crawler::sink::{JsonLinesSink, RecordSink};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "efc_crawler=info,efc_extract=info";

/// Crawls eFinancialCareers job listings and writes one JSON record per job.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct CliArgs {
    /// Path to a JSON input file (keyword, location, results_wanted, startUrls, ...).
    #[clap(short, long)]
    input: Option<PathBuf>,
    /// Optional path to a JSON Lines output file. If not provided, records are printed to stdout.
    #[clap(short, long)]
    output: Option<PathBuf>,
    /// Search keyword used to build the listing URL.
    #[clap(short, long)]
    keyword: Option<String>,
    /// Search location used to build the listing URL.
    #[clap(short, long)]
    location: Option<String>,
    /// Category label attached to every record.
    #[clap(long)]
    category: Option<String>,
    /// Maximum number of records to emit.
    #[clap(short = 'n', long)]
    results_wanted: Option<u64>,
    /// Maximum number of listing pages per seed URL.
    #[clap(long)]
    max_pages: Option<u32>,
    /// Emit job URLs only, without fetching detail pages.
    #[clap(long)]
    no_details: bool,
    /// Listing URL to start from; may be repeated.
    #[clap(long = "start-url", value_name = "URL")]
    start_urls: Vec<String>,
    /// Maximum number of in-flight requests.
    #[clap(short, long)]
    concurrency: Option<usize>,
    /// Retries for transient fetch failures.
    #[clap(long)]
    max_retries: Option<u32>,
    /// Global request cap per minute.
    #[clap(long)]
    requests_per_minute: Option<u32>,
}

impl CliArgs {
    fn crawl_input(&self) -> miette::Result<CrawlInput> {
        let mut input = match &self.input {
            Some(path) => CrawlInput::from_path(path)?,
            None => CrawlInput::default(),
        };

        if let Some(keyword) = &self.keyword {
            input.keyword = Some(keyword.clone());
        }
        if let Some(location) = &self.location {
            input.location = Some(location.clone());
        }
        if let Some(category) = &self.category {
            input.category = Some(category.clone());
        }
        if let Some(results_wanted) = self.results_wanted {
            input.results_wanted = Some(results_wanted.into());
        }
        if let Some(max_pages) = self.max_pages {
            input.max_pages = Some(max_pages.into());
        }
        if self.no_details {
            input.collect_details = Some(false);
        }
        if !self.start_urls.is_empty() {
            input.start_urls = self.start_urls.iter().cloned().map(SeedUrl::Plain).collect();
            input.start_url = None;
            input.url = None;
        }
        Ok(input)
    }

    fn crawl_settings(&self) -> CrawlSettings {
        let defaults = CrawlSettings::default();
        CrawlSettings {
            max_concurrency: self.concurrency.unwrap_or(defaults.max_concurrency).max(1),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            requests_per_minute: self.requests_per_minute.or(defaults.requests_per_minute),
            ..defaults
        }
    }
}

fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing(LogFormat::from_env());
    let args = CliArgs::parse();

    let input = args.crawl_input()?;
    let settings = args.crawl_settings();
    let budget = input.budget();
    let seeds = input.seed_urls()?;

    let proxies = ProxyConfiguration::from_value(input.proxy_configuration.as_ref())?
        .proxy_urls(env::var(APIFY_PROXY_PASSWORD_ENV).ok().as_deref())?;
    if !proxies.is_empty() {
        tracing::info!("Using {} proxy endpoint(s)", proxies.len());
    }
    let fetcher = ReqwestFetcher::new(settings.request_timeout, &proxies)?;

    let sink: Arc<dyn RecordSink> = match &args.output {
        Some(path) => {
            tracing::info!("Writing records to {}", path.display());
            Arc::new(JsonLinesSink::create(path)?)
        }
        None => Arc::new(JsonLinesSink::stdout()),
    };

    for seed in &seeds {
        tracing::info!("Initializing crawler for URL: {}", seed);
    }

    let crawler = Crawler::new(Arc::new(fetcher), sink, budget, settings)
        .with_category(input.category());
    let result = crawler.run(seeds).await;

    result.write_stats_to_stderr();
    tracing::info!("Finished. Saved {} items", result.records_saved);
    Ok(())
}
