//! Analysis orchestration - one influencer, one window, one report
//!
//! Owns the request-scoped control flow: clamp the window, collect
//! posts, assemble rows, write the CSV artifact. The asset catalog
//! (registry + compiled match rules) is built once at startup and
//! shared read-only across requests.

use crate::feeds::{AssetListingFeed, FeedError, PriceHistory};
use crate::market::MarketDataResolver;
use crate::mentions::MentionMatcher;
use crate::posts::{CollectError, PostCollector};
use crate::registry::AssetRegistry;
use crate::report::{self, csv_writer};
use crate::windows::AnalysisWindow;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Registry and compiled matcher, always rebuilt and swapped as a unit
/// so the rules can never drift from the catalog they were derived from
pub struct Catalog {
    pub registry: AssetRegistry,
    pub matcher: MentionMatcher,
}

#[derive(Debug)]
pub enum CatalogError {
    Feed(FeedError),
    Compile(regex::Error),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Feed(e) => write!(f, "asset listing fetch failed: {}", e),
            CatalogError::Compile(e) => write!(f, "match rule compilation failed: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {}

impl Catalog {
    pub async fn build(
        feed: &(dyn AssetListingFeed + Send + Sync),
    ) -> Result<Self, CatalogError> {
        let registry = AssetRegistry::build(feed).await.map_err(CatalogError::Feed)?;
        let matcher = MentionMatcher::compile(&registry).map_err(CatalogError::Compile)?;
        Ok(Self { registry, matcher })
    }
}

/// Shared, atomically swappable catalog snapshot. Readers clone the
/// inner `Arc` and keep their snapshot for the whole request even if a
/// refresh swaps in a newer one mid-flight.
pub struct CatalogHandle {
    inner: RwLock<Arc<Catalog>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn load(&self) -> Arc<Catalog> {
        self.inner.read().unwrap().clone()
    }

    pub fn swap(&self, catalog: Catalog) {
        *self.inner.write().unwrap() = Arc::new(catalog);
    }

    /// Rebuild from the listing feed and swap the result in. In-flight
    /// requests keep their old snapshot; a failed rebuild leaves the
    /// current catalog untouched.
    pub async fn rebuild(
        &self,
        feed: &(dyn AssetListingFeed + Send + Sync),
    ) -> Result<(), CatalogError> {
        let catalog = Catalog::build(feed).await?;
        log::info!(
            "🔄 Catalog refreshed: {} assets, {} match rules",
            catalog.registry.len(),
            catalog.matcher.rule_count()
        );
        self.swap(catalog);
        Ok(())
    }
}

#[derive(Debug)]
pub enum AnalysisError {
    /// Handle could not be resolved - fatal, surfaced verbatim
    AccountResolution(String),
    /// Non-rate-limit fetch failure - fatal, partial data discarded
    PostFetch(String),
    /// Rate limiting persisted through every cooldown attempt
    RateLimitExhausted,
    /// Valid terminal outcome: nothing eligible to report
    NoData,
    /// Report artifact could not be written
    Sink(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::AccountResolution(msg) => write!(f, "Error fetching user: {}", msg),
            AnalysisError::PostFetch(msg) => write!(f, "Error fetching posts: {}", msg),
            AnalysisError::RateLimitExhausted => {
                write!(f, "Post feed rate limit persisted through all cooldown attempts")
            }
            AnalysisError::NoData => write!(f, "No data found."),
            AnalysisError::Sink(msg) => write!(f, "Error writing report: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<CollectError> for AnalysisError {
    fn from(err: CollectError) -> Self {
        match err {
            CollectError::AccountResolution(msg) => AnalysisError::AccountResolution(msg),
            CollectError::PostFetch(msg) => AnalysisError::PostFetch(msg),
            CollectError::RateLimitExhausted => AnalysisError::RateLimitExhausted,
        }
    }
}

pub struct Analyzer {
    catalog: Arc<CatalogHandle>,
    collector: PostCollector,
    resolver: MarketDataResolver,
    history: Arc<dyn PriceHistory + Send + Sync>,
    output_dir: PathBuf,
}

impl Analyzer {
    pub fn new(
        catalog: Arc<CatalogHandle>,
        collector: PostCollector,
        resolver: MarketDataResolver,
        history: Arc<dyn PriceHistory + Send + Sync>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            catalog,
            collector,
            resolver,
            history,
            output_dir,
        }
    }

    /// Run one analysis request. Returns the path of the generated
    /// report, or the first fatal condition hit along the way.
    pub async fn analyze(
        &self,
        handle: &str,
        requested_days: i64,
    ) -> Result<PathBuf, AnalysisError> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(AnalysisError::AccountResolution(
                "empty account handle".to_string(),
            ));
        }

        let window = AnalysisWindow::clamped(requested_days);
        let now = Utc::now();
        log::info!("🔍 Analyzing @{} over {} day(s)", handle, window.days());

        let catalog = self.catalog.load();

        let posts = self.collector.collect(handle, window, now).await?;
        log::info!("   {} mature post(s) collected", posts.len());

        let rows = report::assemble(
            handle,
            window,
            &posts,
            &catalog.registry,
            &catalog.matcher,
            &self.resolver,
            self.history.as_ref(),
        )
        .await
        .map_err(|_| AnalysisError::NoData)?;
        log::info!("   {} report row(s) assembled", rows.len());

        csv_writer::write_report(&self.output_dir, handle, window, &rows)
            .map_err(|e| AnalysisError::Sink(e.to_string()))
    }
}
