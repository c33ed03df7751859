//! Collaborator feed interfaces
//!
//! Every external data provider sits behind an async trait so the
//! pipeline can be driven by mock feeds in tests. The wire types mirror
//! the provider JSON shapes; everything downstream works with the
//! domain types built from them.

pub mod coingecko;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug)]
pub enum FeedError {
    /// Non-success HTTP status from the provider
    Status(u16),
    /// Transport or decode failure
    Transport(String),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Status(code) => write!(f, "feed returned HTTP {}", code),
            FeedError::Transport(msg) => write!(f, "feed transport error: {}", msg),
        }
    }
}

impl std::error::Error for FeedError {}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Transport(err.to_string())
    }
}

/// One entry of the full asset catalog listing
#[derive(Debug, Clone, Deserialize)]
pub struct AssetListing {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// One row of the batched markets response
///
/// `current_price` and `market_cap` can be null for dead or unpriced
/// assets; such rows never survive the eligibility filter. Platform
/// addresses can be empty strings, treated as absent.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketRow {
    pub id: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub platforms: BTreeMap<String, Option<String>>,
}

/// Bulk catalog of all known assets (id, symbol, name), single fetch
#[async_trait]
pub trait AssetListingFeed {
    async fn list_assets(&self) -> Result<Vec<AssetListing>, FeedError>;
}

/// Batched market snapshots for a set of canonical asset ids,
/// quoted in USD
#[async_trait]
pub trait MarketDataFeed {
    async fn fetch_markets(&self, ids: &[String]) -> Result<Vec<MarketRow>, FeedError>;
}

/// Point-in-time price lookup for the forward report columns
#[async_trait]
pub trait PriceHistory {
    /// Price of the asset nearest to `at`, if the provider has a sample
    async fn price_at(&self, asset_id: &str, at: DateTime<Utc>)
        -> Result<Option<f64>, FeedError>;
}

/// Null history provider - forward columns stay on the at-post fallback
pub struct NoHistory;

#[async_trait]
impl PriceHistory for NoHistory {
    async fn price_at(
        &self,
        _asset_id: &str,
        _at: DateTime<Utc>,
    ) -> Result<Option<f64>, FeedError> {
        Ok(None)
    }
}
