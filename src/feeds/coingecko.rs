//! CoinGecko API integration
//!
//! One client covering all three market-side feeds:
//! - Asset listing: `GET /coins/list`
//! - Market snapshots: `GET /coins/markets?vs_currency=usd&ids={ids}`
//! - Price history: `GET /coins/{id}/market_chart/range?vs_currency=usd&from={}&to={}`
//!
//! The markets request is batched: one call for the union of all asset
//! ids mentioned in an analysis, never one call per asset.

use super::{AssetListing, AssetListingFeed, FeedError, MarketDataFeed, MarketRow, PriceHistory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Half-width of the history sampling window around a target timestamp
const HISTORY_TOLERANCE_SECS: i64 = 30 * 60;

pub struct CoinGeckoFeed {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoFeed {
    pub fn new(base_url: &str) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AssetListingFeed for CoinGeckoFeed {
    async fn list_assets(&self) -> Result<Vec<AssetListing>, FeedError> {
        let url = format!("{}/coins/list", self.base_url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketDataFeed for CoinGeckoFeed {
    async fn fetch_markets(&self, ids: &[String]) -> Result<Vec<MarketRow>, FeedError> {
        let url = format!(
            "{}/coins/markets?vs_currency=usd&ids={}",
            self.base_url,
            ids.join(",")
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

/// market_chart/range response: prices as [timestamp_ms, price] pairs
#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(i64, f64)>,
}

#[async_trait]
impl PriceHistory for CoinGeckoFeed {
    async fn price_at(
        &self,
        asset_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<f64>, FeedError> {
        let from = at.timestamp() - HISTORY_TOLERANCE_SECS;
        let to = at.timestamp() + HISTORY_TOLERANCE_SECS;
        let url = format!(
            "{}/coins/{}/market_chart/range?vs_currency=usd&from={}&to={}",
            self.base_url, asset_id, from, to
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        let chart: MarketChart = response.json().await?;
        let target_ms = at.timestamp_millis();

        // Closest sample to the target wins
        Ok(chart
            .prices
            .iter()
            .min_by_key(|(ts, _)| (ts - target_ms).abs())
            .map(|&(_, price)| price))
    }
}
