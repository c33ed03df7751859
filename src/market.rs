//! Market data resolution and eligibility filtering
//!
//! Snapshots are fetched in one batched request for the union of all
//! mentioned assets. Provider failures are non-fatal here: an empty map
//! comes back and downstream joins simply skip the affected mentions.

use crate::feeds::{MarketDataFeed, MarketRow};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Inclusive market-cap band an asset must fall into to be reportable
pub const MIN_MARKET_CAP: f64 = 2_000_000.0;
pub const MAX_MARKET_CAP: f64 = 2_000_000_000.0;

pub const UNKNOWN_CONTRACT: &str = "unknown";

#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub asset_id: String,
    pub price_usd: f64,
    pub contract_address: String,
}

pub struct MarketDataResolver {
    feed: Arc<dyn MarketDataFeed + Send + Sync>,
}

impl MarketDataResolver {
    pub fn new(feed: Arc<dyn MarketDataFeed + Send + Sync>) -> Self {
        Self { feed }
    }

    /// Resolve snapshots for a set of canonical asset ids.
    ///
    /// Empty input returns an empty map without touching the network.
    /// A failed fetch also returns an empty map - not every mentioned
    /// asset has tradable market data, and a transient provider failure
    /// must not abort the whole analysis.
    pub async fn resolve(&self, ids: &[String]) -> HashMap<String, MarketSnapshot> {
        if ids.is_empty() {
            return HashMap::new();
        }

        let rows = match self.feed.fetch_markets(ids).await {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("⚠️  Market data unavailable for batch of {}: {}", ids.len(), e);
                return HashMap::new();
            }
        };

        filter_snapshots(rows)
    }
}

/// Apply the eligibility filter and extract per-asset snapshots.
/// Rows without a market cap, or with one outside the band, are dropped.
pub fn filter_snapshots(rows: Vec<MarketRow>) -> HashMap<String, MarketSnapshot> {
    let mut snapshots = HashMap::new();

    for row in rows {
        let cap = match row.market_cap {
            Some(cap) => cap,
            None => continue,
        };
        if !(MIN_MARKET_CAP..=MAX_MARKET_CAP).contains(&cap) {
            continue;
        }
        let price_usd = match row.current_price {
            Some(price) => price,
            None => continue,
        };

        let contract_address = resolve_contract_address(&row.platforms);
        snapshots.insert(
            row.id.clone(),
            MarketSnapshot {
                asset_id: row.id,
                price_usd,
                contract_address,
            },
        );
    }

    snapshots
}

/// Preference order: solana, then ethereum, then any other chain with a
/// non-empty address, then "unknown". Remaining chains are scanned in
/// alphabetical order so the pick is deterministic.
pub fn resolve_contract_address(platforms: &BTreeMap<String, Option<String>>) -> String {
    let non_empty = |chain: &str| {
        platforms
            .get(chain)
            .and_then(|addr| addr.as_deref())
            .filter(|addr| !addr.is_empty())
    };

    if let Some(addr) = non_empty("solana") {
        return addr.to_string();
    }
    if let Some(addr) = non_empty("ethereum") {
        return addr.to_string();
    }

    for addr in platforms.values() {
        if let Some(addr) = addr.as_deref().filter(|a| !a.is_empty()) {
            return addr.to_string();
        }
    }

    UNKNOWN_CONTRACT.to_string()
}
