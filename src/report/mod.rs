//! Report assembly - joins posts, their mentions, and market snapshots
//! into time-aligned rows

pub mod csv_writer;

use crate::feeds::PriceHistory;
use crate::market::{MarketDataResolver, MarketSnapshot};
use crate::mentions::MentionMatcher;
use crate::posts::Post;
use crate::registry::AssetRegistry;
use crate::windows::AnalysisWindow;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// One row of the generated report
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub influencer: String,
    pub token: String,
    pub contract_address: String,
    pub post_time: DateTime<Utc>,
    pub price_at_post: f64,
    pub forward_prices: [f64; 3],
    pub percent_change: f64,
}

/// Zero eligible rows came out of the batch. A valid terminal outcome,
/// not a failure - the caller renders it distinctly.
#[derive(Debug, PartialEq, Eq)]
pub struct NoData;

impl std::fmt::Display for NoData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No data found.")
    }
}

impl std::error::Error for NoData {}

/// Join the batch into report rows.
///
/// Mentions are scanned once per post; the mention union is resolved to
/// market snapshots in a single downstream call, so an asset mentioned
/// by five posts costs one market request, not five. A mention without
/// a surviving snapshot is skipped, never an error.
pub async fn assemble(
    handle: &str,
    window: AnalysisWindow,
    posts: &[Post],
    registry: &AssetRegistry,
    matcher: &MentionMatcher,
    resolver: &MarketDataResolver,
    history: &(dyn PriceHistory + Send + Sync),
) -> Result<Vec<ReportRow>, NoData> {
    let mut post_mentions: Vec<BTreeSet<String>> = Vec::with_capacity(posts.len());
    let mut batch_symbols: BTreeSet<String> = BTreeSet::new();

    for post in posts {
        let mentions = matcher.find_mentions(&post.text);
        batch_symbols.extend(mentions.iter().cloned());
        post_mentions.push(mentions);
    }

    let ids: Vec<String> = batch_symbols
        .iter()
        .filter_map(|symbol| registry.get(symbol))
        .map(|asset| asset.id.clone())
        .collect();

    let snapshots = resolver.resolve(&ids).await;
    log::debug!(
        "Resolved {} snapshot(s) for {} mentioned symbol(s)",
        snapshots.len(),
        batch_symbols.len()
    );

    let mut rows = Vec::new();
    for (post, mentions) in posts.iter().zip(&post_mentions) {
        for symbol in mentions {
            let asset = match registry.get(symbol) {
                Some(asset) => asset,
                None => continue,
            };
            let snapshot = match snapshots.get(&asset.id) {
                Some(snapshot) => snapshot,
                None => continue, // no eligible market data for this mention
            };

            rows.push(build_row(handle, window, post, symbol, snapshot, history).await);
        }
    }

    if rows.is_empty() {
        return Err(NoData);
    }
    Ok(rows)
}

/// Forward columns come from the price-history provider when it has a
/// sample near the target time, else they fall back to the at-post
/// price (leaving the percent change at zero).
async fn build_row(
    handle: &str,
    window: AnalysisWindow,
    post: &Post,
    symbol: &str,
    snapshot: &MarketSnapshot,
    history: &(dyn PriceHistory + Send + Sync),
) -> ReportRow {
    let offsets = window.kind().forward_offsets();
    let mut forward_prices = [snapshot.price_usd; 3];

    for (slot, offset) in forward_prices.iter_mut().zip(offsets) {
        match history.price_at(&snapshot.asset_id, post.created_at + offset).await {
            Ok(Some(price)) => *slot = price,
            Ok(None) => {}
            Err(e) => {
                log::warn!("⚠️  Price history lookup failed for {}: {}", snapshot.asset_id, e);
            }
        }
    }

    let percent_change = if snapshot.price_usd != 0.0 {
        (forward_prices[2] - snapshot.price_usd) / snapshot.price_usd * 100.0
    } else {
        0.0
    };

    ReportRow {
        influencer: format!("@{}", handle),
        token: format!("${}", symbol.to_uppercase()),
        contract_address: snapshot.contract_address.clone(),
        post_time: post.created_at,
        price_at_post: snapshot.price_usd,
        forward_prices,
        percent_change,
    }
}
