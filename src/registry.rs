//! Asset registry - ticker symbol to canonical asset mapping
//!
//! Built once at startup from the asset listing feed and treated as
//! immutable afterwards. Feed order decides which asset owns an
//! ambiguous ticker: the first occurrence of a symbol wins and later
//! duplicates are ignored.

use crate::feeds::{AssetListing, AssetListingFeed, FeedError};
use std::collections::HashMap;

/// A known asset, keyed by its lowercase ticker symbol
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: HashMap<String, Asset>,
}

impl AssetRegistry {
    /// Fetch the full catalog and build the registry. A feed failure
    /// here is a hard startup failure - nothing can run without the
    /// registry.
    pub async fn build(
        feed: &(dyn AssetListingFeed + Send + Sync),
    ) -> Result<Self, FeedError> {
        let listings = feed.list_assets().await?;
        Ok(Self::from_listings(listings))
    }

    pub fn from_listings(listings: Vec<AssetListing>) -> Self {
        let mut assets = HashMap::new();

        for listing in listings {
            let symbol = listing.symbol.to_lowercase();
            if assets.contains_key(&symbol) {
                continue; // first occurrence wins
            }
            assets.insert(
                symbol.clone(),
                Asset {
                    id: listing.id,
                    symbol,
                    name: listing.name.to_lowercase(),
                },
            );
        }

        Self { assets }
    }

    pub fn get(&self, symbol: &str) -> Option<&Asset> {
        self.assets.get(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, symbol: &str, name: &str) -> AssetListing {
        AssetListing {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_first_occurrence_wins_on_duplicate_symbol() {
        let registry = AssetRegistry::from_listings(vec![
            listing("bitcoin", "btc", "Bitcoin"),
            listing("batcoin", "btc", "BatCoin"),
        ]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("btc").unwrap().id, "bitcoin");
    }

    #[test]
    fn test_symbol_and_name_lowercased() {
        let registry =
            AssetRegistry::from_listings(vec![listing("ethereum", "ETH", "Ethereum")]);

        let asset = registry.get("eth").unwrap();
        assert_eq!(asset.symbol, "eth");
        assert_eq!(asset.name, "ethereum");
        assert!(registry.get("ETH").is_none());
    }

    #[test]
    fn test_empty_listing() {
        let registry = AssetRegistry::from_listings(vec![]);
        assert!(registry.is_empty());
        assert!(registry.get("btc").is_none());
    }
}
