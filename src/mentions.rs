//! Ticker mention detection
//!
//! Compiles one match rule per purely-alphabetic symbol and joins them
//! into a single `RegexSet`, so a post is scanned in one automaton pass
//! regardless of catalog size. Symbols with digits or punctuation can
//! never form an unambiguous `$ticker` pattern and are skipped.

use crate::registry::AssetRegistry;
use regex::RegexSet;
use std::collections::BTreeSet;

pub struct MentionMatcher {
    set: RegexSet,
    symbols: Vec<String>,
}

impl MentionMatcher {
    pub fn compile(registry: &AssetRegistry) -> Result<Self, regex::Error> {
        let mut symbols: Vec<String> = registry
            .symbols()
            .filter(|s| is_alphabetic_symbol(s))
            .map(String::from)
            .collect();
        symbols.sort();

        // "$btc" but not "$btc5" or "$btcx": the trailing word boundary
        // rejects any following digit or letter, so "$5000" can never
        // look like a ticker either.
        let patterns: Vec<String> = symbols
            .iter()
            .map(|symbol| format!(r"\${}\b", regex::escape(symbol)))
            .collect();

        let set = RegexSet::new(&patterns)?;
        Ok(Self { set, symbols })
    }

    /// Distinct symbols mentioned in `text`. A symbol mentioned twice
    /// counts once; matching is case-insensitive via one lowercase pass.
    pub fn find_mentions(&self, text: &str) -> BTreeSet<String> {
        let lowered = text.to_lowercase();

        self.set
            .matches(&lowered)
            .into_iter()
            .map(|idx| self.symbols[idx].clone())
            .collect()
    }

    pub fn rule_count(&self) -> usize {
        self.symbols.len()
    }
}

fn is_alphabetic_symbol(symbol: &str) -> bool {
    !symbol.is_empty() && symbol.bytes().all(|b| b.is_ascii_lowercase())
}
