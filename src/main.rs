pub mod analyzer;
pub mod config;
pub mod feeds;
pub mod market;
pub mod mentions;
pub mod posts;
pub mod registry;
pub mod report;
pub mod windows;

use {
    analyzer::{AnalysisError, Analyzer, Catalog, CatalogHandle},
    config::AppConfig,
    feeds::{coingecko::CoinGeckoFeed, NoHistory, PriceHistory},
    market::MarketDataResolver,
    posts::{twitter::TwitterFeed, PostCollector},
    std::{path::PathBuf, sync::Arc},
};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let (handle, days) = parse_request()?;
    let config = AppConfig::from_env()?;

    log::info!("🚀 Starting tickerflow...");
    log::info!("📊 Configuration:");
    log::info!("   Market API: {}", config.market_api_url);
    log::info!("   Post API: {}", config.post_api_url);
    log::info!("   Output dir: {}", config.output_dir);

    let coingecko = Arc::new(CoinGeckoFeed::new(&config.market_api_url)?);
    let twitter = Arc::new(TwitterFeed::new(
        &config.post_api_url,
        config.bearer_token.clone(),
        config.page_size,
    )?);

    log::info!("🌐 Building asset catalog...");
    let catalog = Catalog::build(coingecko.as_ref()).await?;
    log::info!(
        "✅ Catalog ready: {} assets, {} match rules",
        catalog.registry.len(),
        catalog.matcher.rule_count()
    );

    let history: Arc<dyn PriceHistory + Send + Sync> = if config.enable_price_history {
        coingecko.clone()
    } else {
        Arc::new(NoHistory)
    };

    let analyzer = Analyzer::new(
        Arc::new(CatalogHandle::new(catalog)),
        PostCollector::new(twitter, config.collector_config()),
        MarketDataResolver::new(coingecko),
        history,
        PathBuf::from(&config.output_dir),
    );

    match analyzer.analyze(&handle, days).await {
        Ok(path) => {
            log::info!("✅ Report ready: {}", path.display());
            println!("{}", path.display());
        }
        Err(AnalysisError::NoData) => {
            log::info!("No eligible mentions in the window");
            println!("{}", AnalysisError::NoData);
        }
        Err(e) => {
            log::error!("❌ Analysis failed: {}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Entry contract: account handle plus window length in days, from
/// argv with env fallback. The window is clamped downstream.
fn parse_request() -> Result<(String, i64), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let handle = args
        .get(1)
        .cloned()
        .or_else(|| std::env::var("INFLUENCER_HANDLE").ok())
        .ok_or("usage: tickerflow <handle> [days]")?;

    let days = match args.get(2) {
        Some(raw) => raw
            .parse()
            .map_err(|_| format!("days must be an integer, got '{}'", raw))?,
        None => std::env::var("WINDOW_DAYS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(1),
    };

    Ok((handle, days))
}
