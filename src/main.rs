use gatex::core::config::{ConfigError, ExchangeConfig, DEFAULT_ENV_PREFIX};
use gatex::core::traits::MarketDataSource;
use gatex::core::types::{MarketSegment, Symbol};
use gatex::GateBuilder;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "env-file")]
fn load_config() -> Result<ExchangeConfig, ConfigError> {
    ExchangeConfig::from_env_file(DEFAULT_ENV_PREFIX)
}

#[cfg(not(feature = "env-file"))]
fn load_config() -> Result<ExchangeConfig, ConfigError> {
    ExchangeConfig::from_env(DEFAULT_ENV_PREFIX)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Public endpoints need no credentials; fall back to a read-only config
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "no credentials found, using public endpoints only");
            ExchangeConfig::read_only()
        }
    };

    let pair = Symbol::new("ETH", "BTC")?;
    let gate = GateBuilder::new()
        .with_config(config)
        .with_enabled_pairs(vec![pair.clone()])
        .build_rest_only()?;

    println!("Fetching {} ticker...", pair);
    let ticker = gate.get_ticker(&pair, MarketSegment::Spot).await?;
    println!(
        "last {} high {} low {} volume {}",
        ticker.last, ticker.high, ticker.low, ticker.volume
    );

    let book = gate.get_order_book(&pair, MarketSegment::Spot).await?;
    println!("Order book: {} bids, {} asks", book.bids.len(), book.asks.len());
    if let (Some(bid), Some(ask)) = (book.bids.first(), book.asks.first()) {
        println!("Best bid {} @ {}, best ask {} @ {}", bid.amount, bid.price, ask.amount, ask.price);
    }

    Ok(())
}
