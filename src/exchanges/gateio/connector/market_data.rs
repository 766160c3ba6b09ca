use crate::core::cache::SharedCaches;
use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::MarketDataSource;
use crate::core::types::{MarketSegment, OrderBook, PublicTrade, Symbol, Ticker};
use crate::exchanges::gateio::conversions::{format_pair, map_order_book, map_tickers, parse_pair};
use crate::exchanges::gateio::rest::GateRest;
use crate::exchanges::gateio::EXCHANGE_NAME;
use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

/// Gate.io market data: tickers, order books and listed pairs
pub struct MarketData<R: RestClient> {
    rest: GateRest<R>,
    caches: SharedCaches,
    enabled_pairs: Vec<Symbol>,
}

impl<R: RestClient + Clone> MarketData<R> {
    pub fn new(rest: &GateRest<R>, caches: SharedCaches, enabled_pairs: Vec<Symbol>) -> Self {
        Self {
            rest: rest.clone(),
            caches,
            enabled_pairs,
        }
    }
}

impl<R: RestClient> MarketData<R> {
    pub fn enabled_pairs(&self) -> &[Symbol] {
        &self.enabled_pairs
    }

    fn cached_ticker(&self, pair: &Symbol, segment: MarketSegment) -> Option<Ticker> {
        self.caches.tickers.get(EXCHANGE_NAME, pair, segment)
    }

    fn cached_order_book(&self, pair: &Symbol, segment: MarketSegment) -> Option<OrderBook> {
        self.caches.order_books.get(EXCHANGE_NAME, pair, segment)
    }
}

#[async_trait]
impl<R: RestClient> MarketDataSource for MarketData<R> {
    #[instrument(skip(self, pair), fields(exchange = EXCHANGE_NAME, pair = %pair))]
    async fn refresh_ticker(
        &self,
        pair: &Symbol,
        segment: MarketSegment,
    ) -> Result<Ticker, ExchangeError> {
        let raw = self.rest.tickers().await?;

        // the requested pair is refreshed even when it is not enabled
        let mut wanted = self.enabled_pairs.clone();
        if !wanted.contains(pair) {
            wanted.push(pair.clone());
        }
        map_tickers(
            EXCHANGE_NAME,
            &wanted,
            &raw,
            self.caches.tickers.as_ref(),
            Utc::now(),
        )?;

        self.cached_ticker(pair, segment).ok_or_else(|| {
            ExchangeError::NotFound(format!("{} does not list {}", EXCHANGE_NAME, pair))
        })
    }

    async fn get_ticker(
        &self,
        pair: &Symbol,
        segment: MarketSegment,
    ) -> Result<Ticker, ExchangeError> {
        match self.cached_ticker(pair, segment) {
            Some(ticker) => Ok(ticker),
            None => self.refresh_ticker(pair, segment).await,
        }
    }

    #[instrument(skip(self, pair), fields(exchange = EXCHANGE_NAME, pair = %pair))]
    async fn refresh_order_book(
        &self,
        pair: &Symbol,
        _segment: MarketSegment,
    ) -> Result<OrderBook, ExchangeError> {
        let raw = self.rest.order_book(&format_pair(pair)).await?;
        let book = map_order_book(EXCHANGE_NAME, pair, raw, Utc::now());
        self.caches.order_books.publish(book.clone())?;
        Ok(book)
    }

    async fn get_order_book(
        &self,
        pair: &Symbol,
        segment: MarketSegment,
    ) -> Result<OrderBook, ExchangeError> {
        match self.cached_order_book(pair, segment) {
            Some(book) => Ok(book),
            None => self.refresh_order_book(pair, segment).await,
        }
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    async fn fetch_tradable_pairs(&self) -> Result<Vec<Symbol>, ExchangeError> {
        self.rest
            .pairs()
            .await?
            .iter()
            .map(|raw| parse_pair(raw))
            .collect()
    }

    async fn get_exchange_history(
        &self,
        _pair: &Symbol,
    ) -> Result<Vec<PublicTrade>, ExchangeError> {
        Err(ExchangeError::NotSupported(
            "public trade history".to_string(),
        ))
    }
}
