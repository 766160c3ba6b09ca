//! Shared caches for the canonical model.
//!
//! Connectors never own these: they are injected as `Arc<dyn …Store>` and may
//! be shared by many connectors and callers at once. Every implementation must
//! be safe for concurrent `publish`/`get`, and each `publish` must replace the
//! stored value atomically.

use crate::core::errors::ExchangeError;
use crate::core::types::{AccountSnapshot, MarketSegment, OrderBook, Symbol, Ticker};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

type MarketKey = (String, Symbol, MarketSegment);

fn market_key(exchange: &str, pair: &Symbol, segment: MarketSegment) -> MarketKey {
    (exchange.to_lowercase(), pair.clone(), segment)
}

pub trait TickerStore: Send + Sync {
    fn publish(&self, ticker: Ticker) -> Result<(), ExchangeError>;
    fn get(&self, exchange: &str, pair: &Symbol, segment: MarketSegment) -> Option<Ticker>;
}

pub trait OrderBookStore: Send + Sync {
    fn publish(&self, book: OrderBook) -> Result<(), ExchangeError>;
    fn get(&self, exchange: &str, pair: &Symbol, segment: MarketSegment) -> Option<OrderBook>;
}

pub trait AccountStore: Send + Sync {
    fn publish(&self, snapshot: AccountSnapshot) -> Result<(), ExchangeError>;
    fn get(&self, exchange: &str) -> Option<AccountSnapshot>;
}

#[derive(Default)]
pub struct InMemoryTickerStore {
    tickers: RwLock<HashMap<MarketKey, Ticker>>,
}

impl InMemoryTickerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tickers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TickerStore for InMemoryTickerStore {
    fn publish(&self, ticker: Ticker) -> Result<(), ExchangeError> {
        if ticker.exchange.is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "ticker has no exchange name".to_string(),
            ));
        }
        let key = market_key(&ticker.exchange, &ticker.pair, ticker.segment);
        self.tickers.write().insert(key, ticker);
        Ok(())
    }

    fn get(&self, exchange: &str, pair: &Symbol, segment: MarketSegment) -> Option<Ticker> {
        self.tickers
            .read()
            .get(&market_key(exchange, pair, segment))
            .cloned()
    }
}

#[derive(Default)]
pub struct InMemoryOrderBookStore {
    books: RwLock<HashMap<MarketKey, OrderBook>>,
}

impl InMemoryOrderBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistency checks run before a snapshot becomes visible
    fn validate(book: &OrderBook) -> Result<(), ExchangeError> {
        if book.exchange.is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "order book has no exchange name".to_string(),
            ));
        }
        let negative = book
            .bids
            .iter()
            .chain(book.asks.iter())
            .find(|level| level.price < Decimal::ZERO || level.amount < Decimal::ZERO);
        if let Some(level) = negative {
            return Err(ExchangeError::MalformedResponse(format!(
                "{} order book has negative level {} @ {}",
                book.pair, level.amount, level.price
            )));
        }
        Ok(())
    }
}

impl OrderBookStore for InMemoryOrderBookStore {
    fn publish(&self, book: OrderBook) -> Result<(), ExchangeError> {
        Self::validate(&book)?;
        let key = market_key(&book.exchange, &book.pair, book.segment);
        self.books.write().insert(key, book);
        Ok(())
    }

    fn get(&self, exchange: &str, pair: &Symbol, segment: MarketSegment) -> Option<OrderBook> {
        self.books
            .read()
            .get(&market_key(exchange, pair, segment))
            .cloned()
    }
}

#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, AccountSnapshot>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn publish(&self, snapshot: AccountSnapshot) -> Result<(), ExchangeError> {
        if snapshot.exchange.is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "account snapshot has no exchange name".to_string(),
            ));
        }
        self.accounts
            .write()
            .insert(snapshot.exchange.to_lowercase(), snapshot);
        Ok(())
    }

    fn get(&self, exchange: &str) -> Option<AccountSnapshot> {
        self.accounts.read().get(&exchange.to_lowercase()).cloned()
    }
}

/// The three caches a connector publishes into
#[derive(Clone)]
pub struct SharedCaches {
    pub tickers: Arc<dyn TickerStore>,
    pub order_books: Arc<dyn OrderBookStore>,
    pub accounts: Arc<dyn AccountStore>,
}

impl Default for SharedCaches {
    fn default() -> Self {
        Self {
            tickers: Arc::new(InMemoryTickerStore::new()),
            order_books: Arc::new(InMemoryOrderBookStore::new()),
            accounts: Arc::new(InMemoryAccountStore::new()),
        }
    }
}
