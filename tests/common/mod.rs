#![allow(dead_code)]

use async_trait::async_trait;
use gatex::core::cache::SharedCaches;
use gatex::core::errors::ExchangeError;
use gatex::core::kernel::RestClient;
use gatex::core::traits::RealtimeChannel;
use gatex::core::types::Symbol;
use gatex::exchanges::gateio::{GateConnector, GateRest};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Test configuration utilities
pub struct TestConfig;

impl TestConfig {
    /// Check if live API tests should run (hits the real exchange)
    pub fn should_run_live_tests() -> bool {
        env::var("RUN_LIVE_TESTS").unwrap_or_default() == "true"
    }
}

#[derive(Default)]
struct MockState {
    /// Keyed by endpoint, or `endpoint?currencyPair` for a per-pair answer
    responses: HashMap<String, Value>,
    calls: Vec<(String, Vec<(String, String)>)>,
}

/// Request executor answering from canned JSON and recording every call.
///
/// Clones share state, so one mock can back both the market and trade hosts.
#[derive(Clone, Default)]
pub struct MockRest {
    state: Arc<Mutex<MockState>>,
}

impl MockRest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, endpoint: &str, body: Value) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(endpoint.to_string(), body);
        self
    }

    pub fn respond_for_pair(&self, endpoint: &str, pair: &str, body: Value) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(format!("{}?{}", endpoint, pair), body);
        self
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(e, _)| e == endpoint)
            .count()
    }

    /// Parameters of every call made to `endpoint`, in order
    pub fn params_of(&self, endpoint: &str) -> Vec<Vec<(String, String)>> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    fn answer(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, ExchangeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((
            endpoint.to_string(),
            params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        ));

        let pair = params
            .iter()
            .find(|(k, _)| *k == "currencyPair")
            .map(|(_, v)| *v);
        pair.and_then(|p| state.responses.get(&format!("{}?{}", endpoint, p)))
            .or_else(|| state.responses.get(endpoint))
            .cloned()
            .ok_or_else(|| ExchangeError::NetworkError(format!("no canned response for {}", endpoint)))
    }
}

#[async_trait]
impl RestClient for MockRest {
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        _authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        self.answer(endpoint, query_params)
    }

    async fn post_form(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
        _authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        self.answer(endpoint, form)
    }
}

/// Real-time channel serving scripted `order.query` pages
#[derive(Default)]
pub struct MockChannel {
    usable: AtomicBool,
    pages: Mutex<VecDeque<Result<Value, String>>>,
    balances: Mutex<Option<Value>>,
    queries: Mutex<Vec<(String, u32, u32)>>,
    balance_calls: Mutex<usize>,
}

impl MockChannel {
    pub fn new(usable: bool) -> Self {
        let channel = Self::default();
        channel.set_usable(usable);
        channel
    }

    pub fn set_usable(&self, usable: bool) {
        self.usable.store(usable, Ordering::SeqCst);
    }

    pub fn push_page(&self, records: Vec<Value>) {
        self.pages.lock().unwrap().push_back(Ok(json!({
            "limit": 100,
            "offset": 0,
            "total": 0,
            "records": records
        })));
    }

    pub fn push_failure(&self, message: &str) {
        self.pages
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn set_balances(&self, body: Value) {
        *self.balances.lock().unwrap() = Some(body);
    }

    /// `(market, offset, limit)` of every page requested
    pub fn queries(&self) -> Vec<(String, u32, u32)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn balance_calls(&self) -> usize {
        *self.balance_calls.lock().unwrap()
    }
}

#[async_trait]
impl RealtimeChannel for MockChannel {
    fn is_usable(&self) -> bool {
        self.usable.load(Ordering::SeqCst)
    }

    async fn query_orders(
        &self,
        market: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Value, ExchangeError> {
        self.queries
            .lock()
            .unwrap()
            .push((market.to_string(), offset, limit));
        match self.pages.lock().unwrap().pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(ExchangeError::NetworkError(message)),
            None => Err(ExchangeError::NetworkError("no page scripted".to_string())),
        }
    }

    async fn balances(&self, _currencies: &[String]) -> Result<Value, ExchangeError> {
        *self.balance_calls.lock().unwrap() += 1;
        self.balances
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ExchangeError::NetworkError("no balances scripted".to_string()))
    }
}

pub fn eth_btc() -> Symbol {
    Symbol::new("ETH", "BTC").unwrap()
}

pub fn rest_connector(rest: &MockRest, pairs: Vec<Symbol>) -> GateConnector<MockRest, ()> {
    GateConnector::new_without_channel(
        GateRest::new(rest.clone(), rest.clone()),
        SharedCaches::default(),
        pairs,
    )
}

pub fn channel_connector(
    rest: &MockRest,
    channel: Arc<MockChannel>,
    pairs: Vec<Symbol>,
) -> GateConnector<MockRest, MockChannel> {
    GateConnector::new_with_channel(
        GateRest::new(rest.clone(), rest.clone()),
        channel,
        SharedCaches::default(),
        pairs,
    )
}

/// One `order.query` record
pub fn ws_order(id: u64, market: &str, side: i64, amount: &str, filled: &str) -> Value {
    json!({
        "id": id,
        "market": market,
        "user": 1000001,
        "ctime": 1523697343.410214,
        "mtime": 1523697343.410214,
        "type": side,
        "orderType": 1,
        "price": "5.2",
        "amount": amount,
        "filledAmount": filled,
        "dealFee": "0"
    })
}

/// One REST open order
pub fn rest_order(number: &str, pair: &str, side: &str, status: &str, timestamp: i64) -> Value {
    json!({
        "orderNumber": number,
        "type": side,
        "rate": "0.05",
        "initialAmount": "2",
        "filledAmount": "0.5",
        "currencyPair": pair,
        "timestamp": timestamp.to_string(),
        "status": status
    })
}
