use crate::core::{
    errors::ExchangeError,
    types::{
        AccountSnapshot, CancelAllResponse, CancelRequest, FeeRequest, FiatWithdrawalRequest,
        FundingRecord, MarketSegment, ModifyRequest, OrderBook, OrderRecord, OrderRequest,
        OrdersRequest, PublicTrade, SubmitResponse, Symbol, Ticker, WithdrawalRequest,
    },
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

#[async_trait]
pub trait MarketDataSource {
    /// Fetch the ticker batch, publish every enabled pair and return `pair`
    async fn refresh_ticker(
        &self,
        pair: &Symbol,
        segment: MarketSegment,
    ) -> Result<Ticker, ExchangeError>;

    /// Cached ticker, refreshing once on a miss
    async fn get_ticker(&self, pair: &Symbol, segment: MarketSegment)
        -> Result<Ticker, ExchangeError>;

    async fn refresh_order_book(
        &self,
        pair: &Symbol,
        segment: MarketSegment,
    ) -> Result<OrderBook, ExchangeError>;

    /// Cached order book, refreshing once on a miss
    async fn get_order_book(
        &self,
        pair: &Symbol,
        segment: MarketSegment,
    ) -> Result<OrderBook, ExchangeError>;

    /// Pairs the exchange currently lists
    async fn fetch_tradable_pairs(&self) -> Result<Vec<Symbol>, ExchangeError>;

    /// Public trade history since the exchange opened
    async fn get_exchange_history(&self, pair: &Symbol) -> Result<Vec<PublicTrade>, ExchangeError>;
}

#[async_trait]
pub trait OrderPlacer {
    async fn submit_order(&self, order: OrderRequest) -> Result<SubmitResponse, ExchangeError>;

    async fn modify_order(&self, request: ModifyRequest) -> Result<String, ExchangeError>;

    async fn cancel_order(&self, request: CancelRequest) -> Result<(), ExchangeError>;

    /// Cancel every open order, optionally restricted to one pair
    async fn cancel_all_orders(
        &self,
        pair_filter: Option<&Symbol>,
    ) -> Result<CancelAllResponse, ExchangeError>;

    async fn get_order_info(&self, order_id: &str) -> Result<OrderRecord, ExchangeError>;

    async fn get_active_orders(
        &self,
        filter: &OrdersRequest,
    ) -> Result<Vec<OrderRecord>, ExchangeError>;

    async fn get_order_history(
        &self,
        filter: &OrdersRequest,
    ) -> Result<Vec<OrderRecord>, ExchangeError>;

    /// Estimated fee, in quote currency, for the described transaction
    async fn get_fee_by_type(&self, request: &FeeRequest) -> Result<Decimal, ExchangeError>;
}

#[async_trait]
pub trait AccountInfo {
    async fn refresh_account(&self) -> Result<AccountSnapshot, ExchangeError>;

    /// Cached account snapshot, refreshing once on a miss
    async fn get_account(&self) -> Result<AccountSnapshot, ExchangeError>;

    async fn get_deposit_address(&self, currency: &str) -> Result<String, ExchangeError>;

    /// Returns the exchange's reference for the withdrawal
    async fn withdraw_crypto(&self, request: WithdrawalRequest) -> Result<String, ExchangeError>;

    async fn withdraw_fiat(&self, request: FiatWithdrawalRequest) -> Result<String, ExchangeError>;

    async fn withdraw_fiat_international(
        &self,
        request: FiatWithdrawalRequest,
    ) -> Result<String, ExchangeError>;

    async fn get_funding_history(&self) -> Result<Vec<FundingRecord>, ExchangeError>;
}

#[async_trait]
pub trait ExchangeConnector: MarketDataSource + OrderPlacer + AccountInfo {}

/// Authenticated real-time channel as seen by the adapter.
///
/// Payloads come back as raw JSON; decoding them is the adapter's job.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    /// Whether the channel is connected and signed in right now
    fn is_usable(&self) -> bool;

    /// One page of open orders for `market` (empty string for every market)
    async fn query_orders(&self, market: &str, offset: u32, limit: u32)
        -> Result<Value, ExchangeError>;

    /// Balances, restricted to `currencies` unless empty
    async fn balances(&self, currencies: &[String]) -> Result<Value, ExchangeError>;
}

/// No channel configured: never usable.
#[async_trait]
impl RealtimeChannel for () {
    fn is_usable(&self) -> bool {
        false
    }

    async fn query_orders(
        &self,
        _market: &str,
        _offset: u32,
        _limit: u32,
    ) -> Result<Value, ExchangeError> {
        Err(ExchangeError::NotSupported(
            "no real-time channel configured".to_string(),
        ))
    }

    async fn balances(&self, _currencies: &[String]) -> Result<Value, ExchangeError> {
        Err(ExchangeError::NotSupported(
            "no real-time channel configured".to_string(),
        ))
    }
}
