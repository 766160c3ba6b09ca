use crate::core::cache::SharedCaches;
use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::{
    AccountInfo, ExchangeConnector, MarketDataSource, OrderPlacer, RealtimeChannel,
};
use crate::core::types::{
    AccountSnapshot, CancelAllResponse, CancelRequest, FeeRequest, FiatWithdrawalRequest,
    FundingRecord, MarketSegment, ModifyRequest, OrderBook, OrderRecord, OrderRequest,
    OrdersRequest, PublicTrade, SubmitResponse, Symbol, Ticker, WithdrawalRequest,
};
use crate::exchanges::gateio::rest::GateRest;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

pub mod account;
pub mod market_data;
pub mod trading;

pub use account::Account;
pub use market_data::MarketData;
pub use trading::Trading;

/// Gate.io connector that composes all sub-trait implementations.
///
/// `C` is the authenticated real-time channel; with the default `()` every
/// call goes through REST.
pub struct GateConnector<R: RestClient, C = ()> {
    pub market: MarketData<R>,
    pub trading: Trading<R, C>,
    pub account: Account<R, C>,
    channel: Arc<C>,
}

impl<R: RestClient + Clone, C: RealtimeChannel> GateConnector<R, C> {
    /// Create a connector that prefers `channel` whenever it is usable
    pub fn new_with_channel(
        rest: GateRest<R>,
        channel: Arc<C>,
        caches: SharedCaches,
        enabled_pairs: Vec<Symbol>,
    ) -> Self {
        Self {
            market: MarketData::new(&rest, caches.clone(), enabled_pairs),
            trading: Trading::new(&rest, Arc::clone(&channel)),
            account: Account::new(&rest, Arc::clone(&channel), caches.accounts),
            channel,
        }
    }

    /// The real-time channel shared by trading and account calls
    pub fn channel(&self) -> &Arc<C> {
        &self.channel
    }

    /// Refresh the account and report whether the credentials were accepted
    pub async fn validate_credentials(&self) -> Result<(), ExchangeError> {
        self.account.refresh_account().await.map(|_| ())
    }
}

impl<R: RestClient + Clone> GateConnector<R, ()> {
    /// Create a REST-only connector
    pub fn new_without_channel(
        rest: GateRest<R>,
        caches: SharedCaches,
        enabled_pairs: Vec<Symbol>,
    ) -> Self {
        Self::new_with_channel(rest, Arc::new(()), caches, enabled_pairs)
    }
}

#[async_trait]
impl<R: RestClient, C: RealtimeChannel> MarketDataSource for GateConnector<R, C> {
    async fn refresh_ticker(
        &self,
        pair: &Symbol,
        segment: MarketSegment,
    ) -> Result<Ticker, ExchangeError> {
        self.market.refresh_ticker(pair, segment).await
    }

    async fn get_ticker(
        &self,
        pair: &Symbol,
        segment: MarketSegment,
    ) -> Result<Ticker, ExchangeError> {
        self.market.get_ticker(pair, segment).await
    }

    async fn refresh_order_book(
        &self,
        pair: &Symbol,
        segment: MarketSegment,
    ) -> Result<OrderBook, ExchangeError> {
        self.market.refresh_order_book(pair, segment).await
    }

    async fn get_order_book(
        &self,
        pair: &Symbol,
        segment: MarketSegment,
    ) -> Result<OrderBook, ExchangeError> {
        self.market.get_order_book(pair, segment).await
    }

    async fn fetch_tradable_pairs(&self) -> Result<Vec<Symbol>, ExchangeError> {
        self.market.fetch_tradable_pairs().await
    }

    async fn get_exchange_history(&self, pair: &Symbol) -> Result<Vec<PublicTrade>, ExchangeError> {
        self.market.get_exchange_history(pair).await
    }
}

#[async_trait]
impl<R: RestClient, C: RealtimeChannel> OrderPlacer for GateConnector<R, C> {
    async fn submit_order(&self, order: OrderRequest) -> Result<SubmitResponse, ExchangeError> {
        self.trading.submit_order(order).await
    }

    async fn modify_order(&self, request: ModifyRequest) -> Result<String, ExchangeError> {
        self.trading.modify_order(request).await
    }

    async fn cancel_order(&self, request: CancelRequest) -> Result<(), ExchangeError> {
        self.trading.cancel_order(request).await
    }

    async fn cancel_all_orders(
        &self,
        pair_filter: Option<&Symbol>,
    ) -> Result<CancelAllResponse, ExchangeError> {
        self.trading.cancel_all_orders(pair_filter).await
    }

    async fn get_order_info(&self, order_id: &str) -> Result<OrderRecord, ExchangeError> {
        self.trading.get_order_info(order_id).await
    }

    async fn get_active_orders(
        &self,
        filter: &OrdersRequest,
    ) -> Result<Vec<OrderRecord>, ExchangeError> {
        self.trading.get_active_orders(filter).await
    }

    async fn get_order_history(
        &self,
        filter: &OrdersRequest,
    ) -> Result<Vec<OrderRecord>, ExchangeError> {
        self.trading.get_order_history(filter).await
    }

    async fn get_fee_by_type(&self, request: &FeeRequest) -> Result<Decimal, ExchangeError> {
        self.trading.get_fee_by_type(request).await
    }
}

#[async_trait]
impl<R: RestClient, C: RealtimeChannel> AccountInfo for GateConnector<R, C> {
    async fn refresh_account(&self) -> Result<AccountSnapshot, ExchangeError> {
        self.account.refresh_account().await
    }

    async fn get_account(&self) -> Result<AccountSnapshot, ExchangeError> {
        self.account.get_account().await
    }

    async fn get_deposit_address(&self, currency: &str) -> Result<String, ExchangeError> {
        self.account.get_deposit_address(currency).await
    }

    async fn withdraw_crypto(&self, request: WithdrawalRequest) -> Result<String, ExchangeError> {
        self.account.withdraw_crypto(request).await
    }

    async fn withdraw_fiat(&self, request: FiatWithdrawalRequest) -> Result<String, ExchangeError> {
        self.account.withdraw_fiat(request).await
    }

    async fn withdraw_fiat_international(
        &self,
        request: FiatWithdrawalRequest,
    ) -> Result<String, ExchangeError> {
        self.account.withdraw_fiat_international(request).await
    }

    async fn get_funding_history(&self) -> Result<Vec<FundingRecord>, ExchangeError> {
        self.account.get_funding_history().await
    }
}

impl<R: RestClient, C: RealtimeChannel> ExchangeConnector for GateConnector<R, C> {}
