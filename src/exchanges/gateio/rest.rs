use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::types::OrderSide;
use crate::exchanges::gateio::types::{
    result_flag, GateBalances, GateDepositAddress, GateMarketInfo, GateOpenOrders, GateOrderBook,
    GateSubmitResponse, GateTickers, GateTrades, GateWithdrawResponse,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

const TICKERS: &str = "/api2/1/tickers";
const ORDER_BOOK: &str = "/api2/1/orderBook";
const PAIRS: &str = "/api2/1/pairs";
const MARKET_INFO: &str = "/api2/1/marketinfo";
const BALANCES: &str = "/api2/1/private/balances";
const BUY: &str = "/api2/1/private/buy";
const SELL: &str = "/api2/1/private/sell";
const CANCEL_ORDER: &str = "/api2/1/private/cancelOrder";
const CANCEL_ALL_ORDERS: &str = "/api2/1/private/cancelAllOrders";
const OPEN_ORDERS: &str = "/api2/1/private/openOrders";
const TRADE_HISTORY: &str = "/api2/1/private/tradeHistory";
const DEPOSIT_ADDRESS: &str = "/api2/1/private/depositAddress";
const WITHDRAW: &str = "/api2/1/private/withdraw";

/// Gate.io v2 REST endpoints.
///
/// Public market data and private trading live on different hosts, so the
/// wrapper holds one executor for each.
#[derive(Debug, Clone)]
pub struct GateRest<R: RestClient> {
    market: R,
    trade: R,
    authenticated: bool,
}

impl<R: RestClient> GateRest<R> {
    /// Wrap the two executors; the trade executor is assumed to sign
    pub fn new(market: R, trade: R) -> Self {
        Self {
            market,
            trade,
            authenticated: true,
        }
    }

    /// Record whether the trade executor holds credentials
    pub fn with_authentication(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    /// Whether private endpoints can be reached
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Fail on `result: false`, mapping its `code`/`message` to `ApiError`
    fn check_result(value: Value) -> Result<Value, ExchangeError> {
        let Some(flag) = value.get("result") else {
            return Ok(value);
        };
        match result_flag(flag) {
            Some(true) => Ok(value),
            Some(false) => {
                let code = value
                    .get("code")
                    .and_then(|c| {
                        c.as_i64()
                            .or_else(|| c.as_str().and_then(|s| s.trim().parse().ok()))
                    })
                    .and_then(|c| i32::try_from(c).ok())
                    .unwrap_or(-1);
                let message = value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("request rejected")
                    .to_string();
                Err(ExchangeError::ApiError { code, message })
            }
            None => Err(ExchangeError::MalformedResponse(format!(
                "unexpected result flag {}",
                flag
            ))),
        }
    }

    fn decode<T: DeserializeOwned>(context: &str, value: Value) -> Result<T, ExchangeError> {
        serde_json::from_value(Self::check_result(value)?)
            .map_err(|e| ExchangeError::malformed(context, e))
    }

    async fn private<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        let value = self.trade.post_form(endpoint, form, true).await?;
        Self::decode(endpoint, value)
    }

    #[instrument(skip(self))]
    pub async fn tickers(&self) -> Result<GateTickers, ExchangeError> {
        let value = self.market.get(TICKERS, &[], false).await?;
        Self::decode("tickers", value)
    }

    #[instrument(skip(self))]
    pub async fn order_book(&self, pair: &str) -> Result<GateOrderBook, ExchangeError> {
        let endpoint = format!("{}/{}", ORDER_BOOK, pair);
        let value = self.market.get(&endpoint, &[], false).await?;
        Self::decode("order book", value)
    }

    #[instrument(skip(self))]
    pub async fn pairs(&self) -> Result<Vec<String>, ExchangeError> {
        let value = self.market.get(PAIRS, &[], false).await?;
        Self::decode("pairs", value)
    }

    #[instrument(skip(self))]
    pub async fn market_info(&self) -> Result<GateMarketInfo, ExchangeError> {
        let value = self.market.get(MARKET_INFO, &[], false).await?;
        Self::decode("market info", value)
    }

    #[instrument(skip(self))]
    pub async fn balances(&self) -> Result<GateBalances, ExchangeError> {
        self.private(BALANCES, &[]).await
    }

    #[instrument(skip(self))]
    pub async fn place_order(
        &self,
        side: OrderSide,
        pair: &str,
        rate: &str,
        amount: &str,
    ) -> Result<GateSubmitResponse, ExchangeError> {
        let endpoint = match side {
            OrderSide::Buy => BUY,
            OrderSide::Sell => SELL,
        };
        self.private(
            endpoint,
            &[("currencyPair", pair), ("rate", rate), ("amount", amount)],
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_number: &str, pair: &str) -> Result<(), ExchangeError> {
        self.private::<Value>(
            CANCEL_ORDER,
            &[("orderNumber", order_number), ("currencyPair", pair)],
        )
        .await
        .map(|_| ())
    }

    /// Cancel every order on `pair` (`type=-1`: both sides)
    #[instrument(skip(self))]
    pub async fn cancel_all_orders(&self, pair: &str) -> Result<(), ExchangeError> {
        self.private::<Value>(CANCEL_ALL_ORDERS, &[("type", "-1"), ("currencyPair", pair)])
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    pub async fn open_orders(&self, pair: Option<&str>) -> Result<GateOpenOrders, ExchangeError> {
        match pair {
            Some(pair) => self.private(OPEN_ORDERS, &[("currencyPair", pair)]).await,
            None => self.private(OPEN_ORDERS, &[]).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn trade_history(&self, pair: &str) -> Result<GateTrades, ExchangeError> {
        self.private(TRADE_HISTORY, &[("currencyPair", pair)]).await
    }

    #[instrument(skip(self))]
    pub async fn deposit_address(&self, currency: &str) -> Result<GateDepositAddress, ExchangeError> {
        self.private(DEPOSIT_ADDRESS, &[("currency", currency)]).await
    }

    #[instrument(skip(self))]
    pub async fn withdraw(
        &self,
        currency: &str,
        amount: &str,
        address: &str,
    ) -> Result<GateWithdrawResponse, ExchangeError> {
        self.private(
            WITHDRAW,
            &[("currency", currency), ("amount", amount), ("address", address)],
        )
        .await
    }
}
