use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::{OrderPlacer, RealtimeChannel};
use crate::core::types::{
    CancelAllResponse, CancelRequest, FeeRequest, FeeType, ModifyRequest, OrderRecord,
    OrderRequest, OrderType, OrdersRequest, SubmitResponse, Symbol,
};
use crate::exchanges::gateio::conversions::{
    format_pair, map_open_order, map_trade, offline_fee_percent, pair_fee_percent, parse_pair,
    trade_fee,
};
use crate::exchanges::gateio::rest::GateRest;
use crate::exchanges::gateio::source::Source;
use crate::exchanges::gateio::EXCHANGE_NAME;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Gate.io order placement and order queries
pub struct Trading<R: RestClient, C = ()> {
    rest: GateRest<R>,
    channel: Arc<C>,
}

impl<R: RestClient + Clone, C> Trading<R, C> {
    pub fn new(rest: &GateRest<R>, channel: Arc<C>) -> Self {
        Self {
            rest: rest.clone(),
            channel,
        }
    }
}

impl<R: RestClient, C> Trading<R, C> {
    async fn rest_open_orders(
        &self,
        pair: Option<&Symbol>,
    ) -> Result<Vec<OrderRecord>, ExchangeError> {
        let market = pair.map(format_pair);
        self.rest
            .open_orders(market.as_deref())
            .await?
            .orders
            .iter()
            .map(|order| map_open_order(EXCHANGE_NAME, order))
            .collect()
    }
}

fn validate_order(order: &OrderRequest) -> Result<(), ExchangeError> {
    if order.order_type == OrderType::Market {
        return Err(ExchangeError::NotSupported(
            "market orders; Gate.io v2 only accepts limit orders".to_string(),
        ));
    }
    if order.amount <= Decimal::ZERO {
        return Err(ExchangeError::InvalidParameters(format!(
            "order amount must be positive, got {}",
            order.amount
        )));
    }
    if order.price <= Decimal::ZERO {
        return Err(ExchangeError::InvalidParameters(format!(
            "order price must be positive, got {}",
            order.price
        )));
    }
    Ok(())
}

#[async_trait]
impl<R: RestClient, C: RealtimeChannel> OrderPlacer for Trading<R, C> {
    #[instrument(skip(self, order), fields(exchange = EXCHANGE_NAME, pair = %order.pair))]
    async fn submit_order(&self, order: OrderRequest) -> Result<SubmitResponse, ExchangeError> {
        validate_order(&order)?;

        let response = self
            .rest
            .place_order(
                order.side,
                &format_pair(&order.pair),
                &order.price.normalize().to_string(),
                &order.amount.normalize().to_string(),
            )
            .await?;

        Ok(SubmitResponse {
            order_id: Some(response.order_number),
            is_placed: true,
            fully_matched: matches!(response.left_amount, Some(left) if left.is_zero()),
        })
    }

    async fn modify_order(&self, _request: ModifyRequest) -> Result<String, ExchangeError> {
        Err(ExchangeError::NotSupported("order modification".to_string()))
    }

    #[instrument(skip(self, request), fields(exchange = EXCHANGE_NAME, pair = %request.pair))]
    async fn cancel_order(&self, request: CancelRequest) -> Result<(), ExchangeError> {
        if request.order_id.trim().parse::<u64>().is_err() {
            return Err(ExchangeError::InvalidParameters(format!(
                "order id {:?} is not numeric",
                request.order_id
            )));
        }
        self.rest
            .cancel_order(request.order_id.trim(), &format_pair(&request.pair))
            .await
    }

    /// One cancel-all per pair holding open orders. A failing pair does not
    /// stop the sweep; its error is reported in the response.
    ///
    /// Only the pair of each open order is read, so a record the normalizer
    /// would reject still gets its pair cancelled.
    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    async fn cancel_all_orders(
        &self,
        pair_filter: Option<&Symbol>,
    ) -> Result<CancelAllResponse, ExchangeError> {
        let market = pair_filter.map(format_pair);
        let open = self.rest.open_orders(market.as_deref()).await?;

        let mut pairs = BTreeSet::new();
        for order in &open.orders {
            let pair = parse_pair(&order.currency_pair)?;
            if pair_filter.map_or(true, |p| &pair == p) {
                pairs.insert(format_pair(&pair));
            }
        }

        let mut response = CancelAllResponse::default();
        for pair in pairs {
            if let Err(e) = self.rest.cancel_all_orders(&pair).await {
                warn!(%pair, error = %e, "cancel-all failed");
                response.status.insert(pair, e.to_string());
            }
        }
        Ok(response)
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    async fn get_order_info(&self, order_id: &str) -> Result<OrderRecord, ExchangeError> {
        self.rest_open_orders(None)
            .await?
            .into_iter()
            .find(|o| o.id == order_id)
            .ok_or_else(|| ExchangeError::NotFound(format!("order {}", order_id)))
    }

    #[instrument(skip(self, filter), fields(exchange = EXCHANGE_NAME))]
    async fn get_active_orders(
        &self,
        filter: &OrdersRequest,
    ) -> Result<Vec<OrderRecord>, ExchangeError> {
        let mut orders = Source::select(self.channel.as_ref(), &self.rest)
            .open_orders(EXCHANGE_NAME, filter.single_pair())
            .await?;
        if !filter.pairs.is_empty() {
            orders.retain(|o| filter.pairs.contains(&o.pair));
        }
        filter.apply(&mut orders);
        Ok(orders)
    }

    #[instrument(skip(self, filter), fields(exchange = EXCHANGE_NAME))]
    async fn get_order_history(
        &self,
        filter: &OrdersRequest,
    ) -> Result<Vec<OrderRecord>, ExchangeError> {
        if filter.pairs.is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "order history needs at least one pair".to_string(),
            ));
        }

        let mut orders = Vec::new();
        for pair in &filter.pairs {
            let trades = self.rest.trade_history(&format_pair(pair)).await?;
            for trade in &trades.trades {
                orders.push(map_trade(EXCHANGE_NAME, trade)?);
            }
        }
        filter.apply(&mut orders);
        Ok(orders)
    }

    /// Without credentials a live trade fee falls back to the published flat
    /// rate.
    #[instrument(skip(self, request), fields(exchange = EXCHANGE_NAME, pair = %request.pair, fee_type = ?request.fee_type))]
    async fn get_fee_by_type(&self, request: &FeeRequest) -> Result<Decimal, ExchangeError> {
        let fee_type = match request.fee_type {
            FeeType::Trade if !self.rest.is_authenticated() => {
                debug!("no credentials, estimating the trade fee offline");
                FeeType::OfflineTrade
            }
            other => other,
        };

        let percent = match fee_type {
            FeeType::Trade => {
                let info = self.rest.market_info().await?;
                pair_fee_percent(&info, &format_pair(&request.pair))?
            }
            FeeType::OfflineTrade => offline_fee_percent(),
            FeeType::Withdrawal => {
                return Err(ExchangeError::NotSupported(
                    "withdrawal fee estimates".to_string(),
                ))
            }
        };
        Ok(trade_fee(percent, request.price, request.amount))
    }
}
