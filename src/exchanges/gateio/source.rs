//! Per-call choice between the authenticated real-time channel and REST.

use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::pagination::{paginate, PAGE_SIZE};
use crate::core::traits::RealtimeChannel;
use crate::core::types::{Balance, OrderRecord, OrderStatus, Symbol};
use crate::exchanges::gateio::conversions::{
    format_pair, map_open_order, map_rest_balances, map_ws_balances, map_ws_order, PAIR_DELIMITER,
};
use crate::exchanges::gateio::rest::GateRest;
use crate::exchanges::gateio::types::{GateWsBalances, GateWsOrderQuery};
use tracing::debug;

/// Where one balances or open-orders call is served from.
///
/// Selected once per call and never switched mid-call: an error on the chosen
/// path is returned as is.
pub enum Source<'a, R: RestClient, C: RealtimeChannel> {
    Realtime(&'a C),
    Polled(&'a GateRest<R>),
}

impl<'a, R: RestClient, C: RealtimeChannel> Source<'a, R, C> {
    pub fn select(channel: &'a C, rest: &'a GateRest<R>) -> Self {
        if channel.is_usable() {
            debug!("serving from the real-time channel");
            Self::Realtime(channel)
        } else {
            debug!("serving from REST");
            Self::Polled(rest)
        }
    }

    pub fn is_realtime(&self) -> bool {
        matches!(self, Self::Realtime(_))
    }

    pub async fn balances(&self) -> Result<Vec<Balance>, ExchangeError> {
        match self {
            Self::Realtime(channel) => {
                let raw = channel.balances(&[]).await?;
                let parsed: GateWsBalances = serde_json::from_value(raw)
                    .map_err(|e| ExchangeError::malformed("real-time balances", e))?;
                map_ws_balances(&parsed)
            }
            Self::Polled(rest) => map_rest_balances(&rest.balances().await?),
        }
    }

    /// Open orders, on `pair` only when given.
    ///
    /// The real-time query is paged; REST returns everything in one response
    /// and is narrowed to orders that can still trade.
    pub async fn open_orders(
        &self,
        exchange: &str,
        pair: Option<&Symbol>,
    ) -> Result<Vec<OrderRecord>, ExchangeError> {
        match self {
            Self::Realtime(channel) => {
                let channel: &C = channel;
                let market = pair
                    .map(|p| p.format(PAIR_DELIMITER, true))
                    .unwrap_or_default();
                let market = market.as_str();

                paginate(
                    PAGE_SIZE,
                    |offset, limit| async move {
                        let raw = channel.query_orders(market, offset, limit).await?;
                        let page: GateWsOrderQuery = serde_json::from_value(raw)
                            .map_err(|e| ExchangeError::malformed("order.query page", e))?;
                        Ok::<_, ExchangeError>(page.records)
                    },
                    |raw| map_ws_order(exchange, raw),
                )
                .await
            }
            Self::Polled(rest) => {
                let market = pair.map(format_pair);
                let raw = rest.open_orders(market.as_deref()).await?;
                let mut orders = raw
                    .orders
                    .iter()
                    .map(|order| map_open_order(exchange, order))
                    .collect::<Result<Vec<_>, _>>()?;
                orders.retain(|o| {
                    matches!(o.status, OrderStatus::Open | OrderStatus::PartiallyFilled)
                });
                Ok(orders)
            }
        }
    }
}
