//! Raw Gate.io payloads to the canonical model.
//!
//! Everything here is pure apart from ticker mapping, which publishes each
//! ticker into the injected store as it is produced.

use crate::core::cache::TickerStore;
use crate::core::errors::ExchangeError;
use crate::core::reconcile::reconcile_balances;
use crate::core::types::{
    Balance, MarketSegment, OrderBook, OrderBookEntry, OrderRecord, OrderSide, OrderStatus,
    OrderType, Symbol, Ticker,
};
use crate::exchanges::gateio::types::{
    GateBalances, GateLevel, GateMarketInfo, GateOpenOrder, GateOrderBook, GateTicker, GateTickers,
    GateTrade, GateWsBalances, GateWsOrder,
};
use chrono::{DateTime, TimeZone, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

/// Gate.io pair delimiter
pub const PAIR_DELIMITER: char = '_';

/// Exchange request format: lowercase, `_` delimited
pub fn format_pair(pair: &Symbol) -> String {
    pair.format(PAIR_DELIMITER, false)
}

pub fn parse_pair(raw: &str) -> Result<Symbol, ExchangeError> {
    Symbol::from_delimited(raw, PAIR_DELIMITER)
        .map_err(|e| ExchangeError::malformed("unparseable currency pair", e))
}

/// Map every enabled pair found in the batch, publishing each as it is built.
///
/// Matching is case-insensitive. Enabled pairs the exchange did not return
/// are skipped.
pub fn map_tickers(
    exchange: &str,
    enabled: &[Symbol],
    raw: &GateTickers,
    store: &dyn TickerStore,
    now: DateTime<Utc>,
) -> Result<Vec<Ticker>, ExchangeError> {
    let mut produced = Vec::new();

    for pair in enabled {
        let Some(raw_ticker) = find_ticker(raw, &format_pair(pair))? else {
            debug!(pair = %pair, "no ticker returned for enabled pair");
            continue;
        };

        let ticker = Ticker {
            exchange: exchange.to_string(),
            pair: pair.clone(),
            segment: MarketSegment::Spot,
            last: raw_ticker.last,
            high: raw_ticker.high,
            low: raw_ticker.low,
            open: raw_ticker.open,
            close: raw_ticker.close,
            volume: raw_ticker.base_volume,
            quote_volume: raw_ticker.quote_volume,
            last_updated: now,
        };
        store.publish(ticker.clone())?;
        produced.push(ticker);
    }

    Ok(produced)
}

/// Ticker keyed by `wanted` in any case.
///
/// A key in request format wins; otherwise several case variants of the same
/// pair are ambiguous and the batch is malformed.
fn find_ticker<'a>(
    raw: &'a GateTickers,
    wanted: &str,
) -> Result<Option<&'a GateTicker>, ExchangeError> {
    if let Some(ticker) = raw.get(wanted) {
        return Ok(Some(ticker));
    }

    let mut matches = raw
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(wanted));
    match (matches.next(), matches.next()) {
        (Some((_, ticker)), None) => Ok(Some(ticker)),
        (None, _) => Ok(None),
        (Some(_), Some(_)) => Err(ExchangeError::MalformedResponse(format!(
            "ticker batch holds {} under several key casings",
            wanted
        ))),
    }
}

/// Copy the levels verbatim; no sorting or validation happens here
pub fn map_order_book(
    exchange: &str,
    pair: &Symbol,
    raw: GateOrderBook,
    now: DateTime<Utc>,
) -> OrderBook {
    OrderBook {
        exchange: exchange.to_string(),
        pair: pair.clone(),
        segment: MarketSegment::Spot,
        bids: book_levels(raw.bids),
        asks: book_levels(raw.asks),
        last_updated: now,
    }
}

fn book_levels(side: Vec<GateLevel>) -> Vec<OrderBookEntry> {
    side.into_iter()
        .map(|level| OrderBookEntry {
            price: level.price,
            amount: level.amount,
        })
        .collect()
}

pub fn map_rest_balances(raw: &GateBalances) -> Result<Vec<Balance>, ExchangeError> {
    reconcile_balances(
        raw.locked.iter().map(|(c, a)| (c.as_str(), a.as_str())),
        raw.available.iter().map(|(c, a)| (c.as_str(), a.as_str())),
    )
}

/// Split `{CUR: {available, freeze}}` into the two views and reconcile them
pub fn map_ws_balances(raw: &GateWsBalances) -> Result<Vec<Balance>, ExchangeError> {
    let locked: Vec<(String, String)> = raw
        .iter()
        .map(|(currency, b)| (currency.clone(), b.freeze.to_string()))
        .collect();
    let available: Vec<(String, String)> = raw
        .iter()
        .map(|(currency, b)| (currency.clone(), b.available.to_string()))
        .collect();
    reconcile_balances(locked, available)
}

/// Percent trade fee Gate.io publishes for every pair
pub fn offline_fee_percent() -> Decimal {
    Decimal::new(2, 1)
}

/// Percent trade fee of `wanted` (request format) in the market info batch
pub fn pair_fee_percent(raw: &GateMarketInfo, wanted: &str) -> Result<Decimal, ExchangeError> {
    raw.pairs
        .iter()
        .flat_map(|entry| entry.iter())
        .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
        .map(|(_, rules)| rules.fee)
        .ok_or_else(|| ExchangeError::NotFound(format!("fee data for {}", wanted)))
}

/// `percent / 100 * price * amount`, floored at zero
pub fn trade_fee(percent: Decimal, price: Decimal, amount: Decimal) -> Decimal {
    (percent / Decimal::ONE_HUNDRED * price * amount).max(Decimal::ZERO)
}

/// Real-time side flag
pub fn side_from_flag(flag: i64) -> Result<OrderSide, ExchangeError> {
    match flag {
        0 => Ok(OrderSide::Buy),
        1 => Ok(OrderSide::Sell),
        other => Err(ExchangeError::unrecognized("order side", other)),
    }
}

/// REST side string; `bid`/`ask` are accepted as aliases
pub fn side_from_str(raw: &str) -> Result<OrderSide, ExchangeError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "buy" | "bid" => Ok(OrderSide::Buy),
        "sell" | "ask" => Ok(OrderSide::Sell),
        _ => Err(ExchangeError::unrecognized("order side", raw)),
    }
}

/// Real-time order type flag
pub fn order_type_from_flag(flag: i64) -> Result<OrderType, ExchangeError> {
    match flag {
        0 => Ok(OrderType::Market),
        1 => Ok(OrderType::Limit),
        other => Err(ExchangeError::unrecognized("order type", other)),
    }
}

pub fn status_from_str(raw: &str) -> Result<OrderStatus, ExchangeError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "open" => Ok(OrderStatus::Open),
        "partially_filled" | "partial" => Ok(OrderStatus::PartiallyFilled),
        "closed" | "done" | "filled" => Ok(OrderStatus::Filled),
        "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
        _ => Err(ExchangeError::unrecognized("order status", raw)),
    }
}

/// `initial - filled`; an overfilled record is malformed
pub fn remaining(initial: Decimal, filled: Decimal) -> Result<Decimal, ExchangeError> {
    if filled > initial {
        return Err(ExchangeError::MalformedResponse(format!(
            "filled amount {} exceeds order amount {}",
            filled, initial
        )));
    }
    Ok(initial - filled)
}

pub fn timestamp_from_secs(secs: i64) -> Result<DateTime<Utc>, ExchangeError> {
    Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
        ExchangeError::MalformedResponse(format!("timestamp {} is out of range", secs))
    })
}

/// Fractional epoch seconds, split into whole seconds and nanoseconds.
///
/// Whole seconds are floored so the nanosecond part is never negative.
pub fn timestamp_from_fractional(secs: Decimal) -> Result<DateTime<Utc>, ExchangeError> {
    let out_of_range =
        || ExchangeError::MalformedResponse(format!("timestamp {} is out of range", secs));

    let whole = secs.floor();
    let nanos = ((secs - whole) * Decimal::from(1_000_000_000u32)).trunc();
    let whole = whole.to_i64().ok_or_else(out_of_range)?;
    let nanos = nanos.to_u32().ok_or_else(out_of_range)?;

    Utc.timestamp_opt(whole, nanos)
        .single()
        .ok_or_else(out_of_range)
}

/// REST open order; REST carries no order type so it is taken as limit
pub fn map_open_order(exchange: &str, raw: &GateOpenOrder) -> Result<OrderRecord, ExchangeError> {
    Ok(OrderRecord {
        id: raw.order_number.clone(),
        exchange: exchange.to_string(),
        account_id: None,
        pair: parse_pair(&raw.currency_pair)?,
        side: side_from_str(&raw.side)?,
        order_type: OrderType::Limit,
        price: raw.rate,
        amount: raw.initial_amount,
        executed_amount: raw.filled_amount,
        remaining_amount: remaining(raw.initial_amount, raw.filled_amount)?,
        status: status_from_str(&raw.status)?,
        placed_at: timestamp_from_secs(raw.timestamp)?,
        fee: Decimal::ZERO,
    })
}

/// Real-time order; the query only ever returns open orders
pub fn map_ws_order(exchange: &str, raw: GateWsOrder) -> Result<OrderRecord, ExchangeError> {
    Ok(OrderRecord {
        remaining_amount: remaining(raw.amount, raw.filled_amount)?,
        pair: parse_pair(&raw.market)?,
        side: side_from_flag(raw.side)?,
        order_type: order_type_from_flag(raw.order_type)?,
        placed_at: timestamp_from_fractional(raw.ctime)?,
        id: raw.id,
        exchange: exchange.to_string(),
        account_id: Some(raw.user),
        price: raw.price,
        amount: raw.amount,
        executed_amount: raw.filled_amount,
        status: OrderStatus::Open,
        fee: raw.deal_fee.unwrap_or(Decimal::ZERO),
    })
}

/// Executed trade as a filled order record
pub fn map_trade(exchange: &str, raw: &GateTrade) -> Result<OrderRecord, ExchangeError> {
    Ok(OrderRecord {
        id: raw.orderid.clone(),
        exchange: exchange.to_string(),
        account_id: None,
        pair: parse_pair(&raw.pair)?,
        side: side_from_str(&raw.side)?,
        order_type: OrderType::Limit,
        price: raw.rate,
        amount: raw.amount,
        executed_amount: raw.amount,
        remaining_amount: Decimal::ZERO,
        status: OrderStatus::Filled,
        placed_at: timestamp_from_secs(raw.time_unix)?,
        fee: Decimal::ZERO,
    })
}
