use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TypesError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

/// Currency pair, stored uppercase so that pairs compare equal regardless of
/// how an exchange happens to case them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    pub base: String,
    pub quote: String,
}

impl Symbol {
    /// Create a new symbol with validation
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Result<Self, TypesError> {
        let base = base.into().trim().to_uppercase();
        let quote = quote.into().trim().to_uppercase();

        if base.is_empty() || quote.is_empty() {
            return Err(TypesError::InvalidSymbol(
                "Base and quote assets cannot be empty".to_string(),
            ));
        }

        Ok(Self { base, quote })
    }

    /// Parse a delimited pair such as `"eth_btc"` or `"ETH-BTC"`
    pub fn from_delimited(pair: &str, delimiter: char) -> Result<Self, TypesError> {
        let (base, quote) = pair
            .split_once(delimiter)
            .ok_or_else(|| TypesError::InvalidSymbol(format!("'{}' has no '{}'", pair, delimiter)))?;
        if quote.contains(delimiter) {
            return Err(TypesError::InvalidSymbol(format!(
                "'{}' has more than one '{}'",
                pair, delimiter
            )));
        }
        Self::new(base, quote)
    }

    /// Render as `BASE{delimiter}QUOTE`, optionally lowercased
    pub fn format(&self, delimiter: char, uppercase: bool) -> String {
        let joined = format!("{}{}{}", self.base, delimiter, self.quote);
        if uppercase {
            joined
        } else {
            joined.to_lowercase()
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Market segment a ticker or book belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSegment {
    Spot,
}

impl fmt::Display for MarketSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spot => write!(f, "spot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub exchange: String,
    pub pair: Symbol,
    pub segment: MarketSegment,
    pub last: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub open: Option<Decimal>,
    pub close: Option<Decimal>,
    /// Base-currency volume
    pub volume: Decimal,
    pub quote_volume: Decimal,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    pub price: Decimal,
    pub amount: Decimal,
}

/// Full order-book snapshot. Levels keep the order the source delivered them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub exchange: String,
    pub pair: Symbol,
    pub segment: MarketSegment,
    pub bids: Vec<OrderBookEntry>,
    pub asks: Vec<OrderBookEntry>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub currency: String,
    pub total: Decimal,
    pub hold: Decimal,
}

impl Balance {
    pub fn available(&self) -> Decimal {
        self.total - self.hold
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubAccount {
    pub id: Option<String>,
    pub currencies: Vec<Balance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub exchange: String,
    pub accounts: Vec<SubAccount>,
}

impl AccountSnapshot {
    /// Look a currency up across every sub-account (first hit)
    pub fn balance(&self, currency: &str) -> Option<&Balance> {
        self.accounts
            .iter()
            .flat_map(|a| a.currencies.iter())
            .find(|b| b.currency.eq_ignore_ascii_case(currency))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub exchange: String,
    pub account_id: Option<String>,
    pub pair: Symbol,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Decimal,
    /// Requested amount
    pub amount: Decimal,
    pub executed_amount: Decimal,
    /// Always `amount - executed_amount`
    pub remaining_amount: Decimal,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
    pub fee: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub pair: Symbol,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub amount: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub order_id: Option<String>,
    pub is_placed: bool,
    pub fully_matched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub order_id: String,
    pub pair: Symbol,
}

/// Per-pair failures of a cancel-all sweep, keyed by exchange pair string.
/// Empty means every cancel succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelAllResponse {
    pub status: HashMap<String, String>,
}

/// Filter applied to active orders and order history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdersRequest {
    pub pairs: Vec<Symbol>,
    pub side: Option<OrderSide>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl OrdersRequest {
    pub fn for_pair(pair: Symbol) -> Self {
        Self {
            pairs: vec![pair],
            ..Self::default()
        }
    }

    /// Single pair the exchange can filter on server-side, if any
    pub fn single_pair(&self) -> Option<&Symbol> {
        match self.pairs.as_slice() {
            [pair] => Some(pair),
            _ => None,
        }
    }

    /// Keep orders inside the time range (inclusive) and matching the side
    pub fn apply(&self, orders: &mut Vec<OrderRecord>) {
        orders.retain(|o| {
            self.start.map_or(true, |start| o.placed_at >= start)
                && self.end.map_or(true, |end| o.placed_at <= end)
                && self.side.map_or(true, |side| o.side == side)
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub currency: String,
    pub address: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatWithdrawalRequest {
    pub currency: String,
    pub amount: Decimal,
    pub bank_account: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRecord {
    pub currency: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicTrade {
    pub pair: Symbol,
    pub price: Decimal,
    pub amount: Decimal,
    pub side: OrderSide,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyRequest {
    pub order_id: String,
    pub pair: Symbol,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
}

/// What a fee estimate is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeType {
    /// Trading fee from the exchange's live fee schedule
    Trade,
    /// Trading fee at the flat published rate, without asking the exchange
    OfflineTrade,
    Withdrawal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRequest {
    pub fee_type: FeeType,
    pub pair: Symbol,
    pub price: Decimal,
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_symbol_parsing_is_case_insensitive() {
        let lower = Symbol::from_delimited("eth_btc", '_').unwrap();
        let upper = Symbol::from_delimited("ETH_BTC", '_').unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.format('_', false), "eth_btc");
        assert_eq!(lower.format('_', true), "ETH_BTC");
        assert_eq!(lower.to_string(), "ETH/BTC");
    }

    #[test]
    fn test_symbol_rejects_bad_input() {
        assert!(Symbol::from_delimited("ETHBTC", '_').is_err());
        assert!(Symbol::from_delimited("_BTC", '_').is_err());
        assert!(Symbol::from_delimited("A_B_C", '_').is_err());
    }

    fn order(side: OrderSide, secs: i64) -> OrderRecord {
        OrderRecord {
            id: secs.to_string(),
            exchange: "GateIO".to_string(),
            account_id: None,
            pair: Symbol::new("ETH", "BTC").unwrap(),
            side,
            order_type: OrderType::Limit,
            price: dec!(0.05),
            amount: dec!(1),
            executed_amount: dec!(0),
            remaining_amount: dec!(1),
            status: OrderStatus::Open,
            placed_at: Utc.timestamp_opt(secs, 0).unwrap(),
            fee: dec!(0),
        }
    }

    #[test]
    fn test_orders_request_filters_side_and_range() {
        let mut orders = vec![
            order(OrderSide::Buy, 100),
            order(OrderSide::Sell, 200),
            order(OrderSide::Buy, 300),
        ];
        let filter = OrdersRequest {
            side: Some(OrderSide::Buy),
            start: Some(Utc.timestamp_opt(150, 0).unwrap()),
            end: Some(Utc.timestamp_opt(300, 0).unwrap()),
            ..OrdersRequest::default()
        };
        filter.apply(&mut orders);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, "300");
    }

    #[test]
    fn test_single_pair_only_when_exactly_one() {
        let pair = Symbol::new("ETH", "BTC").unwrap();
        assert!(OrdersRequest::default().single_pair().is_none());
        assert_eq!(OrdersRequest::for_pair(pair.clone()).single_pair(), Some(&pair));
    }

    #[test]
    fn test_order_record_serializes_placement_time() {
        let record = order(OrderSide::Sell, 1_531_122_930);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["placed_at"], "2018-07-09T07:55:30Z");

        let back: OrderRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
