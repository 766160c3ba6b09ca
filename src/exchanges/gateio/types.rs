//! Raw Gate.io payloads, decoded strictly at the boundary.
//!
//! Numbers arrive as JSON numbers or numeric strings depending on the
//! endpoint (sometimes on the same endpoint); both decode into `Decimal`.

use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

fn decimal_from_value<E: de::Error>(value: &Value) -> Result<Decimal, E> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(E::custom(format!(
                "expected a number or numeric string, got {}",
                other
            )))
        }
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| E::custom(format!("'{}' is not a decimal: {}", text, e)))
}

/// `Decimal` from a JSON number or numeric string
pub fn de_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    decimal_from_value(&value)
}

/// Optional `Decimal`; `null` and absent both mean `None`
pub fn de_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decimal_from_value(&value).map(Some),
    }
}

/// Integer from a JSON integer or an integer string
pub fn de_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("{} is not an integer", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|e| de::Error::custom(format!("'{}' is not an integer: {}", s, e))),
        other => Err(de::Error::custom(format!(
            "expected an integer, got {}",
            other
        ))),
    }
}

/// Identifier that may be sent as a number or a string
pub fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        other => Err(de::Error::custom(format!("expected an id, got {}", other))),
    }
}

/// Currency → amount view.
///
/// Gate.io sends `[]` instead of `{}` for an empty view; `null`/absent are
/// empty too. Any other shape is rejected.
pub fn de_amount_view<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) if items.is_empty() => Ok(Vec::new()),
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(currency, amount)| match amount {
                Value::String(s) => Ok((currency, s)),
                Value::Number(n) => Ok((currency, n.to_string())),
                other => Err(de::Error::custom(format!(
                    "{} amount has unexpected shape {}",
                    currency, other
                ))),
            })
            .collect(),
        Some(other) => Err(de::Error::custom(format!(
            "balance view must be an object or empty array, got {}",
            other
        ))),
    }
}

/// `result` flag of private responses: `true`, `"true"`, `false`, `"false"`
pub fn result_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateTicker {
    #[serde(deserialize_with = "de_decimal")]
    pub last: Decimal,
    #[serde(alias = "high24hr", deserialize_with = "de_decimal")]
    pub high: Decimal,
    #[serde(alias = "low24hr", deserialize_with = "de_decimal")]
    pub low: Decimal,
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub open: Option<Decimal>,
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub close: Option<Decimal>,
    #[serde(deserialize_with = "de_decimal")]
    pub base_volume: Decimal,
    #[serde(deserialize_with = "de_decimal")]
    pub quote_volume: Decimal,
}

/// `pair → ticker` as returned by `/tickers`
pub type GateTickers = HashMap<String, GateTicker>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

impl<'de> Deserialize<'de> for GateLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level = Vec::<Value>::deserialize(deserializer)?;
        match level.as_slice() {
            [price, amount] => Ok(Self {
                price: decimal_from_value(price)?,
                amount: decimal_from_value(amount)?,
            }),
            _ => Err(de::Error::custom(format!(
                "order book level must be [price, amount], got {} elements",
                level.len()
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateOrderBook {
    pub bids: Vec<GateLevel>,
    pub asks: Vec<GateLevel>,
}

/// Per-pair trading rules from `/marketinfo`
#[derive(Debug, Clone, Deserialize)]
pub struct GateMarketPair {
    /// Trade fee in percent
    #[serde(deserialize_with = "de_decimal")]
    pub fee: Decimal,
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub min_amount: Option<Decimal>,
}

/// `pairs` is a list of single-entry `{pair: rules}` objects
#[derive(Debug, Clone, Deserialize)]
pub struct GateMarketInfo {
    #[serde(default)]
    pub pairs: Vec<HashMap<String, GateMarketPair>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateBalances {
    #[serde(default, deserialize_with = "de_amount_view")]
    pub available: Vec<(String, String)>,
    #[serde(default, deserialize_with = "de_amount_view")]
    pub locked: Vec<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateSubmitResponse {
    #[serde(deserialize_with = "de_id")]
    pub order_number: String,
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub left_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub filled_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateOpenOrder {
    #[serde(deserialize_with = "de_id")]
    pub order_number: String,
    /// `buy`/`sell` (sometimes `bid`/`ask`)
    #[serde(rename = "type")]
    pub side: String,
    #[serde(deserialize_with = "de_decimal")]
    pub rate: Decimal,
    #[serde(deserialize_with = "de_decimal")]
    pub initial_amount: Decimal,
    #[serde(deserialize_with = "de_decimal")]
    pub filled_amount: Decimal,
    pub currency_pair: String,
    #[serde(deserialize_with = "de_i64")]
    pub timestamp: i64,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateOpenOrders {
    #[serde(default)]
    pub orders: Vec<GateOpenOrder>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateTrade {
    #[serde(alias = "orderNumber", deserialize_with = "de_id")]
    pub orderid: String,
    pub pair: String,
    #[serde(rename = "type")]
    pub side: String,
    #[serde(deserialize_with = "de_decimal")]
    pub rate: Decimal,
    #[serde(deserialize_with = "de_decimal")]
    pub amount: Decimal,
    #[serde(deserialize_with = "de_i64")]
    pub time_unix: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateTrades {
    #[serde(default)]
    pub trades: Vec<GateTrade>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateDepositAddress {
    pub addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateWithdrawResponse {
    #[serde(default, alias = "withdraw_id", deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub message: String,
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a withdrawal id, got {}",
            other
        ))),
    }
}

/// One page of `order.query`
#[derive(Debug, Clone, Deserialize)]
pub struct GateWsOrderQuery {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub total: u64,
    pub records: Vec<GateWsOrder>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateWsOrder {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub market: String,
    #[serde(deserialize_with = "de_id")]
    pub user: String,
    /// Fractional epoch seconds
    #[serde(deserialize_with = "de_decimal")]
    pub ctime: Decimal,
    /// `0` buy, `1` sell
    #[serde(rename = "type")]
    pub side: i64,
    /// `0` market, `1` limit
    pub order_type: i64,
    #[serde(deserialize_with = "de_decimal")]
    pub price: Decimal,
    #[serde(deserialize_with = "de_decimal")]
    pub amount: Decimal,
    #[serde(deserialize_with = "de_decimal")]
    pub filled_amount: Decimal,
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub deal_fee: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateWsBalance {
    #[serde(deserialize_with = "de_decimal")]
    pub available: Decimal,
    #[serde(deserialize_with = "de_decimal")]
    pub freeze: Decimal,
}

/// `currency → balance` as returned by `balance.query`
pub type GateWsBalances = HashMap<String, GateWsBalance>;
