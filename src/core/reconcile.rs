use crate::core::errors::ExchangeError;
use crate::core::types::Balance;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Merge a locked view and an available view into one balance per currency.
///
/// Locked amounts seed `hold` (and a provisional `total`); available amounts
/// then complete `total = hold + available`, or create a record with no hold
/// when the currency was never locked. Currency codes are uppercased and the
/// output is sorted by code. Any amount that is not a non-negative decimal
/// fails the whole merge.
pub fn reconcile_balances<L, A, K, V>(locked: L, available: A) -> Result<Vec<Balance>, ExchangeError>
where
    L: IntoIterator<Item = (K, V)>,
    A: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut merged: BTreeMap<String, Balance> = BTreeMap::new();

    for (currency, amount) in locked {
        let code = currency_code(currency.as_ref())?;
        let hold = parse_amount(&code, "locked", amount.as_ref())?;
        if merged.contains_key(&code) {
            return Err(duplicate(&code, "locked"));
        }
        merged.insert(
            code.clone(),
            Balance {
                currency: code,
                total: hold,
                hold,
            },
        );
    }

    let mut seen_available = Vec::new();
    for (currency, amount) in available {
        let code = currency_code(currency.as_ref())?;
        let free = parse_amount(&code, "available", amount.as_ref())?;
        if seen_available.contains(&code) {
            return Err(duplicate(&code, "available"));
        }
        seen_available.push(code.clone());

        match merged.get_mut(&code) {
            Some(balance) => balance.total = balance.hold + free,
            None => {
                merged.insert(
                    code.clone(),
                    Balance {
                        currency: code,
                        total: free,
                        hold: Decimal::ZERO,
                    },
                );
            }
        }
    }

    Ok(merged.into_values().collect())
}

fn currency_code(raw: &str) -> Result<String, ExchangeError> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Err(ExchangeError::MalformedResponse(
            "balance entry has an empty currency code".to_string(),
        ));
    }
    Ok(code)
}

fn parse_amount(currency: &str, view: &str, raw: &str) -> Result<Decimal, ExchangeError> {
    let amount = Decimal::from_str(raw.trim()).map_err(|e| {
        ExchangeError::MalformedResponse(format!(
            "{} {} amount '{}' is not numeric: {}",
            currency, view, raw, e
        ))
    })?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ExchangeError::MalformedResponse(format!(
            "{} {} amount '{}' is negative",
            currency, view, raw
        )));
    }
    Ok(amount)
}

fn duplicate(currency: &str, view: &str) -> ExchangeError {
    ExchangeError::MalformedResponse(format!("{} appears twice in the {} view", currency, view))
}
