use crate::core::cache::AccountStore;
use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::{AccountInfo, RealtimeChannel};
use crate::core::types::{
    AccountSnapshot, FiatWithdrawalRequest, FundingRecord, SubAccount, WithdrawalRequest,
};
use crate::exchanges::gateio::rest::GateRest;
use crate::exchanges::gateio::source::Source;
use crate::exchanges::gateio::EXCHANGE_NAME;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Text Gate.io returns in place of an address that is still being created
const ADDRESS_PENDING: &str = "is being generated";

/// Gate.io balances, deposits and withdrawals
pub struct Account<R: RestClient, C = ()> {
    rest: GateRest<R>,
    channel: Arc<C>,
    accounts: Arc<dyn AccountStore>,
}

impl<R: RestClient + Clone, C> Account<R, C> {
    pub fn new(rest: &GateRest<R>, channel: Arc<C>, accounts: Arc<dyn AccountStore>) -> Self {
        Self {
            rest: rest.clone(),
            channel,
            accounts,
        }
    }
}

fn address_pending(addr: &str) -> bool {
    addr.to_ascii_lowercase().contains(ADDRESS_PENDING)
}

#[async_trait]
impl<R: RestClient, C: RealtimeChannel> AccountInfo for Account<R, C> {
    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    async fn refresh_account(&self) -> Result<AccountSnapshot, ExchangeError> {
        let balances = Source::select(self.channel.as_ref(), &self.rest)
            .balances()
            .await?;

        let snapshot = AccountSnapshot {
            exchange: EXCHANGE_NAME.to_string(),
            accounts: vec![SubAccount {
                id: None,
                currencies: balances,
            }],
        };
        self.accounts.publish(snapshot.clone())?;
        Ok(snapshot)
    }

    async fn get_account(&self) -> Result<AccountSnapshot, ExchangeError> {
        match self.accounts.get(EXCHANGE_NAME) {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh_account().await,
        }
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    async fn get_deposit_address(&self, currency: &str) -> Result<String, ExchangeError> {
        let address = self.rest.deposit_address(currency).await?.addr;
        let address = address.trim();

        if address.is_empty() || address_pending(address) {
            debug!(%currency, "deposit address not ready");
            return Err(ExchangeError::NotFound(format!(
                "{} deposit address is still being generated, retry later",
                currency
            )));
        }
        Ok(address.to_string())
    }

    #[instrument(skip(self, request), fields(exchange = EXCHANGE_NAME, currency = %request.currency))]
    async fn withdraw_crypto(&self, request: WithdrawalRequest) -> Result<String, ExchangeError> {
        if request.amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidParameters(format!(
                "withdrawal amount must be positive, got {}",
                request.amount
            )));
        }
        if request.address.trim().is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "withdrawal address is empty".to_string(),
            ));
        }

        let response = self
            .rest
            .withdraw(
                &request.currency,
                &request.amount.normalize().to_string(),
                request.address.trim(),
            )
            .await?;

        match response.id {
            Some(id) => Ok(id),
            None if !response.message.trim().is_empty() => Ok(response.message),
            None => Err(ExchangeError::MalformedResponse(
                "withdrawal response carries no reference".to_string(),
            )),
        }
    }

    async fn withdraw_fiat(&self, _request: FiatWithdrawalRequest) -> Result<String, ExchangeError> {
        Err(ExchangeError::NotSupported("fiat withdrawals".to_string()))
    }

    async fn withdraw_fiat_international(
        &self,
        _request: FiatWithdrawalRequest,
    ) -> Result<String, ExchangeError> {
        Err(ExchangeError::NotSupported(
            "international fiat withdrawals".to_string(),
        ))
    }

    async fn get_funding_history(&self) -> Result<Vec<FundingRecord>, ExchangeError> {
        Err(ExchangeError::NotSupported("funding history".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_address_detection() {
        assert!(address_pending("New address is being generated for you, please wait"));
        assert!(address_pending("NEW ADDRESS IS BEING GENERATED"));
        assert!(!address_pending("0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be"));
    }
}
