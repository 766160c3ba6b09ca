use crate::core::cache::SharedCaches;
use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    RateLimit, ReqwestRest, RestClientBuilder, RestClientConfig, TungsteniteWs, WsConfig,
};
use crate::core::types::Symbol;
use crate::exchanges::gateio::{
    channel::GateWsChannel, codec::GateCodec, connector::GateConnector, rest::GateRest,
    signer::GateSigner, EXCHANGE_NAME,
};
use std::sync::Arc;
use tracing::{info, warn};

const MARKET_URL: &str = "https://data.gateio.co";
const TRADE_URL: &str = "https://api.gateio.co";
const WS_URL: &str = "wss://ws.gateio.ws/v3/";

/// Connector with the authenticated real-time channel attached
pub type GateWsConnector = GateConnector<ReqwestRest, GateWsChannel<TungsteniteWs<GateCodec>>>;

/// Builder for creating Gate.io connectors
///
/// Collects the configuration, the pairs to publish tickers for, the caches
/// to publish into and the transport settings.
pub struct GateBuilder {
    config: ExchangeConfig,
    enabled_pairs: Vec<Symbol>,
    caches: SharedCaches,
    rest_timeout: u64,
    rate_limit: Option<RateLimit>,
    ws_config: WsConfig,
}

impl Default for GateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GateBuilder {
    /// Create a new `GateBuilder` with default settings
    pub fn new() -> Self {
        Self {
            config: ExchangeConfig::read_only(),
            enabled_pairs: Vec::new(),
            caches: SharedCaches::default(),
            rest_timeout: 30,
            rate_limit: Some(RateLimit::default()),
            ws_config: WsConfig::default(),
        }
    }

    /// Set the exchange configuration
    pub fn with_config(mut self, config: ExchangeConfig) -> Self {
        self.config = config;
        self
    }

    /// Pairs every ticker refresh publishes
    pub fn with_enabled_pairs(mut self, pairs: Vec<Symbol>) -> Self {
        self.enabled_pairs = pairs;
        self
    }

    /// Publish into these caches instead of fresh in-memory ones
    pub fn with_caches(mut self, caches: SharedCaches) -> Self {
        self.caches = caches;
        self
    }

    /// Set REST client timeout in seconds
    pub fn with_rest_timeout(mut self, timeout: u64) -> Self {
        self.rest_timeout = timeout;
        self
    }

    /// Client-side request budget; `None` sends without waiting
    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimit>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_ws_config(mut self, ws_config: WsConfig) -> Self {
        self.ws_config = ws_config;
        self
    }

    fn check_config(&self) -> Result<(), ExchangeError> {
        if self.config.testnet {
            return Err(ExchangeError::ConfigurationError(
                "Gate.io v2 has no testnet".to_string(),
            ));
        }
        Ok(())
    }

    fn signer(&self) -> Option<Arc<GateSigner>> {
        self.config.has_credentials().then(|| {
            Arc::new(GateSigner::new(
                self.config.api_key().to_string(),
                self.config.secret_key().to_string(),
            ))
        })
    }

    fn rest_client(
        &self,
        base_url: String,
        signer: Option<Arc<GateSigner>>,
    ) -> Result<ReqwestRest, ExchangeError> {
        let mut rest_config = RestClientConfig::new(base_url, EXCHANGE_NAME.to_string())
            .with_timeout(self.rest_timeout);
        if let Some(rate_limit) = self.rate_limit {
            rest_config = rest_config.with_rate_limit(rate_limit);
        }

        let mut rest_builder = RestClientBuilder::new(rest_config);
        if let Some(signer) = signer {
            rest_builder = rest_builder.with_signer(signer);
        }
        rest_builder.build()
    }

    /// Market and trade executors. Only the trade host signs requests.
    fn rest(&self) -> Result<GateRest<ReqwestRest>, ExchangeError> {
        let market_url = self
            .config
            .market_url
            .clone()
            .unwrap_or_else(|| MARKET_URL.to_string());
        let trade_url = self
            .config
            .base_url
            .clone()
            .unwrap_or_else(|| TRADE_URL.to_string());

        Ok(GateRest::new(
            self.rest_client(market_url, None)?,
            self.rest_client(trade_url, self.signer())?,
        )
        .with_authentication(self.config.has_credentials()))
    }

    /// Build a REST-only Gate.io connector
    pub fn build_rest_only(self) -> Result<GateConnector<ReqwestRest, ()>, ExchangeError> {
        self.check_config()?;
        let rest = self.rest()?;
        Ok(GateConnector::new_without_channel(
            rest,
            self.caches,
            self.enabled_pairs,
        ))
    }

    /// Build a Gate.io connector with the real-time channel and sign it in.
    ///
    /// A failed sign-in is not fatal: the channel stays unusable, every call
    /// goes through REST, and `connector.channel().connect()` may be retried.
    pub async fn build_with_channel(self) -> Result<GateWsConnector, ExchangeError> {
        self.check_config()?;
        let signer = self.signer().ok_or_else(|| {
            ExchangeError::ConfigurationError(
                "the real-time channel needs API credentials".to_string(),
            )
        })?;
        let rest = self.rest()?;

        let ws_url = self
            .config
            .ws_url
            .clone()
            .unwrap_or_else(|| WS_URL.to_string());
        let ws = TungsteniteWs::new(ws_url, EXCHANGE_NAME.to_string(), GateCodec::new())
            .with_config(self.ws_config.clone());
        let channel = Arc::new(GateWsChannel::new(ws, signer));

        match channel.connect().await {
            Ok(()) => info!("real-time channel ready"),
            Err(e) => warn!(error = %e, "real-time channel unavailable, serving from REST"),
        }

        Ok(GateConnector::new_with_channel(
            rest,
            channel,
            self.caches,
            self.enabled_pairs,
        ))
    }
}

/// Create a REST-only Gate.io connector
pub fn build_connector(
    config: ExchangeConfig,
    enabled_pairs: Vec<Symbol>,
) -> Result<GateConnector<ReqwestRest, ()>, ExchangeError> {
    GateBuilder::new()
        .with_config(config)
        .with_enabled_pairs(enabled_pairs)
        .build_rest_only()
}

/// Create a Gate.io connector with the real-time channel
pub async fn build_connector_with_channel(
    config: ExchangeConfig,
    enabled_pairs: Vec<Symbol>,
) -> Result<GateWsConnector, ExchangeError> {
    GateBuilder::new()
        .with_config(config)
        .with_enabled_pairs(enabled_pairs)
        .build_with_channel()
        .await
}
