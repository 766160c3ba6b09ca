use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::Signer;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{instrument, trace};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// REST client trait for making HTTP requests
///
/// Every method returns the decoded JSON body, or the transport/HTTP error
/// unchanged. Nothing here retries.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Make a GET request
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `query_params` - Query parameters as key-value pairs
    /// * `authenticated` - Whether to sign the request
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Value, ExchangeError>;

    /// Make a POST request with a form-encoded body
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `form` - Body fields, encoded in the given order
    /// * `authenticated` - Whether to sign the request
    async fn post_form(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Value, ExchangeError>;
}

/// Client-side request budget: at most `max_requests` per `per`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: NonZeroU32,
    pub per: Duration,
}

impl RateLimit {
    pub const fn new(max_requests: NonZeroU32, per: Duration) -> Self {
        Self { max_requests, per }
    }

    fn quota(&self) -> Result<Quota, ExchangeError> {
        let period = self.per / self.max_requests.get();
        Quota::with_period(period)
            .map(|quota| quota.allow_burst(self.max_requests))
            .ok_or_else(|| {
                ExchangeError::ConfigurationError(format!(
                    "rate limit of {} per {:?} has a zero period",
                    self.max_requests, self.per
                ))
            })
    }
}

impl Default for RateLimit {
    /// Gate.io allows 100 private requests every 10 seconds
    fn default() -> Self {
        Self::new(nonzero!(100u32), Duration::from_secs(10))
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
    /// Optional client-side rate limit; requests wait for budget
    pub rate_limit: Option<RateLimit>,
}

impl RestClientConfig {
    /// Create a new configuration
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the API
    /// * `exchange_name` - Name of the exchange
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: 30,
            user_agent: "gatex/0.1".to_string(),
            rate_limit: None,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
}

impl RestClientBuilder {
    /// Create a new builder with the given configuration
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Build the REST client
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ExchangeError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        let limiter = match &self.config.rate_limit {
            Some(rate_limit) => Some(Arc::new(RateLimiter::direct(rate_limit.quota()?))),
            None => None,
        };

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
            limiter,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Get the current timestamp in milliseconds
    fn get_timestamp() -> Result<u64, ExchangeError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .map_err(|e| ExchangeError::AuthError(format!("Failed to get timestamp: {}", e)))
    }

    /// Build the full URL for an endpoint
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }

    /// Percent-encode key/value pairs as `k=v&k=v`
    fn encode_pairs(params: &[(&str, &str)]) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Handle the response and extract JSON
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, ExchangeError> {
        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            ExchangeError::NetworkError(format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", response_text);

        if status.is_success() {
            serde_json::from_str(&response_text)
                .map_err(|e| ExchangeError::malformed("Failed to parse JSON response", e))
        } else {
            Err(ExchangeError::ApiError {
                code: i32::from(status.as_u16()),
                message: response_text,
            })
        }
    }

    /// Make a request with the given parameters
    #[instrument(skip(self, body), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: &str,
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let url = self.build_url(endpoint);
        let mut request = self.client.request(method.clone(), &url);
        let query_string = Self::encode_pairs(query_params);

        if authenticated {
            let signer = self.signer.as_ref().ok_or_else(|| {
                ExchangeError::AuthError(
                    "Authentication required but no signer provided".to_string(),
                )
            })?;
            let timestamp = Self::get_timestamp()?;
            let (headers, signed_params) = signer.sign_request(
                method.as_str(),
                endpoint,
                &query_string,
                body.as_bytes(),
                timestamp,
            )?;

            for (key, value) in headers {
                request = request.header(&key, &value);
            }
            if signed_params.is_empty() {
                request = request.query(query_params);
            } else {
                request = request.query(&signed_params);
            }
        } else if !query_params.is_empty() {
            request = request.query(query_params);
        }

        if !body.is_empty() || method == Method::POST {
            request = request
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(body.to_string());
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, query_params), fields(exchange = %self.config.exchange_name, endpoint = %endpoint, param_count = query_params.len()))]
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        self.make_request(Method::GET, endpoint, query_params, "", authenticated)
            .await
    }

    #[instrument(skip(self, form), fields(exchange = %self.config.exchange_name, endpoint = %endpoint, field_count = form.len()))]
    async fn post_form(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        let body = Self::encode_pairs(form);
        self.make_request(Method::POST, endpoint, &[], &body, authenticated)
            .await
    }
}
