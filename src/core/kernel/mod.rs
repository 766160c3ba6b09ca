/// Transport layer shared by exchange adapters
///
/// The kernel carries no exchange-specific logic. It provides:
///
/// - `RestClient` / `ReqwestRest`: HTTP execution with optional signing and
///   an optional client-side rate limit
/// - `Signer`: pluggable request authentication
/// - `WsSession` / `TungsteniteWs`: a request/response WebSocket session
/// - `WsCodec`: exchange-specific frame encoding and decoding
///
/// # Example
/// ```rust,no_run
/// use gatex::core::kernel::{RestClient, RestClientBuilder, RestClientConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rest = RestClientBuilder::new(RestClientConfig::new(
///     "https://data.gateio.co".to_string(),
///     "GateIO".to_string(),
/// ))
/// .build()?;
/// let pairs = rest.get("/api2/1/pairs", &[], false).await?;
/// println!("{}", pairs);
/// # Ok(())
/// # }
/// ```
pub mod codec;
pub mod rest;
pub mod signer;
pub mod ws;

pub use codec::WsCodec;
pub use rest::{RateLimit, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{SignatureResult, Signer};
pub use ws::{TungsteniteWs, WsConfig, WsSession};
