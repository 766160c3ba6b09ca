pub mod channel;
pub mod codec;
pub mod conversions;
pub mod signer;
pub mod source;
pub mod types;

pub mod builder;
pub mod connector;
pub mod rest;

/// Name every canonical value produced here carries
pub const EXCHANGE_NAME: &str = "GateIO";

// Re-export main components
pub use builder::{build_connector, build_connector_with_channel, GateBuilder, GateWsConnector};
pub use channel::GateWsChannel;
pub use codec::{GateCodec, GateWsMessage};
pub use connector::{Account, GateConnector, MarketData, Trading};
pub use rest::GateRest;
pub use signer::GateSigner;
pub use source::Source;
