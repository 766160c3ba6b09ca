pub mod core;
pub mod exchanges;

pub use crate::core::{errors::ExchangeError, traits::*, types::*};
pub use exchanges::gateio::{GateBuilder, GateConnector};
