pub mod gateio;
