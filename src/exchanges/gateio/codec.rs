use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::WsCodec;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

/// Error object of a failed call
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GateWsError {
    pub code: i32,
    pub message: String,
}

/// Decoded Gate.io v3 frame
#[derive(Debug, Clone, PartialEq)]
pub enum GateWsMessage {
    /// Answer to a call, correlated by id
    Response {
        id: u64,
        result: Value,
        error: Option<GateWsError>,
    },
    /// Server push (`*.update`); nothing in this crate subscribes to one
    Update { method: String, params: Value },
}

#[derive(Deserialize)]
struct RawFrame {
    id: Option<u64>,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<GateWsError>,
    method: Option<String>,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GateCodec;

impl GateCodec {
    pub fn new() -> Self {
        Self
    }

    fn decode_text(text: &str) -> Result<Option<GateWsMessage>, ExchangeError> {
        let frame: RawFrame = serde_json::from_str(text)
            .map_err(|e| ExchangeError::malformed("Failed to parse Gate.io frame", e))?;

        match (frame.id, frame.method) {
            (Some(id), _) => Ok(Some(GateWsMessage::Response {
                id,
                result: frame.result,
                error: frame.error,
            })),
            (None, Some(method)) => Ok(Some(GateWsMessage::Update {
                method,
                params: frame.params,
            })),
            (None, None) => Ok(None),
        }
    }
}

impl WsCodec for GateCodec {
    type Message = GateWsMessage;

    fn encode_request(
        &self,
        id: u64,
        method: &str,
        params: &Value,
    ) -> Result<Message, ExchangeError> {
        let frame = json!({
            "id": id,
            "method": method,
            "params": params,
        });
        Ok(Message::Text(frame.to_string()))
    }

    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, ExchangeError> {
        match message {
            Message::Text(text) => Self::decode_text(&text),
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => Self::decode_text(text),
                Err(e) => Err(ExchangeError::malformed("Gate.io frame is not UTF-8", e)),
            },
            _ => Ok(None),
        }
    }
}
