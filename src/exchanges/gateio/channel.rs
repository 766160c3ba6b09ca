use crate::core::errors::ExchangeError;
use crate::core::kernel::WsSession;
use crate::core::traits::RealtimeChannel;
use crate::exchanges::gateio::codec::{GateCodec, GateWsMessage};
use crate::exchanges::gateio::signer::GateSigner;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, trace};

/// Authenticated Gate.io v3 channel.
///
/// Calls are serialised on the session: each one sends a request and reads
/// frames until the response carrying the same id arrives. Pushes and stale
/// responses read in the meantime are dropped.
pub struct GateWsChannel<W> {
    session: Mutex<W>,
    signer: Arc<GateSigner>,
    connected: AtomicBool,
    authenticated: AtomicBool,
    next_id: AtomicU64,
}

impl<W: WsSession<GateCodec>> GateWsChannel<W> {
    pub fn new(session: W, signer: Arc<GateSigner>) -> Self {
        Self {
            session: Mutex::new(session),
            signer,
            connected: AtomicBool::new(false),
            authenticated: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    /// Connect and sign in. The channel is usable only once both succeed.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<(), ExchangeError> {
        let mut session = self.session.lock().await;
        self.authenticated.store(false, Ordering::SeqCst);

        session.connect().await?;
        self.connected.store(true, Ordering::SeqCst);

        let nonce = u64::try_from(chrono::Utc::now().timestamp_millis())
            .map_err(|e| ExchangeError::AuthError(format!("Invalid nonce: {}", e)))?;
        let (key, signature, nonce) = self.signer.ws_login_params(nonce)?;
        let params = json!([key, signature, nonce]);

        match self.exchange(&mut session, "server.sign", &params).await {
            Ok(_) => {
                self.authenticated.store(true, Ordering::SeqCst);
                info!("real-time channel signed in");
                Ok(())
            }
            Err(ExchangeError::ApiError { code, message }) => Err(ExchangeError::AuthError(
                format!("server.sign rejected ({}): {}", code, message),
            )),
            Err(e) => Err(e),
        }
    }

    pub async fn close(&self) -> Result<(), ExchangeError> {
        let mut session = self.session.lock().await;
        self.mark_down();
        session.close().await
    }

    fn mark_down(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.authenticated.store(false, Ordering::SeqCst);
    }

    /// One authenticated call
    async fn call(&self, method: &str, params: Value) -> Result<Value, ExchangeError> {
        if !self.is_usable() {
            return Err(ExchangeError::AuthError(
                "real-time channel is not signed in".to_string(),
            ));
        }
        let mut session = self.session.lock().await;
        self.exchange(&mut session, method, &params).await
    }

    #[instrument(skip(self, session, params))]
    async fn exchange(
        &self,
        session: &mut W,
        method: &str,
        params: &Value,
    ) -> Result<Value, ExchangeError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let timeout = Duration::from_millis(session.config().request_timeout_ms);

        let outcome = tokio::time::timeout(timeout, async {
            if let Err(e) = session.send_request(id, method, params).await {
                return Err(e);
            }
            loop {
                match session.next_message().await {
                    Some(Ok(GateWsMessage::Response { id: got, result, error })) if got == id => {
                        return match error {
                            Some(err) => Err(ExchangeError::ApiError {
                                code: err.code,
                                message: err.message,
                            }),
                            None => Ok(result),
                        };
                    }
                    Some(Ok(GateWsMessage::Response { id: got, .. })) => {
                        debug!(expected = id, got, "dropping stale response");
                    }
                    Some(Ok(GateWsMessage::Update { method, .. })) => {
                        trace!(%method, "dropping push frame");
                    }
                    Some(Err(e)) => return Err(e),
                    None => {
                        return Err(ExchangeError::NetworkError(
                            "real-time channel closed".to_string(),
                        ))
                    }
                }
            }
        })
        .await;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if e.is_transport() && !matches!(e, ExchangeError::ApiError { .. }) {
                    self.mark_down();
                }
                Err(e)
            }
            Err(_) => {
                self.mark_down();
                Err(ExchangeError::ConnectionTimeout(format!(
                    "no response to {} within {:?}",
                    method, timeout
                )))
            }
        }
    }
}

#[async_trait]
impl<W: WsSession<GateCodec>> RealtimeChannel for GateWsChannel<W> {
    fn is_usable(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.authenticated.load(Ordering::SeqCst)
    }

    async fn query_orders(
        &self,
        market: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Value, ExchangeError> {
        self.call("order.query", json!([market, offset, limit])).await
    }

    async fn balances(&self, currencies: &[String]) -> Result<Value, ExchangeError> {
        self.call("balance.query", json!(currencies)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::WsConfig;
    use std::collections::VecDeque;
    use tokio_tungstenite::tungstenite::Message;

    /// Session answering every request from a script of (result, error) replies
    struct ScriptedSession {
        config: WsConfig,
        connected: bool,
        replies: VecDeque<Result<Value, (i32, String)>>,
        pending: VecDeque<GateWsMessage>,
        sent: Vec<(String, Value)>,
    }

    impl ScriptedSession {
        fn new(replies: Vec<Result<Value, (i32, String)>>) -> Self {
            Self {
                config: WsConfig::default(),
                connected: false,
                replies: replies.into(),
                pending: VecDeque::new(),
                sent: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl WsSession<GateCodec> for ScriptedSession {
        async fn connect(&mut self) -> Result<(), ExchangeError> {
            self.connected = true;
            Ok(())
        }

        async fn send_raw(&mut self, _msg: Message) -> Result<(), ExchangeError> {
            Ok(())
        }

        async fn next_raw(&mut self) -> Option<Result<Message, ExchangeError>> {
            None
        }

        async fn close(&mut self) -> Result<(), ExchangeError> {
            self.connected = false;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn send_request(
            &mut self,
            id: u64,
            method: &str,
            params: &Value,
        ) -> Result<(), ExchangeError> {
            self.sent.push((method.to_string(), params.clone()));
            // a push and a stale response arrive before the answer
            self.pending.push_back(GateWsMessage::Update {
                method: "ticker.update".to_string(),
                params: Value::Null,
            });
            self.pending.push_back(GateWsMessage::Response {
                id: id + 1000,
                result: Value::Null,
                error: None,
            });
            let reply = self.replies.pop_front().unwrap_or(Ok(Value::Null));
            self.pending.push_back(match reply {
                Ok(result) => GateWsMessage::Response {
                    id,
                    result,
                    error: None,
                },
                Err((code, message)) => GateWsMessage::Response {
                    id,
                    result: Value::Null,
                    error: Some(crate::exchanges::gateio::codec::GateWsError { code, message }),
                },
            });
            Ok(())
        }

        async fn next_message(&mut self) -> Option<Result<GateWsMessage, ExchangeError>> {
            self.pending.pop_front().map(Ok)
        }

        fn config(&self) -> &WsConfig {
            &self.config
        }
    }

    fn signer() -> Arc<GateSigner> {
        Arc::new(GateSigner::new("key".to_string(), "secret".to_string()))
    }

    #[tokio::test]
    async fn test_usable_only_after_sign_in() {
        let channel = GateWsChannel::new(
            ScriptedSession::new(vec![Ok(json!({"status": "success"})), Ok(json!({}))]),
            signer(),
        );
        assert!(!channel.is_usable());

        channel.connect().await.unwrap();
        assert!(channel.is_usable());

        let balances = channel.balances(&[]).await.unwrap();
        assert_eq!(balances, json!({}));

        let session = channel.session.lock().await;
        assert_eq!(session.sent[0].0, "server.sign");
        assert_eq!(session.sent[0].1[0], "key");
        assert_eq!(session.sent[1], ("balance.query".to_string(), json!([])));
    }

    #[tokio::test]
    async fn test_rejected_sign_in_leaves_channel_unusable() {
        let channel = GateWsChannel::new(
            ScriptedSession::new(vec![Err((6, "invalid signature".to_string()))]),
            signer(),
        );

        let err = channel.connect().await.unwrap_err();
        assert!(matches!(err, ExchangeError::AuthError(_)));
        assert!(!channel.is_usable());

        let err = channel.query_orders("", 0, 100).await.unwrap_err();
        assert!(matches!(err, ExchangeError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_call_error_surfaces_as_api_error() {
        let channel = GateWsChannel::new(
            ScriptedSession::new(vec![Ok(Value::Null), Err((2, "invalid argument".to_string()))]),
            signer(),
        );
        channel.connect().await.unwrap();

        let err = channel.query_orders("EOS_USDT", 0, 100).await.unwrap_err();
        assert!(matches!(err, ExchangeError::ApiError { code: 2, .. }));
        assert!(channel.is_usable());
    }
}
