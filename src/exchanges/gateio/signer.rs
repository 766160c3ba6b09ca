use crate::core::errors::ExchangeError;
use crate::core::kernel::{SignatureResult, Signer};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha512;
use std::collections::HashMap;

type HmacSha512 = Hmac<Sha512>;

/// Gate.io v2 request signer.
///
/// REST: the form body is signed as sent, hex-encoded, in the `KEY`/`SIGN`
/// headers. Real-time: `server.sign` carries the base64 signature of the
/// nonce.
pub struct GateSigner {
    api_key: String,
    secret_key: Secret<String>,
}

impl GateSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key,
            secret_key: Secret::new(secret_key),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn mac(&self, payload: &[u8]) -> Result<Vec<u8>, ExchangeError> {
        let mut mac = HmacSha512::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .map_err(|e| ExchangeError::AuthError(format!("Failed to create HMAC: {}", e)))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Hex HMAC-SHA512 of a REST body
    pub fn sign_body(&self, body: &[u8]) -> Result<String, ExchangeError> {
        self.mac(body).map(hex::encode)
    }

    /// `server.sign` parameters: `[api_key, signature, nonce]`
    pub fn ws_login_params(&self, nonce: u64) -> Result<(String, String, u64), ExchangeError> {
        let signature = general_purpose::STANDARD.encode(self.mac(nonce.to_string().as_bytes())?);
        Ok((self.api_key.clone(), signature, nonce))
    }
}

impl Signer for GateSigner {
    fn sign_request(
        &self,
        _method: &str,
        _endpoint: &str,
        _query_string: &str,
        body: &[u8],
        _timestamp: u64,
    ) -> SignatureResult {
        if self.api_key.is_empty() || self.secret_key.expose_secret().is_empty() {
            return Err(ExchangeError::AuthError(
                "API credentials are not configured".to_string(),
            ));
        }

        let mut headers = HashMap::new();
        headers.insert("KEY".to_string(), self.api_key.clone());
        headers.insert("SIGN".to_string(), self.sign_body(body)?);
        Ok((headers, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_signature_is_hex_sha512() {
        let signer = GateSigner::new("key".to_string(), "secret".to_string());
        let (headers, params) = signer
            .sign_request("POST", "/api2/1/private/balances", "", b"", 0)
            .unwrap();

        assert_eq!(headers["KEY"], "key");
        assert_eq!(headers["SIGN"].len(), 128);
        assert!(headers["SIGN"].chars().all(|c| c.is_ascii_hexdigit()));
        assert!(params.is_empty());
    }

    #[test]
    fn test_signature_depends_on_body() {
        let signer = GateSigner::new("key".to_string(), "secret".to_string());
        let a = signer.sign_body(b"currencyPair=eth_btc").unwrap();
        let b = signer.sign_body(b"currencyPair=ltc_btc").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_ws_login_signature_is_base64() {
        let signer = GateSigner::new("key".to_string(), "secret".to_string());
        let (key, signature, nonce) = signer.ws_login_params(1_700_000_000_000).unwrap();

        assert_eq!(key, "key");
        assert_eq!(nonce, 1_700_000_000_000);
        let decoded = general_purpose::STANDARD.decode(signature).unwrap();
        assert_eq!(decoded.len(), 64);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let signer = GateSigner::new(String::new(), String::new());
        assert!(matches!(
            signer.sign_request("POST", "/", "", b"", 0),
            Err(ExchangeError::AuthError(_))
        ));
    }
}
