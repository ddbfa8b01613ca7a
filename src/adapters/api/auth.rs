//! CLOB Authentication - L2 HMAC-SHA256 Request Signing
//!
//! Signs every authenticated CLOB API request with the API secret per the
//! Polymarket L2 scheme. Credentials come from environment variables
//! (POLY_API_KEY, POLY_API_SECRET, POLY_PASSPHRASE) via `config::Secrets`.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;

use crate::config::Secrets;

/// The five L2 headers attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct L2Headers {
    pub address: String,
    pub api_key: String,
    pub passphrase: String,
    pub timestamp: String,
    pub signature: String,
}

impl L2Headers {
    pub fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            ("POLY_ADDRESS", self.address.as_str()),
            ("POLY_API_KEY", self.api_key.as_str()),
            ("POLY_PASSPHRASE", self.passphrase.as_str()),
            ("POLY_TIMESTAMP", self.timestamp.as_str()),
            ("POLY_SIGNATURE", self.signature.as_str()),
        ]
    }
}

/// CLOB API authentication handler.
///
/// The secret is url-safe base64; it is decoded once at construction and
/// never sent in headers, only the computed signature is.
pub struct ClobAuth {
    /// Signer address, checksummed.
    address: String,
    api_key: String,
    /// Decoded API secret.
    secret: Vec<u8>,
    passphrase: String,
}

impl ClobAuth {
    /// Build from environment-provided secrets and the signer address.
    ///
    /// # Errors
    /// Fails if the API secret is not valid url-safe base64.
    pub fn new(secrets: &Secrets, address: impl Into<String>) -> Result<Self> {
        let secret = URL_SAFE
            .decode(secrets.api_secret.trim())
            .context("POLY_API_SECRET is not valid url-safe base64")?;

        Ok(Self {
            address: address.into(),
            api_key: secrets.api_key.clone(),
            secret,
            passphrase: secrets.api_passphrase.clone(),
        })
    }

    /// Get the API key for request headers.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current Unix timestamp in seconds (for signing).
    pub fn timestamp() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string()
    }

    /// Signature format: url-safe base64 of
    /// HMAC-SHA256(secret, timestamp + method + path + body).
    ///
    /// `path` excludes the query string.
    pub fn sign(&self, timestamp: &str, method: &str, path: &str, body: &str) -> String {
        let message = format!("{timestamp}{method}{path}{body}");
        let mac = hmac_sha256::HMAC::mac(message.as_bytes(), &self.secret);
        URL_SAFE.encode(mac)
    }

    /// Build all authentication headers for a CLOB request.
    pub fn headers(&self, method: &str, path: &str, body: &str) -> L2Headers {
        let timestamp = Self::timestamp();
        let signature = self.sign(&timestamp, method, path, body);
        L2Headers {
            address: self.address.clone(),
            api_key: self.api_key.clone(),
            passphrase: self.passphrase.clone(),
            timestamp,
            signature,
        }
    }
}

impl std::fmt::Debug for ClobAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClobAuth")
            .field("address", &self.address)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}
