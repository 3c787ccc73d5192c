//! # App Store Connect Token Provider
//!
//! Signs the bearer tokens the reporting API requires: a JWT with ES256
//! (ECDSA P-256) signing, the key id in the header and the issuer id as `iss`.
//!
//! Tokens live for 20 minutes, the API's ceiling. The signed value is cached
//! and reused until it expires. The check-and-regenerate step runs under a
//! mutex so concurrent callers share one regeneration.

use crate::config::IngestionConfig;
use crate::domain::errors::IngestionError;
use crate::domain::repositories::token_source::TokenSource;
use crate::secrets;
use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use p256::SecretKey;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Token lifetime in seconds (API maximum).
pub const TOKEN_LIFETIME_SECS: i64 = 20 * 60;

const AUDIENCE: &str = "appstoreconnect-v1";

/// JWT claims for App Store Connect
#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    iss: String, // Issuer id
    iat: i64,    // Issued at
    exp: i64,    // Expiration (iat + 20 minutes)
    aud: String, // Always "appstoreconnect-v1"
}

/// A signed token and the moment it stops being valid.
#[derive(Clone)]
pub struct AuthToken {
    pub value: String,
    pub expires_at_unix_seconds: i64,
}

impl AuthToken {
    pub fn is_fresh(&self, now: i64) -> bool {
        now < self.expires_at_unix_seconds
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"<REDACTED>")
            .field("expires_at_unix_seconds", &self.expires_at_unix_seconds)
            .finish()
    }
}

pub struct TokenProvider {
    key_id: String,
    issuer_id: String,
    encoding_key: EncodingKey,
    cache: Mutex<Option<AuthToken>>,
    issued: AtomicU64,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("key_id", &self.key_id)
            .field("issuer_id", &self.issuer_id)
            .field("encoding_key", &"<REDACTED>")
            .finish()
    }
}

fn unix_now() -> Result<i64, IngestionError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .map_err(|e| IngestionError::TokenGenerationFailed(format!("Failed to get current time: {}", e)))
}

impl TokenProvider {
    /// Create a provider from an in-memory PKCS#8 PEM key.
    pub fn new(key_id: &str, issuer_id: &str, private_key_pem: &str) -> Result<Self, IngestionError> {
        secrets::validate_key_format(private_key_pem)?;

        let secret_key = SecretKey::from_pkcs8_pem(private_key_pem).map_err(|e| {
            IngestionError::InvalidKeyFormat(format!(
                "Failed to parse EC private key from PEM: {}. Make sure the key is in PKCS#8 PEM format.",
                e
            ))
        })?;

        let der_bytes = secret_key
            .to_pkcs8_der()
            .map_err(|e| IngestionError::InvalidKeyFormat(format!("Failed to convert EC key to DER: {}", e)))?;

        Ok(Self {
            key_id: key_id.to_string(),
            issuer_id: issuer_id.to_string(),
            encoding_key: EncodingKey::from_ec_der(der_bytes.as_bytes()),
            cache: Mutex::new(None),
            issued: AtomicU64::new(0),
        })
    }

    /// Create a provider from configuration, loading the key from disk.
    pub fn from_config(config: &IngestionConfig) -> Result<Self, IngestionError> {
        let credentials = config.credentials()?;
        let pem = secrets::load_private_key(
            &credentials.private_key_path,
            config.install_root.as_deref(),
        )?;
        Self::new(&credentials.key_id, &credentials.issuer_id, &pem)
    }

    /// Returns a valid token, signing a new one if the cached token expired.
    pub async fn get_token(&self) -> Result<String, IngestionError> {
        self.get_token_at(unix_now()?).await
    }

    pub(crate) async fn get_token_at(&self, now: i64) -> Result<String, IngestionError> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let token = self.sign(now)?;
        let value = token.value.clone();
        *cache = Some(token);
        Ok(value)
    }

    /// Number of tokens signed so far.
    pub fn tokens_issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    fn sign(&self, now: i64) -> Result<AuthToken, IngestionError> {
        let claims = JwtClaims {
            iss: self.issuer_id.clone(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
            aud: AUDIENCE.to_string(),
        };

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());

        let value = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| IngestionError::TokenGenerationFailed(format!("Failed to encode JWT: {}", e)))?;

        let count = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        if count == 1 {
            info!("Signed App Store Connect token (kid {})", self.key_id);
        } else {
            debug!("Regenerated App Store Connect token #{}", count);
        }

        Ok(AuthToken {
            value,
            expires_at_unix_seconds: claims.exp,
        })
    }
}

#[async_trait]
impl TokenSource for TokenProvider {
    async fn token(&self) -> Result<String, IngestionError> {
        self.get_token().await
    }
}
