//! Password hashing and HS256 bearer tokens.
//!
//! Tokens are compact JWTs: `base64url(header).base64url(claims).base64url(sig)`
//! where `sig = HMAC-SHA256(secret, "header.claims")`. Only `HS256` is
//! accepted on verification.

use crate::error::{PosError, Result};
use crate::types::{BusinessType, Role};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// bcrypt work factor for stored passwords.
pub const DEFAULT_HASH_COST: u32 = bcrypt::DEFAULT_COST;
/// Cheapest bcrypt cost; intended for tests and fixtures.
pub const MIN_HASH_COST: u32 = 4;

/// Longest token lifetime honoured; larger settings are clamped.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    if password.len() < 4 {
        return Err(PosError::Validation(
            "password must be at least 4 characters".to_string(),
        ));
    }
    bcrypt::hash(password, cost).map_err(|e| PosError::Hash(e.to_string()))
}

/// Constant-time check of `password` against a stored bcrypt hash.
/// A malformed hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// 32 random bytes, hex encoded.
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub business_type: BusinessType,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

// ---------------------------------------------------------------------------
// TokenSigner
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    /// `ttl_hours` is clamped to `1..=MAX_TOKEN_TTL_HOURS`.
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let hours = ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS);
        Self {
            key: secret.as_bytes().to_vec(),
            ttl: Duration::try_hours(hours).unwrap_or_else(|| Duration::hours(1)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token valid from now for the configured TTL.
    pub fn issue(
        &self,
        user_id: &str,
        username: &str,
        business_type: BusinessType,
        role: Role,
    ) -> Result<(String, Claims)> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            business_type,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String> {
        let header = URL_SAFE_NO_PAD.encode(HEADER);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signing_input = format!("{header}.{payload}");
        let sig = URL_SAFE_NO_PAD.encode(self.mac(signing_input.as_bytes())?.finalize().into_bytes());
        Ok(format!("{signing_input}.{sig}"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let invalid = || PosError::Unauthorized("invalid token".to_string());

        let mut parts = token.trim().split('.');
        let (Some(header), Some(payload), Some(sig), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let header_bytes = URL_SAFE_NO_PAD.decode(header).map_err(|_| invalid())?;
        let parsed: Header = serde_json::from_slice(&header_bytes).map_err(|_| invalid())?;
        if parsed.alg != "HS256" {
            return Err(invalid());
        }

        let sig_bytes = URL_SAFE_NO_PAD.decode(sig).map_err(|_| invalid())?;
        let signing_input = format!("{header}.{payload}");
        self.mac(signing_input.as_bytes())?
            .verify_slice(&sig_bytes)
            .map_err(|_| invalid())?;

        let payload_bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
        let claims: Claims = serde_json::from_slice(&payload_bytes).map_err(|_| invalid())?;
        if claims.exp <= now.timestamp() {
            return Err(PosError::Unauthorized("token expired".to_string()));
        }
        Ok(claims)
    }

    fn mac(&self, data: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| PosError::Unauthorized(format!("bad signing key: {e}")))?;
        mac.update(data);
        Ok(mac)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
