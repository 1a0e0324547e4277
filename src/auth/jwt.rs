//! JWT Token Service
//!
//! Issues and verifies the signed identity tokens handed out at login.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Issuer stamped into every token and required on verification.
pub const TOKEN_ISSUER: &str = "event-listing-server";

/// JWT Claims structure containing user information and token metadata
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Stable user identifier
    pub sub: String,
    /// User email
    pub email: String,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
    /// Token issuer
    pub iss: String,
}

/// Returned for every token that must not be trusted.
///
/// Carries no detail on purpose: callers cannot tell a forged token from an
/// expired one.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid token")]
pub struct InvalidToken;

/// Source of the current time for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Anything able to turn a raw token into trusted claims.
pub trait VerifyToken: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, InvalidToken>;
}

/// JWT Service for token operations
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a new token service signing with `secret`, issuing tokens valid for `ttl`.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self> {
        if secret.is_empty() {
            bail!("JWT signing secret must not be empty");
        }
        if ttl <= Duration::zero() {
            bail!("token validity window must be positive, got {}s", ttl.num_seconds());
        }
        if Utc::now().checked_add_signed(ttl).is_none() {
            bail!("token validity window of {}s overflows the expiry timestamp", ttl.num_seconds());
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock in `verify`.
        validation.validate_exp = false;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            clock: Arc::new(SystemClock),
        })
    }

    /// Swap the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validity window of freshly issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a token for a user
    pub fn issue(&self, email: &str, subject_id: &str) -> Result<String> {
        let now = self.clock.now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .context("Token expiry overflows the timestamp range")?;

        let claims = Claims {
            sub: subject_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to encode JWT token")
    }

    /// Check signature, issuer and expiry, returning the claims only if all hold.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token failed decoding");
                InvalidToken
            })?
            .claims;

        if claims.exp <= claims.iat {
            tracing::debug!(sub = %claims.sub, "token expiry not after issue time");
            return Err(InvalidToken);
        }
        if self.clock.now().timestamp() >= claims.exp {
            tracing::debug!(sub = %claims.sub, exp = claims.exp, "token expired");
            return Err(InvalidToken);
        }

        Ok(claims)
    }
}

impl VerifyToken for TokenService {
    fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        TokenService::verify(self, token)
    }
}

#[cfg(test)]
pub mod test_clock {
    use super::*;
    use parking_lot::Mutex;

    /// Clock that only moves when told to.
    pub struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        pub fn new(start: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(start)))
        }

        pub fn advance(&self, by: Duration) {
            *self.0.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock()
        }
    }
}
