// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Signed session token codec.
//!
//! A token is `base64(claims_json) "." base64(hmac_sha256(claims_json, secret))`
//! using the standard, padded base64 alphabet. Nothing is stored server-side;
//! integrity comes from the MAC and lifetime from the `exp` claim.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use super::{Claims, Identity};
use crate::error::{ApiError, ApiResult};

type HmacSha256 = Hmac<Sha256>;

/// Separator between the claims and signature segments.
const SEGMENT_SEPARATOR: char = '.';

/// Recommended minimum secret length in bytes.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

/// Longest configurable default token lifetime (ten years).
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 86400;

// =============================================================================
// TokenError
// =============================================================================

/// Reasons a token is rejected.
///
/// Variants are checked in declaration order and the first failure wins.
/// Callers outside this crate only ever see a generic 401; the variant is
/// for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not two segments, or the claims segment is not base64.
    #[error("invalid token format")]
    InvalidFormat,

    /// The signature does not match the claims.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token is past its expiry.
    #[error("token has expired")]
    Expired,

    /// The signed payload is not a valid claims document.
    #[error("malformed token claims")]
    MalformedClaims,
}

impl TokenError {
    /// Returns a short tag for structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenError::InvalidFormat => "invalid_format",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
            TokenError::MalformedClaims => "malformed_claims",
        }
    }
}

// =============================================================================
// TokenConfig
// =============================================================================

/// Token signing configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Secret key for signing tokens.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Default token lifetime in seconds.
    pub ttl_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by user
            ttl_secs: 86400,       // 24 hours
        }
    }
}

impl TokenConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the default token lifetime in whole seconds.
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Returns the default token lifetime.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        if self.secret.is_empty() {
            return Err(ApiError::internal("Token secret is not configured"));
        }
        if self.ttl_secs == 0 {
            return Err(ApiError::internal("Token TTL must be positive"));
        }
        if self.ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ApiError::internal("Token TTL out of range"));
        }
        if self.secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = self.secret.len(),
                "Token secret is shorter than recommended ({} bytes)",
                RECOMMENDED_SECRET_LEN
            );
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

// =============================================================================
// TokenManager
// =============================================================================

/// Issues and validates session tokens.
///
/// Holds the process secret. Cloning is cheap and every clone shares the
/// same key; nothing in here is mutated after construction.
#[derive(Clone)]
pub struct TokenManager {
    secret: Arc<[u8]>,
    default_ttl: Duration,
}

impl TokenManager {
    /// Creates a new token manager with the given configuration.
    pub fn new(config: TokenConfig) -> ApiResult<Self> {
        config.validate()?;

        Ok(Self {
            secret: Arc::from(config.secret.into_bytes()),
            default_ttl: Duration::from_secs(config.ttl_secs),
        })
    }

    /// Returns the default token lifetime.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issues a token for an identity using the configured lifetime.
    pub fn issue_token(&self, identity: &Identity) -> ApiResult<String> {
        self.generate_token(identity, self.default_ttl)
    }

    /// Issues a token for an identity, valid for `ttl` from now.
    pub fn generate_token(&self, identity: &Identity, ttl: Duration) -> ApiResult<String> {
        if ttl.is_zero() {
            return Err(ApiError::internal("Token TTL must be positive"));
        }
        let claims = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Claims::new(identity, ttl))
            .ok_or_else(|| ApiError::internal("Token TTL out of range"))?;

        self.sign_claims(&claims)
    }

    /// Encodes and signs a prepared set of claims.
    ///
    /// The same claims and secret always produce the same token.
    pub fn sign_claims(&self, claims: &Claims) -> ApiResult<String> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| ApiError::internal(format!("Failed to encode claims: {}", e)))?;

        let mut mac = self.mac().map_err(|_| ApiError::internal("Invalid signing key"))?;
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}{}{}",
            STANDARD.encode(&payload),
            SEGMENT_SEPARATOR,
            STANDARD.encode(signature)
        ))
    }

    /// Validates a token against the current time.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_token_at(token, Utc::now())
    }

    /// Validates a token against an explicit clock reading.
    ///
    /// The signature is verified before any claim field is looked at.
    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut segments = token.split(SEGMENT_SEPARATOR);
        let (claims_b64, signature_b64) = match (segments.next(), segments.next(), segments.next()) {
            (Some(claims), Some(signature), None) => (claims, signature),
            _ => return Err(TokenError::InvalidFormat),
        };

        let payload = STANDARD
            .decode(claims_b64)
            .map_err(|_| TokenError::InvalidFormat)?;

        let signature = STANDARD
            .decode(signature_b64)
            .map_err(|_| TokenError::InvalidSignature)?;

        let mut mac = self.mac().map_err(|_| TokenError::InvalidSignature)?;
        mac.update(&payload);
        // Constant-time comparison.
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::MalformedClaims)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, hmac::digest::InvalidLength> {
        HmacSha256::new_from_slice(&self.secret)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("secret", &"[REDACTED]")
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-testing";

    fn manager() -> TokenManager {
        TokenManager::new(TokenConfig::new(SECRET)).unwrap()
    }

    fn uploader() -> Identity {
        Identity::new("user_42", "Uma Uploader", "uma@example.com", Role::Uploader)
    }

    fn split(token: &str) -> (Vec<u8>, Vec<u8>) {
        let (claims, signature) = token.split_once('.').unwrap();
        (
            STANDARD.decode(claims).unwrap(),
            STANDARD.decode(signature).unwrap(),
        )
    }

    fn join(claims: &[u8], signature: &[u8]) -> String {
        format!("{}.{}", STANDARD.encode(claims), STANDARD.encode(signature))
    }

    #[test]
    fn test_generate_and_validate_token() {
        let manager = manager();
        let identity = uploader();

        let token = manager.generate_token(&identity, Duration::from_secs(60)).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(Identity::from(claims), identity);
    }

    #[test]
    fn test_token_shape() {
        let token = manager().issue_token(&uploader()).unwrap();

        assert_eq!(token.matches('.').count(), 1);
        let (claims, signature) = split(&token);
        assert_eq!(signature.len(), 32);
        let value: serde_json::Value = serde_json::from_slice(&claims).unwrap();
        assert_eq!(value["user_id"], "user_42");
        assert_eq!(value["role"], "uploader");
    }

    #[test]
    fn test_signing_is_deterministic() {
        let manager = manager();
        let claims = Claims::new(&uploader(), chrono::Duration::minutes(5)).unwrap();

        assert_eq!(
            manager.sign_claims(&claims).unwrap(),
            manager.sign_claims(&claims).unwrap()
        );
    }

    #[test]
    fn test_expired_at_boundary() {
        let manager = manager();
        let issued = Utc::now();
        let claims = Claims::issued_at(&uploader(), issued, chrono::Duration::seconds(30)).unwrap();
        let token = manager.sign_claims(&claims).unwrap();

        assert!(manager
            .validate_token_at(&token, issued + chrono::Duration::seconds(29))
            .is_ok());
        assert_eq!(
            manager.validate_token_at(&token, issued + chrono::Duration::seconds(30)),
            Err(TokenError::Expired)
        );
        assert_eq!(
            manager.validate_token_at(&token, issued + chrono::Duration::hours(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_short_lived_token_expires() {
        let manager = manager();
        let token = manager.generate_token(&uploader(), Duration::from_secs(1)).unwrap();

        assert!(manager.validate_token(&token).is_ok());
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(manager.validate_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let result = manager().generate_token(&uploader(), Duration::ZERO);
        assert!(matches!(result, Err(ApiError::Internal { .. })));
    }

    #[test]
    fn test_oversized_ttl_is_an_error() {
        let manager = manager();

        for ttl in [Duration::from_secs(10_000_000_000_000), Duration::MAX] {
            let result = manager.generate_token(&uploader(), ttl);
            assert!(matches!(result, Err(ApiError::Internal { .. })), "{:?}", ttl);
        }
    }

    #[test]
    fn test_default_ttl_bounds() {
        let config = TokenConfig::new(SECRET).with_ttl_secs(MAX_TOKEN_TTL_SECS);
        let manager = TokenManager::new(config).unwrap();
        assert_eq!(manager.default_ttl(), Duration::from_secs(MAX_TOKEN_TTL_SECS));
        assert!(manager.issue_token(&uploader()).is_ok());

        let config = TokenConfig::new(SECRET).with_ttl_secs(10_000_000_000_000);
        assert!(TokenManager::new(config).is_err());
    }

    #[test]
    fn test_signature_byte_flip() {
        let manager = manager();
        let token = manager.issue_token(&uploader()).unwrap();
        let (claims, signature) = split(&token);

        for i in 0..signature.len() {
            let mut tampered = signature.clone();
            tampered[i] ^= 0x01;
            assert_eq!(
                manager.validate_token(&join(&claims, &tampered)),
                Err(TokenError::InvalidSignature),
                "byte {}",
                i
            );
        }
    }

    #[test]
    fn test_signature_text_tamper() {
        let manager = manager();
        let token = manager.issue_token(&uploader()).unwrap();
        let (claims_b64, signature_b64) = token.split_once('.').unwrap();

        for i in 0..signature_b64.len() {
            let mut chars: Vec<char> = signature_b64.chars().collect();
            chars[i] = if chars[i] == 'A' { 'B' } else { 'A' };
            let tampered: String = chars.into_iter().collect();

            assert_eq!(
                manager.validate_token(&format!("{}.{}", claims_b64, tampered)),
                Err(TokenError::InvalidSignature),
                "char {}",
                i
            );
        }
    }

    #[test]
    fn test_claims_byte_flip() {
        let manager = manager();
        let token = manager.issue_token(&uploader()).unwrap();
        let (claims, signature) = split(&token);

        for i in 0..claims.len() {
            let mut tampered = claims.clone();
            tampered[i] ^= 0x01;
            assert_eq!(
                manager.validate_token(&join(&tampered, &signature)),
                Err(TokenError::InvalidSignature),
                "byte {}",
                i
            );
        }
    }

    #[test]
    fn test_claims_text_tamper_never_succeeds() {
        let manager = manager();
        let token = manager.issue_token(&uploader()).unwrap();
        let (claims_b64, signature_b64) = token.split_once('.').unwrap();

        for i in 0..claims_b64.len() {
            let mut bytes = claims_b64.as_bytes().to_vec();
            bytes[i] ^= 0x01;
            let tampered = String::from_utf8_lossy(&bytes).into_owned();

            assert!(
                manager
                    .validate_token(&format!("{}.{}", tampered, signature_b64))
                    .is_err(),
                "char {}",
                i
            );
        }
    }

    #[test]
    fn test_wrong_secret() {
        let other = TokenManager::new(TokenConfig::new("another-secret-that-is-also-long-enough")).unwrap();
        let token = other.issue_token(&uploader()).unwrap();

        assert_eq!(manager().validate_token(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_invalid_format() {
        let manager = manager();

        assert_eq!(manager.validate_token(""), Err(TokenError::InvalidFormat));
        assert_eq!(manager.validate_token("abc"), Err(TokenError::InvalidFormat));
        assert_eq!(manager.validate_token("a.b.c"), Err(TokenError::InvalidFormat));
        assert_eq!(manager.validate_token("!!!.AAAA"), Err(TokenError::InvalidFormat));
    }

    #[test]
    fn test_undecodable_signature() {
        let token = manager().issue_token(&uploader()).unwrap();
        let (claims_b64, _) = token.split_once('.').unwrap();

        assert_eq!(
            manager().validate_token(&format!("{}.!!!", claims_b64)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_signed_garbage_is_malformed() {
        let manager = manager();
        let payload = br#"{"user_id":"x","role":"superuser"}"#;
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(payload);
        let signature = mac.finalize().into_bytes();

        assert_eq!(
            manager.validate_token(&join(payload, &signature)),
            Err(TokenError::MalformedClaims)
        );
    }

    #[test]
    fn test_missing_secret_rejected() {
        assert!(TokenManager::new(TokenConfig::default()).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = TokenConfig::new(SECRET);
        assert!(!format!("{:?}", config).contains(SECRET));
        assert!(!format!("{:?}", manager()).contains(SECRET));
    }
}
