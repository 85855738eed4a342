//! Access and refresh token issuing and verification.
//!
//! Both tokens are HS256-signed JWTs carrying [`Claims`]. They use separate
//! secrets, and refresh tokens additionally carry `type = "refresh"`, so a
//! token of one kind never verifies as the other.

use chrono::Utc;
use civic_core::error::CoreError;
use civic_core::expiry::parse_expiry_secs;
use civic_core::types::DbId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value of the `type` claim on refresh tokens.
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    pub email: String,
    /// Present only on refresh tokens.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    pub iat: i64,
    pub exp: i64,
    /// Unique per token, so two tokens minted in the same second still differ.
    pub jti: String,
}

/// Signing secrets and lifetimes for both token kinds.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

const DEFAULT_ACCESS_EXPIRY: &str = "15m";
const DEFAULT_REFRESH_EXPIRY: &str = "7d";

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                | Required | Default |
    /// |------------------------|----------|---------|
    /// | `JWT_ACCESS_SECRET`    | **yes**  | --      |
    /// | `JWT_REFRESH_SECRET`   | **yes**  | --      |
    /// | `ACCESS_TOKEN_EXPIRY`  | no       | `15m`   |
    /// | `REFRESH_TOKEN_EXPIRY` | no       | `7d`    |
    ///
    /// Expiry values use the `ms`/`s`/`m`/`h`/`d`/`w` suffix format.
    ///
    /// # Panics
    ///
    /// Panics if a secret is missing or empty, or an expiry does not parse.
    pub fn from_env() -> Self {
        Self {
            access_secret: required_secret("JWT_ACCESS_SECRET"),
            refresh_secret: required_secret("JWT_REFRESH_SECRET"),
            access_ttl_secs: expiry_from_env("ACCESS_TOKEN_EXPIRY", DEFAULT_ACCESS_EXPIRY),
            refresh_ttl_secs: expiry_from_env("REFRESH_TOKEN_EXPIRY", DEFAULT_REFRESH_EXPIRY),
        }
    }
}

fn required_secret(name: &str) -> String {
    let secret = std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set in the environment"));
    assert!(!secret.is_empty(), "{name} must not be empty");
    secret
}

fn expiry_from_env(name: &str, default: &str) -> i64 {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    parse_expiry_secs(&raw).unwrap_or_else(|e| panic!("{name}: {e}"))
}

/// An access/refresh token pair as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mint a fresh access and refresh token for `user_id`.
pub fn issue_token_pair(
    user_id: DbId,
    email: &str,
    config: &JwtConfig,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();

    let access = Claims {
        sub: user_id,
        email: email.to_string(),
        token_type: None,
        iat: now,
        exp: now + config.access_ttl_secs,
        jti: Uuid::new_v4().to_string(),
    };
    let refresh = Claims {
        sub: user_id,
        email: email.to_string(),
        token_type: Some(REFRESH_TOKEN_TYPE.to_string()),
        iat: now,
        exp: now + config.refresh_ttl_secs,
        jti: Uuid::new_v4().to_string(),
    };

    Ok(TokenPair {
        access_token: sign(&access, &config.access_secret)?,
        refresh_token: sign(&refresh, &config.refresh_secret)?,
    })
}

/// Verify an access token. Refresh tokens are rejected even when signed
/// with the access secret.
pub fn verify_access_token(token: &str, config: &JwtConfig) -> Result<Claims, CoreError> {
    let claims = decode_claims(token, &config.access_secret)?;
    if claims.token_type.is_some() {
        return Err(CoreError::invalid_token());
    }
    Ok(claims)
}

/// Verify a refresh token: refresh secret and `type = "refresh"` both required.
pub fn verify_refresh_token(token: &str, config: &JwtConfig) -> Result<Claims, CoreError> {
    let claims = decode_claims(token, &config.refresh_secret)?;
    if claims.token_type.as_deref() != Some(REFRESH_TOKEN_TYPE) {
        return Err(CoreError::invalid_token());
    }
    Ok(claims)
}

fn sign(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(), // HS256
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, CoreError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            CoreError::invalid_token()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn test_config() -> JwtConfig {
        JwtConfig {
            access_secret: "access-secret-that-is-long-enough".to_string(),
            refresh_secret: "refresh-secret-that-is-long-enough".to_string(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 3600,
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let config = test_config();
        let pair = issue_token_pair(42, "citizen@example.com", &config).unwrap();

        let claims = verify_access_token(&pair.access_token, &config).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "citizen@example.com");
        assert!(claims.token_type.is_none());
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn refresh_token_roundtrip() {
        let config = test_config();
        let pair = issue_token_pair(7, "a@b.com", &config).unwrap();

        let claims = verify_refresh_token(&pair.refresh_token, &config).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.token_type.as_deref(), Some(REFRESH_TOKEN_TYPE));
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn tokens_are_not_interchangeable() {
        let config = test_config();
        let pair = issue_token_pair(1, "a@b.com", &config).unwrap();

        assert_matches!(
            verify_access_token(&pair.refresh_token, &config),
            Err(CoreError::Unauthorized(_))
        );
        assert_matches!(
            verify_refresh_token(&pair.access_token, &config),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn refresh_claims_signed_with_access_secret_rejected() {
        let config = test_config();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            email: "a@b.com".into(),
            token_type: Some(REFRESH_TOKEN_TYPE.into()),
            iat: now,
            exp: now + 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = sign(&claims, &config.access_secret).unwrap();

        assert!(verify_access_token(&token, &config).is_err());
        assert!(verify_refresh_token(&token, &config).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let config = test_config();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            email: "a@b.com".into(),
            token_type: None,
            iat: now - 3600,
            exp: now - 1,
            jti: Uuid::new_v4().to_string(),
        };
        let token = sign(&claims, &config.access_secret).unwrap();

        let err = verify_access_token(&token, &config).unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Invalid or expired token");
    }

    #[test]
    fn wrong_secret_rejected() {
        let config = test_config();
        let pair = issue_token_pair(1, "a@b.com", &config).unwrap();

        let other = JwtConfig {
            access_secret: "a-completely-different-secret-value".into(),
            ..test_config()
        };
        assert!(verify_access_token(&pair.access_token, &other).is_err());
    }

    #[test]
    fn malformed_token_rejected() {
        assert!(verify_access_token("not.a.jwt", &test_config()).is_err());
        assert!(verify_refresh_token("", &test_config()).is_err());
    }

    #[test]
    fn consecutive_pairs_are_distinct() {
        let config = test_config();
        let first = issue_token_pair(1, "a@b.com", &config).unwrap();
        let second = issue_token_pair(1, "a@b.com", &config).unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert_ne!(first.refresh_token, second.refresh_token);
    }
}
