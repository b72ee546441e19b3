//! Token Authenticator: HS256 access and refresh tokens
//!
//! Tokens carry only subject, issue/expiry times and their kind. Expiry is
//! checked against the injected clock rather than by the JWT library, so an
//! expired token can still be parsed for its subject.

use super::AuthError;
use async_trait::async_trait;
use gatehouse_applications::{AuthSource, Authenticator, RequestCredentials};
use gatehouse_core::{Identity, SharedClock, UserDirectory};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// JWT signing and verification keys
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
    pub token_type: TokenType,
}

/// Token type enumeration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Access + refresh pair issued at login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Issues, parses and validates signed tokens
pub struct TokenService {
    keys: Keys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: SharedClock,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            keys: Keys::new(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
            clock,
        }
    }

    /// Access token lifetime in seconds, as reported to clients
    pub fn access_expires_in(&self) -> u64 {
        self.access_ttl.as_secs()
    }

    fn issue(&self, identity: &Identity, token_type: TokenType, ttl: Duration) -> Result<String, AuthError> {
        let iat = self.clock.unix_now();
        let claims = Claims {
            sub: identity.subject.clone(),
            iat,
            exp: iat + ttl.as_secs() as i64,
            token_type,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding).map_err(|e| {
            warn!("Failed to encode JWT token: {}", e);
            AuthError::TokenCreation
        })
    }

    pub fn issue_access_token(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue(identity, TokenType::Access, self.access_ttl)
    }

    pub fn issue_refresh_token(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue(identity, TokenType::Refresh, self.refresh_ttl)
    }

    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(identity)?,
            refresh_token: self.issue_refresh_token(identity)?,
            token_type: "Bearer",
            expires_in: self.access_expires_in(),
        })
    }

    /// Verify signature and structure only; expiry is ignored
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token verification failed: {}", e);
                AuthError::TokenMalformed
            })
    }

    pub fn parse_subject(&self, token: &str) -> Result<String, AuthError> {
        self.decode(token).map(|claims| claims.sub)
    }

    pub fn is_refresh_kind(&self, token: &str) -> bool {
        self.decode(token)
            .is_ok_and(|claims| claims.token_type == TokenType::Refresh)
    }

    /// Full check against a live identity, reporting why it failed
    pub fn check(&self, token: &str, expected: &Identity) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if self.clock.unix_now() > claims.exp {
            return Err(AuthError::TokenExpired);
        }
        if claims.sub != expected.subject {
            return Err(AuthError::TokenMalformed);
        }
        if !expected.status.is_active() {
            return Err(AuthError::AccountNotActive);
        }
        Ok(claims)
    }

    /// Signature ok, not expired, subject matches and the account is active
    pub fn validate(&self, token: &str, expected: &Identity) -> bool {
        self.check(token, expected).is_ok()
    }
}

/// Resolves the caller from an `Authorization: Bearer` access token
pub struct TokenAuthenticator {
    tokens: Arc<TokenService>,
    directory: Arc<dyn UserDirectory>,
}

impl TokenAuthenticator {
    pub fn new(tokens: Arc<TokenService>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { tokens, directory }
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    fn source(&self) -> AuthSource {
        AuthSource::Token
    }

    async fn authenticate(&self, credentials: &RequestCredentials) -> Option<Identity> {
        let token = credentials.bearer.as_deref()?;
        let claims = self.tokens.decode(token).ok()?;
        if claims.token_type != TokenType::Access {
            debug!(subject = %claims.sub, "Refresh token presented as bearer");
            return None;
        }

        let account = match self.directory.find_by_username(&claims.sub).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                debug!(subject = %claims.sub, "Token subject no longer exists");
                return None;
            }
            Err(e) => {
                warn!(subject = %claims.sub, error = %e, "Token subject lookup failed");
                return None;
            }
        };

        let identity = account.identity();
        match self.tokens.check(token, &identity) {
            Ok(_) => Some(identity),
            Err(e) => {
                debug!(subject = %identity.subject, reason = %e, "Bearer token rejected");
                None
            }
        }
    }
}
