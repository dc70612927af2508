// JWT token generation and validation service

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::models::{Role, User};
use crate::config::JwtConfig;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,          // user id
    pub unique_name: String,  // username
    #[serde(default)]
    pub role: Vec<String>,    // one entry per assigned role
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Parse the subject back into a user id
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }
}

/// Token service for JWT operations
///
/// Built once from configuration; holds only immutable key material.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_duration: i64, // in seconds
}

impl TokenService {
    /// Create a new TokenService from the signing configuration
    pub fn new(config: &JwtConfig) -> Self {
        Self::with_duration(&config.key, config.expiry_minutes * 60)
    }

    /// Create a TokenService with an explicit lifetime in seconds
    pub fn with_duration(secret: &str, token_duration: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_duration,
        }
    }

    /// Issue a signed token for a user and the roles resolved for them
    pub fn issue(&self, user: &User, roles: &[Role]) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            unique_name: user.username.clone(),
            role: roles.iter().map(|r| r.name.clone()).collect(),
            iat: now,
            exp: now + self.token_duration,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Verify signature and expiry
    ///
    /// Every failure collapses into `InvalidToken` so callers cannot tell a
    /// tampered token from an expired one.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejected: {:?}", e.kind());
                AuthError::InvalidToken
            })
    }
}
