// Authorization policy middleware for protected routes

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{error::AuthError, token::TokenService};
use crate::error::AppError;

/// Extract the raw token from an `Authorization: Bearer <token>` header
///
/// The scheme name is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let (scheme, token) = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    Some(token.trim()).filter(|token| !token.is_empty())
}

/// Caller identity taken from a verified bearer token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Verify the request's bearer token and build the caller identity
    pub fn from_headers(headers: &HeaderMap, tokens: &TokenService) -> Result<Self, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::InvalidToken)?;
        let claims = tokens.verify(token)?;

        Ok(Self {
            user_id: claims.user_id()?,
            username: claims.unique_name,
            roles: claims.role,
        })
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already verified by the policy layer
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        let tokens = Arc::<TokenService>::from_ref(state);
        Ok(Self::from_headers(&parts.headers, &tokens)?)
    }
}

/// Requirement an endpoint places on its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Any valid bearer token
    Authenticated,
    /// A valid bearer token carrying this role claim
    Role(String),
}

impl Policy {
    pub fn role(name: impl Into<String>) -> Self {
        Policy::Role(name.into())
    }

    /// Check a verified caller against the policy
    pub fn evaluate(&self, user: &AuthenticatedUser) -> Result<(), AuthError> {
        match self {
            Policy::Authenticated => Ok(()),
            Policy::Role(role) if user.has_role(role) => Ok(()),
            Policy::Role(role) => Err(AuthError::Forbidden(role.clone())),
        }
    }
}

/// State handed to `enforce_policy` for one group of routes
#[derive(Clone)]
pub struct PolicyGate {
    tokens: Arc<TokenService>,
    policy: Policy,
}

impl PolicyGate {
    pub fn new(tokens: Arc<TokenService>, policy: Policy) -> Self {
        Self { tokens, policy }
    }
}

/// Route-layer middleware that runs the policy check before the handler
///
/// On success the caller is stored in the request extensions, where the
/// `AuthenticatedUser` extractor picks it up.
pub async fn enforce_policy(
    State(gate): State<PolicyGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let endpoint = request.uri().path().to_string();

    let user = AuthenticatedUser::from_headers(request.headers(), &gate.tokens).map_err(|e| {
        warn!("Rejected unauthenticated request to {}", endpoint);
        e
    })?;

    gate.policy.evaluate(&user).map_err(|e| {
        warn!(
            "Authorization failed: user_id={}, policy={:?}, endpoint={}",
            user.user_id, gate.policy, endpoint
        );
        e
    })?;

    debug!("Authorization successful: user_id={}, endpoint={}", user.user_id, endpoint);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
