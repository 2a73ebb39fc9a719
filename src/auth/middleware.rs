use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::app::AppState;
use crate::auth::models::{AuthenticatedUser, Claims, Role};
use crate::error::AppError;

/// Signs and verifies HS256 bearer tokens.
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Issue a token for the given identity, valid for `ttl`.
    pub fn issue(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify a token and return the identity it carries.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.into())
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {e}")))
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Reject API calls without a valid bearer token.
///
/// On success the caller's [`AuthenticatedUser`] is stored in the request
/// extensions. When no verifier is configured, auth is disabled and every
/// request passes through untouched.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(verifier) = state.token_verifier.as_deref() else {
        return Ok(next.run(request).await);
    };

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;

    let token = bearer_token(header)
        .ok_or_else(|| AppError::Unauthorized("Malformed authorization header".into()))?;

    let user = verifier.verify(token)?;
    tracing::debug!(user_id = %user.user_id, role = %user.role, "authenticated request");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
