//! Who may see diagnostics.

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::Request;

use crate::config::AccessConfig;
use crate::diagnostics::DevelError;

/// Decides whether the caller of a request may view diagnostics.
///
/// An `Err` means the decision could not be made; callers treat it as
/// "not authorized".
pub trait Authorizer: Send + Sync {
    fn authorize(&self, request: &Request<Body>) -> Result<bool, DevelError>;
}

impl<F> Authorizer for F
where
    F: Fn(&Request<Body>) -> Result<bool, DevelError> + Send + Sync,
{
    fn authorize(&self, request: &Request<Body>) -> Result<bool, DevelError> {
        self(request)
    }
}

/// Evaluate an authorizer, failing closed.
pub fn is_authorized(authorizer: &dyn Authorizer, request: &Request<Body>) -> bool {
    match authorizer.authorize(request) {
        Ok(allowed) => allowed,
        Err(e) => {
            tracing::debug!(error = %e, "Authorization check failed, treating caller as unauthorized");
            false
        }
    }
}

/// Accepts callers presenting one of the configured bearer tokens.
#[derive(Debug, Clone)]
pub struct BearerTokenAuthorizer {
    tokens: Vec<String>,
}

impl BearerTokenAuthorizer {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        Self::new(config.tokens.clone())
    }
}

impl Authorizer for BearerTokenAuthorizer {
    fn authorize(&self, request: &Request<Body>) -> Result<bool, DevelError> {
        let Some(value) = request.headers().get(AUTHORIZATION) else {
            return Ok(false);
        };
        let value = value.to_str().map_err(|_| {
            DevelError::AuthorizationIndeterminate("authorization header is not ASCII".into())
        })?;
        let Some(token) = value.strip_prefix("Bearer ") else {
            return Ok(false);
        };
        Ok(self.tokens.iter().any(|t| t == token.trim()))
    }
}
