use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::access::is_authorized;
use crate::admin::AdminState;
use crate::http::RequestIdExt;

/// Admit only callers the diagnostic authorizer accepts.
///
/// Uses the same authorizer as the redirect page, so an indeterminate
/// decision is treated as a refusal here too.
pub async fn admin_auth_middleware(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if !is_authorized(state.authorizer.as_ref(), &request) {
        tracing::debug!(
            request_id = %request.request_id(),
            path = %request.uri().path(),
            "Admin request rejected"
        );
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
