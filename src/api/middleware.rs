//! Credential middleware for protected routes.
//!
//! Runs the authenticator and either forwards the verified claims through
//! request extensions or answers with the rejection.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::handlers::AppState;
use crate::auth::AuthOutcome;

/// Authenticates the request with the JWT credential type.
///
/// Nothing follows this handler in the chain, so a skip is answered the
/// same way as a failure.
pub async fn require_credentials(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match state.authenticator.authenticate(req.headers()) {
        AuthOutcome::Success(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        AuthOutcome::Failure(rejection) | AuthOutcome::Skip(rejection) => {
            rejection.into_response()
        }
    }
}
