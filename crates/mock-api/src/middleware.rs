//! Bearer-token authentication middleware.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::state::{Fault, MockState};
use super::UNAUTHORIZED_MESSAGE;

/// Every request except POST /token must carry `Authorization: Bearer <token>`
/// with a token this server issued.
pub(crate) async fn auth_middleware(
    State(state): State<Arc<MockState>>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() == "/token" || state.has_fault(Fault::OpenAccess) {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let authorized = match token {
        Some(ref token) => state.is_valid_token(token).await,
        None => false,
    };

    if authorized {
        next.run(request).await
    } else {
        (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE).into_response()
    }
}
