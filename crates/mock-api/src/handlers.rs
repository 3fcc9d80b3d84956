//! Route handlers for the token issuer and the CRUD collections.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::state::{CreateError, Fault, MockState, StoredObject};
use super::{DUPLICATE_MESSAGE, INVALID_MESSAGE};

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

/// 400 with the given text, or a generic body under `WrongErrorText`.
fn bad_request(state: &MockState, message: &'static str) -> Response {
    if state.has_fault(Fault::WrongErrorText) {
        (StatusCode::BAD_REQUEST, "Bad Request").into_response()
    } else {
        (StatusCode::BAD_REQUEST, message).into_response()
    }
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> Response {
    not_found()
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    grant_type: String,
}

/// POST /token
pub(crate) async fn handle_token(
    State(state): State<Arc<MockState>>,
    Form(request): Form<TokenRequest>,
) -> Response {
    if request.grant_type != "password" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unsupported_grant_type"})),
        )
            .into_response();
    }

    match state.issue_token(&request.username, &request.password).await {
        Some(token) => {
            tracing::debug!(user = %request.username, "token issued");
            (
                StatusCode::OK,
                Json(json!({
                    "access_token": token,
                    "token_type": "bearer",
                    "expires_in": state.token_lifetime().as_secs(),
                })),
            )
                .into_response()
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant"})),
        )
            .into_response(),
    }
}

/// GET /{endpoint}
pub(crate) async fn handle_list(
    State(state): State<Arc<MockState>>,
    Path(endpoint): Path<String>,
) -> Response {
    let mut items = match state.list(&endpoint).await {
        Some(items) => items,
        None => return not_found(),
    };

    if state.has_fault(Fault::ReverseListing) {
        items.reverse();
    }

    let listing: Vec<Value> = items
        .iter()
        .map(|o| {
            let mut value = json!({"Id": o.id, "Name": o.name});
            if state.has_fault(Fault::ExtraListField) {
                value["CreatedAt"] = json!("2024-01-01T00:00:00Z");
            }
            value
        })
        .collect();

    (StatusCode::OK, Json(listing)).into_response()
}

/// POST /{endpoint}
///
/// The body is parsed by hand so that every malformed payload gets the same
/// plain-text 400, not an extractor rejection.
pub(crate) async fn handle_create(
    State(state): State<Arc<MockState>>,
    Path(endpoint): Path<String>,
    body: String,
) -> Response {
    if !state.serves(&endpoint) {
        return not_found();
    }

    let name = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("Name").and_then(|n| n.as_str()).map(str::to_string));
    let name = match name {
        Some(name) if !name.trim().is_empty() => name,
        _ if state.has_fault(Fault::AcceptMissingName) => String::new(),
        _ => return bad_request(&state, INVALID_MESSAGE),
    };

    match state.create(&endpoint, &name).await {
        Ok(object) => {
            tracing::debug!(%endpoint, id = object.id, "object created");
            if state.has_fault(Fault::OmitCreatedId) {
                StatusCode::OK.into_response()
            } else {
                (StatusCode::OK, Json(object)).into_response()
            }
        }
        Err(CreateError::Duplicate) => bad_request(&state, DUPLICATE_MESSAGE),
    }
}

/// GET /{endpoint}/id/{id}
pub(crate) async fn handle_get(
    State(state): State<Arc<MockState>>,
    Path((endpoint, id)): Path<(String, String)>,
) -> Response {
    let id = match id.parse::<i64>() {
        Ok(id) => id,
        Err(_) => return not_found(),
    };

    let mut object = match state.get(&endpoint, id).await {
        Some(object) => object,
        None => {
            if !answers_missing(&state, &endpoint, id).await {
                return not_found();
            }
            StoredObject {
                id,
                name: "ghost".to_string(),
            }
        }
    };

    if state.has_fault(Fault::WrongNameOnGet) {
        object.name = format!("{}_renamed", object.name);
    }
    (StatusCode::OK, Json(object)).into_response()
}

/// Under `FoundForMissingId`, ids this collection never issued are answered with 200.
async fn answers_missing(state: &MockState, endpoint: &str, id: i64) -> bool {
    state.has_fault(Fault::FoundForMissingId)
        && state.serves(endpoint)
        && !state.was_issued(endpoint, id).await
}

/// DELETE /{endpoint}/id/{id}
pub(crate) async fn handle_delete(
    State(state): State<Arc<MockState>>,
    Path((endpoint, id)): Path<(String, String)>,
) -> Response {
    if state.has_fault(Fault::RejectDeletes) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "delete unavailable").into_response();
    }

    let id = match id.parse::<i64>() {
        Ok(id) => id,
        Err(_) => return not_found(),
    };

    if state.delete(&endpoint, id).await {
        tracing::debug!(%endpoint, id, "object deleted");
        StatusCode::OK.into_response()
    } else if answers_missing(&state, &endpoint, id).await {
        StatusCode::OK.into_response()
    } else {
        not_found()
    }
}
