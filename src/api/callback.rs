use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};

use crate::{
    server::Completion,
    types::{CallbackFailure, CallbackResult},
};

const SUCCESS_PAGE: &str = "<h2>Authorization successful.</h2><p>You can close this window and return to the terminal.</p>";
const MISSING_CODE_PAGE: &str = "<h4>Authorization code not found.</h4>";
const DENIED_PAGE: &str = "<h4>Authorization was not granted.</h4><p>Return to the terminal for details.</p>";
const EXPIRED_PAGE: &str = "<h4>This login attempt has already finished.</h4>";

/// Handles the redirect from the authorization server.
///
/// Resolves the login attempt with the `code` query parameter, or with a
/// failure when the parameter is missing. A request arriving after the
/// attempt was resolved (by an earlier request or the timeout) gets
/// `410 Gone` and changes nothing.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    State(completion): State<Completion>,
) -> (StatusCode, Html<&'static str>) {
    let (result, status, page) = match (params.get("code"), params.get("error")) {
        (Some(code), _) if !code.is_empty() => (
            CallbackResult::Code(code.clone()),
            StatusCode::OK,
            SUCCESS_PAGE,
        ),
        (_, Some(reason)) => (
            CallbackResult::Failed(CallbackFailure::Denied(reason.clone())),
            StatusCode::BAD_REQUEST,
            DENIED_PAGE,
        ),
        _ => (
            CallbackResult::Failed(CallbackFailure::MissingCode),
            StatusCode::BAD_REQUEST,
            MISSING_CODE_PAGE,
        ),
    };

    if !completion.complete(result).await {
        return (StatusCode::GONE, Html(EXPIRED_PAGE));
    }

    (status, Html(page))
}
