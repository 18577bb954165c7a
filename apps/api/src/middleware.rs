use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use ventra_core::{AppError, UserIdentity};

use crate::error::ApiResult;

const SUBJECT_HEADER: &str = "x-auth-subject";
const NAME_HEADER: &str = "x-auth-name";
const EMAIL_HEADER: &str = "x-auth-email";

/// Builds the caller identity from the headers the fronting proxy
/// injects after authenticating the request.
///
/// The API itself never validates credentials. Requests that reach it
/// without a subject header did not pass through the proxy and are
/// rejected outright.
pub async fn require_auth(mut request: Request, next: Next) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn identity_from_headers(headers: &HeaderMap) -> Option<UserIdentity> {
    let subject = header_value(headers, SUBJECT_HEADER)?;
    let display_name =
        header_value(headers, NAME_HEADER).unwrap_or_else(|| subject.clone());
    let email = header_value(headers, EMAIL_HEADER).unwrap_or_default();

    Some(UserIdentity::new(subject, display_name, email))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }

    Some(value.to_owned())
}
