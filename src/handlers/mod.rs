pub mod checks;
pub mod tokens;
pub mod users;

use crate::auth;
use crate::error::ApiError;
use crate::server::request::RequestData;
use crate::server::response::{ContentKind, Reply};
use crate::server::AppState;

/// GET /ping - liveness probe, no auth.
pub async fn ping(request: &RequestData) -> Result<Reply, ApiError> {
    if request.method == "get" {
        Ok(Reply::status(200))
    } else {
        Err(ApiError::MethodNotAllowed)
    }
}

/// Fallback for paths outside the route table.
pub async fn not_found(_request: &RequestData) -> Result<Reply, ApiError> {
    Ok(Reply::status(404))
}

/// Reserved static-asset prefix. Asset delivery itself lives outside this
/// service; the API process only claims the path space.
pub async fn assets(request: &RequestData) -> Result<Reply, ApiError> {
    tracing::debug!(path = %request.path, "asset request outside API scope");
    Ok(Reply::raw(404, ContentKind::Plain, Vec::new()))
}

/// Extract the bearer token from the `token` header and verify it against
/// the claimed phone. Absent, expired and mismatched tokens all produce the
/// same 403.
pub(crate) async fn require_token(
    state: &AppState,
    request: &RequestData,
    phone: &str,
) -> Result<(), ApiError> {
    let token_id = request.header("token").unwrap_or_default();
    if auth::verify_token(state.storage.as_ref(), token_id, phone).await {
        Ok(())
    } else {
        Err(ApiError::auth(
            "Missing required token in header, or token is invalid",
        ))
    }
}
