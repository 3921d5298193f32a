use crate::auth;
use crate::error::ApiError;
use crate::models::check::{parse_success_codes, parse_timeout_seconds, Check, CheckMethod, Protocol};
use crate::models::token::Token;
use crate::models::user::User;
use crate::server::request::RequestData;
use crate::server::response::Reply;
use crate::server::AppState;
use crate::storage::{Category, StorageError};

use super::require_token;

/// Method-routed entry point for the `checks` path.
pub async fn resource(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    match request.method.as_str() {
        "post" => post(state, request).await,
        "get" => get(state, request).await,
        "put" => put(state, request).await,
        "delete" => delete(state, request).await,
        _ => Err(ApiError::MethodNotAllowed),
    }
}

/// Resolve the owner of the request from its bearer token. Absent, expired
/// and unparseable tokens all yield the same 403.
async fn owner_from_token(state: &AppState, request: &RequestData) -> Result<Token, ApiError> {
    let denied = || {
        ApiError::auth("Missing required token in header, or token is invalid")
    };
    let token_id = request.header("token").unwrap_or_default();
    let value = match state.storage.read(Category::Tokens, token_id).await {
        Ok(value) => value,
        Err(StorageError::NotFound) => return Err(denied()),
        Err(err) => {
            tracing::error!(error = %err, "failed to read token record");
            return Err(ApiError::internal("Could not look up the request token"));
        }
    };
    let token: Token = serde_json::from_value(value).map_err(|_| denied())?;
    if token.is_expired() {
        return Err(denied());
    }
    Ok(token)
}

/// POST /checks - create a monitored endpoint for the token's owner.
///
/// The owning user is resolved from the bearer token; a phone supplied in
/// the payload is ignored. Creation appends the new id to the owner's
/// `checks` list, and that append failing deletes the just-created check so
/// the two records never diverge.
pub async fn post(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let protocol = request
        .payload_str("protocol")
        .and_then(Protocol::parse);
    let url = request.payload_str("url");
    let method = request.payload_str("method").and_then(CheckMethod::parse);
    let success_codes = parse_success_codes(request.payload.get("successCodes"));
    let timeout_seconds = parse_timeout_seconds(request.payload.get("timeoutSeconds"));

    let (Some(protocol), Some(url), Some(method), Some(success_codes), Some(timeout_seconds)) =
        (protocol, url, method, success_codes, timeout_seconds)
    else {
        return Err(ApiError::validation(
            "Missing required inputs, or inputs are invalid",
        ));
    };

    let token = owner_from_token(state, request).await?;
    let phone = token.phone;

    // Serialize mutations of this user's check list
    let lock = state.locks.for_phone(&phone);
    let _guard = lock.lock().await;

    let mut user: User = match state.storage.read(Category::Users, &phone).await {
        Ok(value) => serde_json::from_value(value)?,
        Err(StorageError::NotFound) => {
            return Err(ApiError::auth(
                "Missing required token in header, or token is invalid",
            ))
        }
        Err(err) => {
            tracing::error!(%phone, error = %err, "failed to read user record");
            return Err(ApiError::internal("Could not look up the token's user"));
        }
    };

    if user.checks.len() >= state.config.max_checks {
        return Err(ApiError::quota_exceeded(format!(
            "The user already has the maximum number of checks ({})",
            state.config.max_checks
        )));
    }

    let check = Check {
        id: auth::random_id(Check::ID_LEN),
        user_phone: phone.clone(),
        protocol,
        url: url.to_string(),
        method,
        success_codes,
        timeout_seconds,
    };

    if let Err(err) = state
        .storage
        .create(Category::Checks, &check.id, serde_json::to_value(&check)?)
        .await
    {
        tracing::error!(%phone, error = %err, "failed to create check record");
        return Err(ApiError::internal("Could not create the new check"));
    }

    user.checks.push(check.id.clone());
    if let Err(err) = state
        .storage
        .update(Category::Users, &phone, serde_json::to_value(&user)?)
        .await
    {
        tracing::error!(%phone, check = %check.id, error = %err, "failed to append check to user");
        // Compensate so the check does not outlive its listing
        if let Err(cleanup) = state.storage.delete(Category::Checks, &check.id).await {
            tracing::error!(check = %check.id, error = %cleanup, "orphaned check left behind");
        }
        return Err(ApiError::internal("Could not update the user with the new check"));
    }

    Ok(Reply::ok(serde_json::to_value(&check)?))
}

fn parse_check_id(id: Option<&str>) -> Option<&str> {
    id.map(str::trim).filter(|id| id.len() == Check::ID_LEN)
}

/// GET /checks?id= - fetch a check. Authorization is against the stored
/// owner, never a caller-supplied phone.
pub async fn get(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let id = parse_check_id(request.query_param("id"))
        .ok_or_else(|| ApiError::validation("Missing required field"))?;

    let check: Check = match state.storage.read(Category::Checks, id).await {
        Ok(value) => serde_json::from_value(value)?,
        Err(StorageError::NotFound) => {
            return Err(ApiError::not_found("The specified check does not exist"))
        }
        Err(err) => {
            tracing::error!(check = %id, error = %err, "failed to read check record");
            return Err(ApiError::internal("Could not look up the specified check"));
        }
    };

    require_token(state, request, &check.user_phone).await?;
    Ok(Reply::ok(serde_json::to_value(&check)?))
}

/// PUT /checks - update any subset of the mutable fields.
pub async fn put(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let id = parse_check_id(request.payload_str("id"))
        .ok_or_else(|| ApiError::validation("Missing required field"))?;

    let protocol = request.payload_str("protocol").and_then(Protocol::parse);
    let url = request.payload_str("url");
    let method = request.payload_str("method").and_then(CheckMethod::parse);
    let success_codes = parse_success_codes(request.payload.get("successCodes"));
    let timeout_seconds = parse_timeout_seconds(request.payload.get("timeoutSeconds"));

    if protocol.is_none()
        && url.is_none()
        && method.is_none()
        && success_codes.is_none()
        && timeout_seconds.is_none()
    {
        return Err(ApiError::validation("Missing fields to update"));
    }

    let mut check: Check = match state.storage.read(Category::Checks, id).await {
        Ok(value) => serde_json::from_value(value)?,
        Err(StorageError::NotFound) => {
            return Err(ApiError::validation("Check ID did not exist"))
        }
        Err(err) => {
            tracing::error!(check = %id, error = %err, "failed to read check record");
            return Err(ApiError::internal("Could not look up the specified check"));
        }
    };

    require_token(state, request, &check.user_phone).await?;

    if let Some(protocol) = protocol {
        check.protocol = protocol;
    }
    if let Some(url) = url {
        check.url = url.to_string();
    }
    if let Some(method) = method {
        check.method = method;
    }
    if let Some(success_codes) = success_codes {
        check.success_codes = success_codes;
    }
    if let Some(timeout_seconds) = timeout_seconds {
        check.timeout_seconds = timeout_seconds;
    }

    match state
        .storage
        .update(Category::Checks, id, serde_json::to_value(&check)?)
        .await
    {
        Ok(()) => Ok(Reply::status(200)),
        Err(err) => {
            tracing::error!(check = %id, error = %err, "failed to update check record");
            Err(ApiError::internal("Could not update the check"))
        }
    }
}

/// DELETE /checks?id= - remove a check and unlist it from its owner.
///
/// A check id missing from the owner's list is an inconsistency between the
/// two records and is surfaced as an internal error, not treated as a no-op.
pub async fn delete(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let id = parse_check_id(request.query_param("id"))
        .ok_or_else(|| ApiError::validation("Missing required field"))?;

    let check: Check = match state.storage.read(Category::Checks, id).await {
        Ok(value) => serde_json::from_value(value)?,
        Err(StorageError::NotFound) => {
            return Err(ApiError::validation("The specified check ID does not exist"))
        }
        Err(err) => {
            tracing::error!(check = %id, error = %err, "failed to read check record");
            return Err(ApiError::internal("Could not look up the specified check"));
        }
    };

    require_token(state, request, &check.user_phone).await?;

    let lock = state.locks.for_phone(&check.user_phone);
    let _guard = lock.lock().await;

    if let Err(err) = state.storage.delete(Category::Checks, id).await {
        tracing::error!(check = %id, error = %err, "failed to delete check record");
        return Err(ApiError::internal("Could not delete the check data"));
    }

    let mut user: User = match state.storage.read(Category::Users, &check.user_phone).await {
        Ok(value) => serde_json::from_value(value)?,
        Err(err) => {
            tracing::error!(phone = %check.user_phone, error = %err, "owner lookup failed after check delete");
            return Err(ApiError::internal(
                "Could not find the user who created the check, so could not \
                 remove the check from the list of checks on their user object",
            ));
        }
    };

    match user.checks.iter().position(|c| c == id) {
        Some(index) => {
            user.checks.remove(index);
        }
        None => {
            tracing::error!(phone = %check.user_phone, check = %id, "check missing from owner's list");
            return Err(ApiError::internal(
                "Could not find the check on the user's object, so could not remove it",
            ));
        }
    }

    match state
        .storage
        .update(
            Category::Users,
            &check.user_phone,
            serde_json::to_value(&user)?,
        )
        .await
    {
        Ok(()) => Ok(Reply::status(200)),
        Err(err) => {
            tracing::error!(phone = %check.user_phone, error = %err, "failed to unlist deleted check");
            Err(ApiError::internal("Could not update the user"))
        }
    }
}
