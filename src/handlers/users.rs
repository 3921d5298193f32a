use crate::auth;
use crate::error::ApiError;
use crate::models::user::{is_valid_phone, User};
use crate::server::request::RequestData;
use crate::server::response::Reply;
use crate::server::AppState;
use crate::storage::{Category, StorageError};

use super::require_token;

/// Method-routed entry point for the `users` path.
pub async fn resource(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    match request.method.as_str() {
        "post" => post(state, request).await,
        "get" => get(state, request).await,
        "put" => put(state, request).await,
        "delete" => delete(state, request).await,
        _ => Err(ApiError::MethodNotAllowed),
    }
}

/// POST /users - register a new account.
///
/// Required payload fields: firstName, lastName, phone (10 digits),
/// password, and a true tosAgreement flag. The password is stored only as a
/// keyed hash.
pub async fn post(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let fields = (
        request.payload_str("firstName"),
        request.payload_str("lastName"),
        request.payload_str("phone").filter(|p| is_valid_phone(p)),
        request.payload_str("password"),
        request.payload_bool("tosAgreement"),
    );
    let (Some(first_name), Some(last_name), Some(phone), Some(password), true) = fields else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let user = User {
        phone: phone.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        hashed_password: auth::hash(&state.config.hashing_secret, password),
        tos_agreement: true,
        checks: Vec::new(),
    };

    match state
        .storage
        .create(Category::Users, phone, serde_json::to_value(&user)?)
        .await
    {
        Ok(()) => Ok(Reply::status(200)),
        Err(StorageError::AlreadyExists) => Err(ApiError::conflict(
            "A user with that phone number already exists",
        )),
        Err(err) => {
            tracing::error!(%phone, error = %err, "failed to create user record");
            Err(ApiError::internal("Could not create the new user"))
        }
    }
}

/// GET /users?phone= - fetch the account, password hash stripped.
pub async fn get(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let phone = request
        .query_param("phone")
        .map(str::trim)
        .filter(|p| is_valid_phone(p))
        .ok_or_else(|| ApiError::validation("Missing required field"))?;

    require_token(state, request, phone).await?;

    match state.storage.read(Category::Users, phone).await {
        Ok(value) => {
            let user: User = serde_json::from_value(value)?;
            Ok(Reply::ok(user.public()))
        }
        Err(StorageError::NotFound) => {
            Err(ApiError::not_found("The specified user does not exist"))
        }
        Err(err) => {
            tracing::error!(%phone, error = %err, "failed to read user record");
            Err(ApiError::internal("Could not look up the specified user"))
        }
    }
}

/// PUT /users - update firstName, lastName and/or password.
///
/// The phone identifies the record and is itself immutable; at least one
/// updatable field must be supplied.
pub async fn put(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let phone = request
        .payload_str("phone")
        .filter(|p| is_valid_phone(p))
        .ok_or_else(|| ApiError::validation("Missing required field"))?;

    let first_name = request.payload_str("firstName");
    let last_name = request.payload_str("lastName");
    let password = request.payload_str("password");
    if first_name.is_none() && last_name.is_none() && password.is_none() {
        return Err(ApiError::validation("Missing fields to update"));
    }

    require_token(state, request, phone).await?;

    let mut user: User = match state.storage.read(Category::Users, phone).await {
        Ok(value) => serde_json::from_value(value)?,
        Err(StorageError::NotFound) => {
            return Err(ApiError::validation("The specified user does not exist"))
        }
        Err(err) => {
            tracing::error!(%phone, error = %err, "failed to read user record");
            return Err(ApiError::internal("Could not look up the specified user"));
        }
    };

    if let Some(first_name) = first_name {
        user.first_name = first_name.to_string();
    }
    if let Some(last_name) = last_name {
        user.last_name = last_name.to_string();
    }
    if let Some(password) = password {
        user.hashed_password = auth::hash(&state.config.hashing_secret, password);
    }

    match state
        .storage
        .update(Category::Users, phone, serde_json::to_value(&user)?)
        .await
    {
        Ok(()) => Ok(Reply::status(200)),
        Err(err) => {
            tracing::error!(%phone, error = %err, "failed to update user record");
            Err(ApiError::internal("Could not update the user"))
        }
    }
}

/// DELETE /users?phone= - remove the account and cascade into its checks.
///
/// The cascade is best-effort: every check deletion is attempted
/// independently, nothing is rolled back, and the request succeeds only if
/// all of them did.
pub async fn delete(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let phone = request
        .query_param("phone")
        .map(str::trim)
        .filter(|p| is_valid_phone(p))
        .ok_or_else(|| ApiError::validation("Missing required field"))?;

    require_token(state, request, phone).await?;

    // Serialize against check create/delete for this user
    let lock = state.locks.for_phone(phone);
    let _guard = lock.lock().await;

    let user: User = match state.storage.read(Category::Users, phone).await {
        Ok(value) => serde_json::from_value(value)?,
        Err(StorageError::NotFound) => {
            return Err(ApiError::validation("Could not find the specified user"))
        }
        Err(err) => {
            tracing::error!(%phone, error = %err, "failed to read user record");
            return Err(ApiError::internal("Could not look up the specified user"));
        }
    };

    if let Err(err) = state.storage.delete(Category::Users, phone).await {
        tracing::error!(%phone, error = %err, "failed to delete user record");
        return Err(ApiError::internal("Could not delete the specified user"));
    }

    let mut failures = 0usize;
    for check_id in &user.checks {
        if let Err(err) = state.storage.delete(Category::Checks, check_id).await {
            tracing::warn!(%phone, check = %check_id, error = %err, "cascade left a check behind");
            failures += 1;
        }
    }

    if failures == 0 {
        Ok(Reply::status(200))
    } else {
        Err(ApiError::internal(
            "Errors encountered while attempting to delete all of the user's checks. \
             All checks may not have been deleted from the system successfully",
        ))
    }
}
