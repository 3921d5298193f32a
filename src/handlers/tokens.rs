use crate::auth;
use crate::error::ApiError;
use crate::models::token::{is_valid_token_id, Token};
use crate::models::user::{is_valid_phone, User};
use crate::server::request::RequestData;
use crate::server::response::Reply;
use crate::server::AppState;
use crate::storage::{Category, StorageError};

/// Method-routed entry point for the `tokens` path.
pub async fn resource(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    match request.method.as_str() {
        "post" => post(state, request).await,
        "get" => get(state, request).await,
        "put" => put(state, request).await,
        "delete" => delete(state, request).await,
        _ => Err(ApiError::MethodNotAllowed),
    }
}

/// POST /tokens - exchange phone + password for a fresh bearer token.
pub async fn post(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let phone = request.payload_str("phone").filter(|p| is_valid_phone(p));
    let password = request.payload_str("password");
    let (Some(phone), Some(password)) = (phone, password) else {
        return Err(ApiError::validation("Missing required fields"));
    };

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

    // Re-hash the supplied password and compare against the stored digest
    let hashed = auth::hash(&state.config.hashing_secret, password);
    if hashed != user.hashed_password {
        return Err(ApiError::validation(
            "Password did not match the specified user's stored password",
        ));
    }

    let token = Token::new(phone, state.config.token_ttl_secs);
    match state
        .storage
        .create(Category::Tokens, &token.id, serde_json::to_value(&token)?)
        .await
    {
        Ok(()) => Ok(Reply::ok(serde_json::to_value(&token)?)),
        Err(err) => {
            tracing::error!(%phone, error = %err, "failed to create token record");
            Err(ApiError::internal("Could not create the new token"))
        }
    }
}

/// GET /tokens?id= - fetch a token record.
pub async fn get(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let id = request
        .query_param("id")
        .map(str::trim)
        .filter(|id| is_valid_token_id(id))
        .ok_or_else(|| ApiError::validation("Missing required field"))?;

    match state.storage.read(Category::Tokens, id).await {
        Ok(value) => Ok(Reply::ok(value)),
        Err(StorageError::NotFound) => {
            Err(ApiError::not_found("The specified token does not exist"))
        }
        Err(err) => {
            tracing::error!(token = %id, error = %err, "failed to read token record");
            Err(ApiError::internal("Could not look up the specified token"))
        }
    }
}

/// PUT /tokens - extend an unexpired token by another lifetime.
///
/// Requires the id and an explicit `extend: true`; extending an expired
/// token is refused.
pub async fn put(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let id = request.payload_str("id").filter(|id| is_valid_token_id(id));
    let extend = request.payload_bool("extend");
    let (Some(id), true) = (id, extend) else {
        return Err(ApiError::validation(
            "Missing required fields or fields are invalid",
        ));
    };

    let mut token: Token = match state.storage.read(Category::Tokens, id).await {
        Ok(value) => serde_json::from_value(value)?,
        Err(StorageError::NotFound) => {
            return Err(ApiError::validation("Specified token does not exist"))
        }
        Err(err) => {
            tracing::error!(token = %id, error = %err, "failed to read token record");
            return Err(ApiError::internal("Could not look up the specified token"));
        }
    };

    if token.is_expired() {
        return Err(ApiError::validation(
            "The token has already expired, and cannot be extended",
        ));
    }

    token.extend(state.config.token_ttl_secs);
    match state
        .storage
        .update(Category::Tokens, id, serde_json::to_value(&token)?)
        .await
    {
        Ok(()) => Ok(Reply::status(200)),
        Err(err) => {
            tracing::error!(token = %id, error = %err, "failed to update token record");
            Err(ApiError::internal("Could not update the token's expiration"))
        }
    }
}

/// DELETE /tokens?id= - revoke a token.
pub async fn delete(state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    let id = request
        .query_param("id")
        .map(str::trim)
        .filter(|id| is_valid_token_id(id))
        .ok_or_else(|| ApiError::validation("Missing required field"))?;

    match state.storage.delete(Category::Tokens, id).await {
        Ok(()) => Ok(Reply::status(200)),
        Err(StorageError::NotFound) => {
            Err(ApiError::validation("Could not find the specified token"))
        }
        Err(err) => {
            tracing::error!(token = %id, error = %err, "failed to delete token record");
            Err(ApiError::internal("Could not delete the specified token"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::response::ReplyBody;
    use crate::testing::{memory_state, seeded_state, test_request};
    use chrono::Utc;
    use serde_json::json;

    fn json_body(reply: Reply) -> serde_json::Value {
        match reply.body {
            ReplyBody::Json(value) => value,
            ReplyBody::Raw(_) => panic!("expected json reply"),
        }
    }

    #[tokio::test]
    async fn post_with_correct_credentials_mints_a_future_token() {
        let (state, _) = seeded_state("5551234567", "hunter2").await;
        let request = test_request(
            "post",
            "tokens",
            &[],
            json!({"phone": "5551234567", "password": "hunter2"}),
            None,
        );

        let reply = post(&state, &request).await.expect("token minted");
        let body = json_body(reply);
        assert_eq!(body["phone"], "5551234567");
        assert_eq!(body["id"].as_str().map(str::len), Some(Token::ID_LEN));
        assert!(body["expires"].as_i64().expect("expires") > Utc::now().timestamp_millis());
    }

    #[tokio::test]
    async fn post_with_wrong_password_creates_nothing() {
        let (state, seeded) = seeded_state("5551234567", "hunter2").await;
        let request = test_request(
            "post",
            "tokens",
            &[],
            json!({"phone": "5551234567", "password": "wrong"}),
            None,
        );

        let err = post(&state, &request).await.expect_err("rejected");
        assert!(matches!(err, ApiError::Validation(_)));

        // Only the seeded token exists
        let tokens = state.storage.list(Category::Tokens).await.expect("list");
        assert_eq!(tokens, vec![seeded.id]);
    }

    #[tokio::test]
    async fn get_returns_the_record_or_404() {
        let (state, token) = seeded_state("5551234567", "hunter2").await;

        let request = test_request("get", "tokens", &[("id", &token.id)], json!({}), None);
        let body = json_body(get(&state, &request).await.expect("found"));
        assert_eq!(body["id"], token.id.as_str());

        let missing = "z".repeat(Token::ID_LEN);
        let request = test_request("get", "tokens", &[("id", &missing)], json!({}), None);
        let err = get(&state, &request).await.expect_err("absent");
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn put_extends_only_live_tokens() {
        let (state, token) = seeded_state("5551234567", "hunter2").await;

        let request = test_request(
            "put",
            "tokens",
            &[],
            json!({"id": token.id, "extend": true}),
            None,
        );
        put(&state, &request).await.expect("extended");
        let stored: Token = serde_json::from_value(
            state
                .storage
                .read(Category::Tokens, &token.id)
                .await
                .expect("stored"),
        )
        .expect("decodes");
        assert!(stored.expires >= token.expires);

        // Expire it manually, then try again
        let mut expired = stored;
        expired.expires = Utc::now().timestamp_millis() - 1000;
        state
            .storage
            .update(
                Category::Tokens,
                &token.id,
                serde_json::to_value(&expired).expect("encodes"),
            )
            .await
            .expect("updated");
        let err = put(&state, &request).await.expect_err("refused");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn put_requires_the_extend_flag() {
        let (state, token) = seeded_state("5551234567", "hunter2").await;
        let request = test_request("put", "tokens", &[], json!({"id": token.id}), None);
        let err = put(&state, &request).await.expect_err("no flag");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_removes_the_token() {
        let (state, token) = seeded_state("5551234567", "hunter2").await;
        let request = test_request("delete", "tokens", &[("id", &token.id)], json!({}), None);
        delete(&state, &request).await.expect("deleted");
        assert!(state
            .storage
            .list(Category::Tokens)
            .await
            .expect("list")
            .is_empty());

        let err = delete(&state, &request).await.expect_err("already gone");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn unsupported_method_is_405() {
        let state = memory_state();
        let request = test_request("options", "tokens", &[], json!({}), None);
        let err = resource(&state, &request).await.expect_err("405");
        assert!(matches!(err, ApiError::MethodNotAllowed));
    }
}
