use std::panic::AssertUnwindSafe;

use axum::extract::{Request, State};
use axum::response::Response;
use futures::FutureExt;

use crate::error::ApiError;
use crate::handlers;
use crate::server::request::RequestData;
use crate::server::response::{encode, Reply};
use crate::server::router::Route;
use crate::server::AppState;

/// Single entry point for every inbound request: normalize, route, run the
/// resource handler inside a failure boundary, encode the reply.
pub async fn dispatch(State(state): State<AppState>, req: Request) -> Response {
    let request = RequestData::from_request(req).await;
    let route = state.routes.resolve(&request.path);
    tracing::debug!(path = %request.path, method = %request.method, ?route, "dispatching request");

    // Handlers signal failure through their Result; the panic guard is the
    // last line of defense and covers the whole handler future, not just its
    // first call frame.
    let outcome = AssertUnwindSafe(run(route, &state, &request))
        .catch_unwind()
        .await;

    let reply = match outcome {
        Ok(Ok(reply)) => reply,
        Ok(Err(err)) => err.into_reply(),
        Err(_) => {
            tracing::error!(path = %request.path, method = %request.method, "handler panicked");
            ApiError::internal("An error occurred while processing your request").into_reply()
        }
    };

    tracing::debug!(status = %reply.status, "returning response");
    encode(reply)
}

async fn run(route: Route, state: &AppState, request: &RequestData) -> Result<Reply, ApiError> {
    match route {
        Route::Ping => handlers::ping(request).await,
        Route::Users => handlers::users::resource(state, request).await,
        Route::Tokens => handlers::tokens::resource(state, request).await,
        Route::Checks => handlers::checks::resource(state, request).await,
        Route::Assets => handlers::assets(request).await,
        Route::NotFound => handlers::not_found(request).await,
    }
}
