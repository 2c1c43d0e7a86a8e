use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;

use super::handlers::{health_handler, index_handler, workspace_path_handler};
use super::server::AppState;

/// User id resolved by the auth middleware, injected into request
/// extensions for handlers.
#[derive(Debug, Clone)]
pub(crate) struct CurrentUser(pub String);

const MAX_BODY_SIZE: usize = 65_536;

pub(crate) fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/knowledge/index", post(index_handler))
        .route("/api/knowledge/workspace-path", get(workspace_path_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .with_state(state)
}

async fn auth_middleware(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    let Some(user_id) = state.sessions.resolve(token) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    req.extensions_mut().insert(CurrentUser(user_id));
    next.run(req).await
}
