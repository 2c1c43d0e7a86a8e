use std::path::Path;

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::router::CurrentUser;
use super::server::AppState;

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IndexRequest {
    pub workspace_path: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkspacePathResponse {
    workspace_path: String,
    working_dir: String,
}

/// `POST /api/knowledge/index`: runs a synchronous refresh for the
/// authenticated user; the handler blocks until the run completes.
pub(crate) async fn index_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<IndexRequest>,
) -> impl IntoResponse {
    tracing::info!(user_id, path = %request.workspace_path, "index request received");

    match state
        .indexer
        .refresh(&user_id, Path::new(&request.workspace_path))
        .await
    {
        Ok(report) => (
            StatusCode::OK,
            format!(
                "index refreshed: added={}, updated={}, deleted={}, skipped={}, errors={}",
                report.added,
                report.updated,
                report.deleted,
                report.skipped,
                report.errors.len()
            ),
        ),
        Err(e) => {
            tracing::error!("index refresh failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("index refresh failed: {e}"),
            )
        }
    }
}

/// `GET /api/knowledge/workspace-path`: default workspace location derived
/// from the server's working directory; used by the UI as a suggestion only.
pub(crate) async fn workspace_path_handler() -> axum::response::Response {
    match std::env::current_dir() {
        Ok(working_dir) => {
            let workspace_path = working_dir.join("workspace");
            Json(WorkspacePathResponse {
                workspace_path: workspace_path.display().to_string(),
                working_dir: working_dir.display().to_string(),
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!("failed to resolve working directory: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("failed to resolve path: {e}") })),
            )
                .into_response()
        }
    }
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_request_deserializes_camel_case() {
        let req: IndexRequest =
            serde_json::from_str(r#"{"workspacePath": "/home/u/project"}"#).unwrap();
        assert_eq!(req.workspace_path, "/home/u/project");
    }

    #[test]
    fn workspace_response_serializes_camel_case() {
        let resp = WorkspacePathResponse {
            workspace_path: "/srv/workspace".into(),
            working_dir: "/srv".into(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"workspacePath\":\"/srv/workspace\""));
        assert!(json.contains("\"workingDir\":\"/srv\""));
    }
}
