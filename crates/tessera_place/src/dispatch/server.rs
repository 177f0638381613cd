//! HTTP endpoint that runs detailed placement jobs for a [`RemoteExecutor`](super::RemoteExecutor).
//!
//! `POST /place` takes a `bincode` job body and answers with the JSON
//! block-to-coordinate map. `GET /health` answers `ok`.

use crate::error::PlaceError;
use crate::job::PlacementJob;
use crate::netlist::Placement;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;

/// Largest accepted job body.
const MAX_JOB_BYTES: usize = 256 * 1024 * 1024;

/// A failed request, reported as a status code with a plain-text reason.
#[derive(Debug)]
pub struct ServerError {
    status: StatusCode,
    message: String,
}

impl From<PlaceError> for ServerError {
    fn from(err: PlaceError) -> Self {
        let status = match err {
            PlaceError::Codec(_) => StatusCode::BAD_REQUEST,
            PlaceError::InsufficientCapacity { .. }
            | PlaceError::InsufficientRegisterSlots { .. }
            | PlaceError::UnresolvedBlock { .. }
            | PlaceError::InvalidBlock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, error = %self.message, "job rejected");
        (self.status, self.message).into_response()
    }
}

/// Builds the endpoint's router.
pub fn router() -> Router {
    Router::new()
        .route("/place", post(place))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_JOB_BYTES))
}

/// Serves the endpoint on `listener` until the process exits.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router()).await
}

async fn health() -> &'static str {
    "ok"
}

async fn place(body: Bytes) -> Result<Json<Placement>, ServerError> {
    let job = PlacementJob::decode(&body)?;
    let cluster = job.cluster;
    tracing::info!(
        %cluster,
        members = job.members.len(),
        steps = job.anneal.steps,
        "running detailed placement job"
    );
    let placement = tokio::task::spawn_blocking(move || job.run())
        .await
        .map_err(|e| ServerError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("placement worker for cluster {cluster} failed: {e}"),
        })??;
    Ok(Json(placement))
}
