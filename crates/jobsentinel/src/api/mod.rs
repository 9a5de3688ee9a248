use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::jobs::model::Job;
use crate::jobs::repo::{JobsRepo, StatusCounts};

/// Read-mostly surface for the external dashboard. No core logic depends
/// on anything served here.
#[derive(Clone)]
pub struct ApiState {
    pub jobs: JobsRepo,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/:key/requeue", post(requeue_job))
        .route("/jobs/:key/feedback", post(record_feedback))
        .route("/metrics", get(metrics))
        .route("/metrics/prom", get(metrics_prom))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn internal_err(e: anyhow::Error) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("internal error: {e}"),
    )
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    /// Comma-separated status filter, e.g. `queued,review`.
    pub status: Option<String>,
    /// Comma-separated platform filter.
    pub platform: Option<String>,
    pub easy_apply: Option<bool>,
    pub limit: Option<i64>,
}

fn split_filter(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

pub async fn list_jobs(
    State(state): State<ApiState>,
    Query(q): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>, (StatusCode, String)> {
    let statuses = split_filter(q.status.as_deref());
    let platforms = split_filter(q.platform.as_deref());

    let jobs = state
        .jobs
        .list(&statuses, &platforms, q.easy_apply, q.limit.unwrap_or(200))
        .await
        .map_err(internal_err)?;

    Ok(Json(jobs))
}

pub async fn requeue_job(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Response {
    match state.jobs.get(&key).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    error: "job not found".into(),
                }),
            )
                .into_response();
        }
        Err(e) => return internal_err(e).into_response(),
    }

    match state.jobs.requeue(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_err(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub label: String,
    #[serde(default)]
    pub notes: String,
}

pub async fn record_feedback(
    State(state): State<ApiState>,
    Path(key): Path<String>,
    Json(body): Json<FeedbackRequest>,
) -> Response {
    if body.label.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "label is required".to_string()).into_response();
    }

    match state.jobs.get(&key).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    error: "job not found".into(),
                }),
            )
                .into_response();
        }
        Err(e) => return internal_err(e).into_response(),
    }

    match state.jobs.record_feedback(&key, &body.label, &body.notes).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_err(e).into_response(),
    }
}

pub async fn metrics(
    State(state): State<ApiState>,
) -> Result<Json<StatusCounts>, (StatusCode, String)> {
    let counts = state.jobs.status_counts().await.map_err(internal_err)?;
    Ok(Json(counts))
}

pub async fn metrics_prom(State(state): State<ApiState>) -> Response {
    // Minimal Prometheus text format (no extra crate needed).
    match state.jobs.status_counts().await {
        Ok(counts) => {
            let body = format!(
                concat!(
                    "# HELP jobsentinel_queue_depth Number of queued jobs\n",
                    "# TYPE jobsentinel_queue_depth gauge\n",
                    "jobsentinel_queue_depth {}\n",
                    "# HELP jobsentinel_review_pending Jobs waiting on human review\n",
                    "# TYPE jobsentinel_review_pending gauge\n",
                    "jobsentinel_review_pending {}\n",
                    "# HELP jobsentinel_applied_total Jobs applied to\n",
                    "# TYPE jobsentinel_applied_total gauge\n",
                    "jobsentinel_applied_total {}\n",
                    "# HELP jobsentinel_applied_today Applications recorded today (UTC)\n",
                    "# TYPE jobsentinel_applied_today gauge\n",
                    "jobsentinel_applied_today {}\n",
                    "# HELP jobsentinel_deferred_total Jobs deferred by the apply phase\n",
                    "# TYPE jobsentinel_deferred_total gauge\n",
                    "jobsentinel_deferred_total {}\n"
                ),
                counts.queued, counts.review, counts.applied, counts.applied_today, counts.deferred
            );

            (StatusCode::OK, body).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics error: {e}"),
        )
            .into_response(),
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
