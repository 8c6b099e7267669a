use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::body::Body;
use bytes::Bytes;
use ledgerflow_core::{url as url_validation, Id, IngestError};
use ledgerflow_events::{encode_event, encode_keep_alive, encode_lagged, CloseReason, Event, Received};
use ledgerflow_store::{CreateProjectOutcome, JobStatus, ProjectState};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::deps::AppDeps;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub url: String,
}

#[derive(Deserialize)]
pub struct PaginationQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// `POST /projects {url}`: validates the URL against the fixed
/// filings-page pattern, derives the display name from the slug, inserts
/// atomically, and kicks off the StepExecutor without waiting on it.
pub async fn create_project(
    State(deps): State<AppDeps>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let slug = url_validation::validate(&body.url)
        .map_err(|msg| ApiError(IngestError::ValidationFailed(msg)))?;
    let display_name = url_validation::company_name_from_slug(&slug);

    let project = match deps.store.create_project_if_absent(&body.url, &display_name).await? {
        CreateProjectOutcome::Created(project) => project,
        CreateProjectOutcome::AlreadyExists => {
            return Err(ApiError(IngestError::ValidationFailed(format!(
                "a project for {} already exists",
                body.url
            ))))
        }
    };

    // Kicks off asynchronously; the HTTP response does not await job
    // completion, and a lost race for the job slot can't happen here since
    // the project was just created.
    if let Err(err) = deps.executor.start(project.id).await {
        info!(project_id = %project.id, error = %err, "failed to start job for newly created project");
    }

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list_projects(
    State(deps): State<AppDeps>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let skip = pagination.skip.unwrap_or(0).max(0);
    let limit = pagination.limit.unwrap_or(20).clamp(1, 100);
    let projects = deps.store.list_projects(skip, limit).await?;
    Ok(Json(projects))
}

/// `GET /projects/{id}` — project, its documents, and the latest job
/// summary.
pub async fn get_project(
    State(deps): State<AppDeps>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    let project = deps.store.get_project(id).await?;
    let documents = deps.store.list_documents_for_project(id).await?;
    let job = deps.store.get_latest_job_for_project(id).await?;

    Ok(Json(json!({
        "project": project,
        "documents": documents,
        "job": job.map(ledgerflow_store::Job::from),
    })))
}

/// `GET /projects/{id}/status` — reconciles the project's coarse lifecycle
/// state to the latest job's state if the two have drifted.
pub async fn get_project_status(
    State(deps): State<AppDeps>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    let project = deps.store.get_project(id).await?;
    let job = deps.store.get_latest_job_for_project(id).await?;

    let project = if let Some(job) = &job {
        let derived = derive_project_state(job);
        if derived != project.state {
            deps.store.update_project_state(id, derived, job.error_message.as_deref()).await?;
            deps.store.get_project(id).await?
        } else {
            project
        }
    } else {
        project
    };

    Ok(Json(json!({
        "project": project,
        "job": job.map(ledgerflow_store::Job::from),
    })))
}

fn derive_project_state(job: &ledgerflow_store::JobRow) -> ProjectState {
    match JobStatus::parse(&job.status) {
        JobStatus::Completed => ProjectState::Completed,
        JobStatus::Failed | JobStatus::Cancelled => ProjectState::Failed,
        JobStatus::Pending => ProjectState::Pending,
        JobStatus::Running => match job.current_step.as_deref() {
            Some("validate_url") | Some("scrape_page") => ProjectState::Scraping,
            Some("download_pdfs") | Some("upload_to_cloud") => ProjectState::Downloading,
            Some("extract_text") | Some("extract_data") | Some("create_embeddings") | Some("generate_snapshot") => {
                ProjectState::Processing
            }
            _ => ProjectState::Pending,
        },
    }
}

/// `GET /projects/{id}/snapshot` — 404 until `generate_snapshot` has run at
/// least once.
pub async fn get_project_snapshot(
    State(deps): State<AppDeps>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    deps.store.get_project(id).await?;
    match deps.store.get_latest_snapshot(id).await? {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err(ApiError(IngestError::NotFound(format!(
            "no snapshot has been generated for project {id}"
        )))),
    }
}

pub async fn get_project_job(
    State(deps): State<AppDeps>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    let job = deps
        .store
        .get_latest_job_for_project(id)
        .await?
        .ok_or_else(|| ApiError(IngestError::NotFound(format!("no job found for project {id}"))))?;

    Ok(Json(ledgerflow_store::Job::from(job)))
}

/// `POST /projects/{id}/cancel` — idempotent; 404 if there is no active job
/// to cancel.
pub async fn cancel_project(
    State(deps): State<AppDeps>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    let job = deps
        .store
        .get_active_job_for_project(id)
        .await?
        .ok_or_else(|| ApiError(IngestError::NotFound(format!("project {id} has no active job"))))?;

    deps.executor.cancel(job.id);
    deps.store.cancel_job(job.id).await?;
    let job = deps.store.get_job(job.id).await?;
    Ok(Json(ledgerflow_store::Job::from(job)))
}

/// `POST /projects/{id}/resume` — restarts a cancelled or failed job from
/// its last successful step.
pub async fn resume_project(
    State(deps): State<AppDeps>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    deps.store.get_project(id).await?;
    let job_id = deps.executor.resume(id).await?;
    Ok(Json(json!({ "job_id": job_id.to_string() })))
}

/// `DELETE /projects/{id}` — cancels any running job, then deletes
/// (cascades at the storage layer).
pub async fn delete_project(
    State(deps): State<AppDeps>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(job) = deps.store.get_active_job_for_project(id).await? {
        deps.executor.cancel(job.id);
        deps.store.cancel_job(job.id).await?;
    }
    deps.store.delete_project(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /projects/{id}/progress-stream` — event stream that closes when the
/// job reaches a terminal state. A late subscriber whose job has already
/// finished receives `connected { already_finished: true }` followed
/// immediately by `stream_end`, with no progress backfill.
pub async fn progress_stream(
    State(deps): State<AppDeps>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    deps.store.get_project(id).await?;
    let job = deps
        .store
        .get_latest_job_for_project(id)
        .await?
        .ok_or_else(|| ApiError(IngestError::NotFound(format!("no job found for project {id}"))))?;

    let status = JobStatus::parse(&job.status);
    let already_finished = status.is_terminal();
    let connected = Event::Connected {
        job_id: job.id.to_string(),
        already_finished,
        message: "subscribed".to_string(),
    };

    let body = if already_finished {
        let reason = match status {
            JobStatus::Completed => CloseReason::Completed,
            JobStatus::Failed => CloseReason::Error,
            JobStatus::Cancelled => CloseReason::Cancelled,
            JobStatus::Pending | JobStatus::Running => unreachable!("is_terminal() filtered these out"),
        };
        let frames = vec![
            encode_event(&connected),
            encode_event(&Event::StreamEnd { reason }),
        ];
        Body::from_stream(futures::stream::iter(
            frames.into_iter().map(|f| Ok::<_, Infallible>(Bytes::from(f))),
        ))
    } else {
        let mut sub = deps.bus.subscribe(job.id, connected);
        Body::from_stream(async_stream::stream! {
            while let Some(received) = sub.recv().await {
                let frame = match received {
                    Received::Event(event) => encode_event(&event),
                    Received::Lagged { skipped } => encode_lagged(skipped),
                    Received::KeepAlive => encode_keep_alive().to_string(),
                };
                yield Ok::<_, Infallible>(Bytes::from(frame));
            }
        })
    };

    Ok((
        [
            (axum::http::header::CONTENT_TYPE, "text/event-stream"),
            (axum::http::header::CACHE_CONTROL, "no-cache"),
            (axum::http::header::HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        body,
    ))
}
