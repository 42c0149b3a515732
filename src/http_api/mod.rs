use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::report::{ReportRow, ScheduleReport};
use crate::{
    Project, RefreshSummary, RelationId, RelationType, ScheduleError, TaskId, TaskSpec,
};

/// Shared handle; the lock is the single-writer guarantee the project relies on.
#[derive(Clone)]
pub struct AppState {
    project: Arc<RwLock<Project>>,
}

impl AppState {
    pub fn new(project: Project) -> Self {
        Self {
            project: Arc::new(RwLock::new(project)),
        }
    }

    pub fn with_shared(project: Arc<RwLock<Project>>) -> Self {
        Self { project }
    }

    fn project(&self) -> Arc<RwLock<Project>> {
        self.project.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        let message = value.to_string();
        match value {
            ScheduleError::TaskNotFound(_)
            | ScheduleError::RelationNotFound(_)
            | ScheduleError::NoRelationBetween { .. }
            | ScheduleError::ResourceNotFound(_)
            | ScheduleError::AssignmentNotFound(_)
            | ScheduleError::CalendarNotFound(_)
            | ScheduleError::DayNotFound(_) => ApiError::NotFound(message),
            ScheduleError::RelationFailed { .. }
            | ScheduleError::CyclicDependency { .. }
            | ScheduleError::SchedulingConflict { .. } => ApiError::Conflict(message),
            ScheduleError::InvalidValue(_)
            | ScheduleError::InvalidOperation(_)
            | ScheduleError::InvalidTimeString(_)
            | ScheduleError::NoDefaultCalendar { .. } => ApiError::Invalid(message),
            ScheduleError::Io(_)
            | ScheduleError::Serialization(_)
            | ScheduleError::Csv(_)
            | ScheduleError::DataFrame(_) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CreateTaskPayload {
    #[serde(default)]
    parent: Option<TaskId>,
    #[serde(flatten)]
    spec: TaskSpec,
}

#[derive(Debug, Deserialize)]
struct CreateRelationPayload {
    predecessor: TaskId,
    successor: TaskId,
    #[serde(default)]
    relation_type: RelationType,
    #[serde(default)]
    lag: i64,
}

#[derive(Debug, Serialize)]
struct RelationCreated {
    id: RelationId,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", get(get_task).delete(delete_task))
        .route("/relations", post(create_relation))
        .route(
            "/relations/:predecessor/:successor",
            delete(delete_relation),
        )
        .route("/reschedule", post(reschedule))
        .route("/critical-path", get(critical_path))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, project: Project) -> std::io::Result<()> {
    let state = AppState::new(project);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn report_row(project: &mut Project, task_id: TaskId) -> Result<ReportRow, ApiError> {
    ScheduleReport::from_project(project)?
        .rows
        .into_iter()
        .find(|row| row.id == task_id)
        .ok_or_else(|| ApiError::not_found(format!("task {task_id} not found")))
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<ReportRow>>, ApiError> {
    let project = state.project();
    // Costs are cached on read, so even listing needs the write lock.
    let report = {
        let mut guard = project.write();
        ScheduleReport::from_project(&mut guard)?
    };
    Ok(Json(report.rows))
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<u32>,
) -> Result<Json<ReportRow>, ApiError> {
    let project = state.project();
    let row = {
        let mut guard = project.write();
        report_row(&mut guard, TaskId::from_raw(task_id))?
    };
    Ok(Json(row))
}

async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<(StatusCode, Json<ReportRow>), ApiError> {
    let project = state.project();
    let created = {
        let mut guard = project.write();
        let parent = payload.parent.unwrap_or(guard.root());
        let id = guard.insert_child(parent, None, payload.spec)?;
        report_row(&mut guard, id)?
    };
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<u32>,
) -> Result<StatusCode, ApiError> {
    let project = state.project();
    {
        let mut guard = project.write();
        guard.remove_subtree(TaskId::from_raw(task_id))?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn create_relation(
    State(state): State<AppState>,
    Json(payload): Json<CreateRelationPayload>,
) -> Result<(StatusCode, Json<RelationCreated>), ApiError> {
    let project = state.project();
    let id = {
        let mut guard = project.write();
        guard.add_predecessor(
            payload.successor,
            payload.predecessor,
            payload.relation_type,
            payload.lag,
        )?
    };
    Ok((StatusCode::CREATED, Json(RelationCreated { id })))
}

async fn delete_relation(
    State(state): State<AppState>,
    Path((predecessor, successor)): Path<(u32, u32)>,
) -> Result<StatusCode, ApiError> {
    let project = state.project();
    {
        let mut guard = project.write();
        guard.remove_predecessor(TaskId::from_raw(successor), TaskId::from_raw(predecessor))?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn reschedule(State(state): State<AppState>) -> Result<Json<RefreshSummary>, ApiError> {
    let project = state.project();
    let summary = {
        let mut guard = project.write();
        guard.reschedule_now()?
    };
    Ok(Json(summary))
}

async fn critical_path(State(state): State<AppState>) -> Json<Vec<TaskId>> {
    let project = state.project();
    let path = {
        let guard = project.read();
        guard.critical_path()
    };
    Json(path)
}
