use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use taskhive_application::{
    CreateTaskInput, RequestContext, TaskListFilter, TaskPage, UpdateTaskInput,
};
use taskhive_core::{Principal, TaskId, UserId};
use taskhive_domain::TaskStatus;
use uuid::Uuid;

use crate::dto::{CreateTaskRequest, TaskPageResponse, TaskResponse, UpdateTaskRequest};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub async fn list_tasks_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<TaskPageResponse>> {
    let page = TaskPage {
        page: query.page.unwrap_or(1).max(1),
        page_size: query.page_size.unwrap_or(10).clamp(1, 100),
    };
    let filter = TaskListFilter {
        status: query.status,
        assignee_id: query.assignee_id.map(UserId::from_uuid),
    };

    let (tasks, total) = state
        .tasks
        .list(&principal, filter, page, &context)
        .await?;

    Ok(Json(TaskPageResponse {
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
        total,
        page: page.page,
        page_size: page.page_size,
    }))
}

pub async fn create_task_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state
        .tasks
        .create(
            &principal,
            CreateTaskInput {
                title: request.title,
                description: request.description,
                priority: request.priority,
                category: request.category,
                due_date: request.due_date,
                assignee_id: request.assignee_id.map(UserId::from_uuid),
            },
            &context,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

pub async fn get_task_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .tasks
        .get(&principal, TaskId::from_uuid(task_id), &context)
        .await?;

    Ok(Json(TaskResponse::from(task)))
}

pub async fn update_task_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .tasks
        .update(
            &principal,
            TaskId::from_uuid(task_id),
            UpdateTaskInput {
                title: request.title,
                description: request.description,
                status: request.status,
                priority: request.priority,
                category: request.category,
                due_date: request.due_date,
                assignee_id: request.assignee_id.map(UserId::from_uuid),
            },
            &context,
        )
        .await?;

    Ok(Json(TaskResponse::from(task)))
}

pub async fn delete_task_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .tasks
        .delete(&principal, TaskId::from_uuid(task_id), &context)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
