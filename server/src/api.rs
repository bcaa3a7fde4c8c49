//! HTTP routes for the todo service.
//!
//! Every handler answers with an `Envelope`: 201 for create, 200 for the
//! rest, and `AppError` for 400/404/500.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use todo_core::{timestamp, CreateTodo, Envelope, HealthStatus, Priority, Todo, UpdateTodo, API_PREFIX};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;
use validator::Validate;

use crate::error::AppError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::AppState;

type ApiResult<T> = Result<Json<Envelope<T>>, AppError>;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/completed", delete(delete_completed))
        .route("/todos/all", delete(delete_all))
        .route("/todos/search", get(search_todos))
        .route("/todos/upcoming", get(upcoming_todos))
        .route("/todos/count", get(count_todos))
        .route("/todos/priority/{level}", get(todos_by_priority))
        .route("/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .route("/todos/{id}/toggle", patch(toggle_todo))
        .route("/health", get(health));

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(unknown_route)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ListParams {
    completed: Option<bool>,
    #[serde(default)]
    page: u32,
    #[serde(default = "default_page_size")]
    size: u32,
}

fn default_page_size() -> u32 {
    100
}

#[derive(Debug, Deserialize)]
struct CompletedFilter {
    completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    title: String,
}

#[derive(Debug, Deserialize)]
struct UpcomingParams {
    #[serde(rename = "dueDate", deserialize_with = "timestamp::deserialize")]
    due_date: DateTime<Utc>,
}

async fn list_todos(State(state): State<AppState>, QueryParams(params): QueryParams<ListParams>) -> ApiResult<Vec<Todo>> {
    // Paging parameters are accepted for compatibility; the full list is returned.
    debug!(page = params.page, size = params.size, "list requested");
    let todos = state.service.list(params.completed).await?;
    Ok(Json(Envelope::list(todos)))
}

async fn get_todo(State(state): State<AppState>, PathParam(id): PathParam<i64>) -> ApiResult<Todo> {
    let todo = state.service.get(id).await?.ok_or(AppError::NotFound(id))?;
    Ok(Json(Envelope::success(todo)))
}

async fn create_todo(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateTodo>,
) -> Result<(StatusCode, Json<Envelope<Todo>>), AppError> {
    input.validate()?;
    let todo = state.service.create(input).await?;
    Ok((StatusCode::CREATED, Json(Envelope::created(todo))))
}

async fn update_todo(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    JsonBody(input): JsonBody<UpdateTodo>,
) -> ApiResult<Todo> {
    input.validate()?;
    let todo = state.service.update(id, input).await?.ok_or(AppError::NotFound(id))?;
    Ok(Json(Envelope::with_message("Todo updated successfully", todo)))
}

async fn toggle_todo(State(state): State<AppState>, PathParam(id): PathParam<i64>) -> ApiResult<Todo> {
    let todo = state.service.toggle(id).await?.ok_or(AppError::NotFound(id))?;
    Ok(Json(Envelope::with_message("Todo status toggled successfully", todo)))
}

async fn delete_todo(State(state): State<AppState>, PathParam(id): PathParam<i64>) -> ApiResult<()> {
    if !state.service.delete(id).await? {
        return Err(AppError::NotFound(id));
    }
    Ok(Json(Envelope::new(200, "Todo deleted successfully", None, None)))
}

async fn delete_completed(State(state): State<AppState>) -> ApiResult<()> {
    let removed = state.service.delete_completed().await?;
    Ok(Json(Envelope::affected("Completed todos deleted successfully", removed)))
}

async fn delete_all(State(state): State<AppState>) -> ApiResult<()> {
    let removed = state.service.delete_all().await?;
    Ok(Json(Envelope::affected("All todos deleted successfully", removed)))
}

async fn search_todos(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> ApiResult<Vec<Todo>> {
    let todos = state.service.search_by_title(&params.title).await?;
    Ok(Json(Envelope::list(todos)))
}

async fn todos_by_priority(
    State(state): State<AppState>,
    PathParam(level): PathParam<Priority>,
) -> ApiResult<Vec<Todo>> {
    let todos = state.service.by_priority(level).await?;
    Ok(Json(Envelope::list(todos)))
}

async fn upcoming_todos(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<UpcomingParams>,
) -> ApiResult<Vec<Todo>> {
    let todos = state.service.upcoming(params.due_date).await?;
    Ok(Json(Envelope::list(todos)))
}

async fn count_todos(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<CompletedFilter>,
) -> ApiResult<u64> {
    let count = state.service.count(filter.completed).await?;
    Ok(Json(Envelope::success(count)))
}

async fn health(State(state): State<AppState>) -> Json<Envelope<HealthStatus>> {
    Json(Envelope::success(HealthStatus {
        status: "UP".to_string(),
        service: "Todo Application API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.environment.to_string(),
        timestamp: Utc::now(),
    }))
}

async fn unknown_route(uri: Uri) -> (StatusCode, Json<Envelope<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::error(404, format!("No route for {}", uri.path()))),
    )
}
