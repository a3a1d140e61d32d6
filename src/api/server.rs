//! HTTP server implementation for the task tracker API.
//!
//! This module provides the axum router, the request handlers and the
//! server lifecycle (bind, serve, graceful shutdown).

use axum::{
    Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::ApiResponse;
use crate::db::{Database, TaskFilter};
use crate::error::{ApiError, ApiResult};
use crate::types::{
    DashboardSummary, Employee, NewEmployee, NewTask, Task, TaskDetail, TaskUpdate,
};

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Reference to the task database.
    db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get the database reference.
    pub fn db(&self) -> &Database {
        &self.db
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Query parameters for the task list.
#[derive(Debug, serde::Deserialize)]
struct TaskListParams {
    status: Option<String>,
    #[serde(rename = "employeeId")]
    employee_id: Option<String>,
}

impl From<TaskListParams> for TaskFilter {
    fn from(params: TaskListParams) -> Self {
        Self {
            status: params.status.filter(|s| !s.is_empty()),
            employee_id: params.employee_id.filter(|s| !s.is_empty()),
        }
    }
}

type JsonBody<T> = Result<Json<T>, JsonRejection>;

/// Root endpoint - plain-text liveness banner.
async fn root() -> &'static str {
    "Task Tracker API is running."
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Employees
// =============================================================================

async fn list_employees(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<Employee>>>> {
    let employees = state.db().list_employees()?;
    info!(count = employees.len() as u64, "Employees listed");
    Ok(Json(ApiResponse::success(employees)))
}

async fn create_employee(
    State(state): State<AppState>,
    payload: JsonBody<NewEmployee>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Employee>>)> {
    let Json(payload) = payload?;
    let employee = state.db().create_employee(
        payload.name.as_deref().unwrap_or_default(),
        payload.position.as_deref(),
    )?;
    info!(employee_id = %employee.id, name = %employee.name, "Employee created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(employee))))
}

/// Cascading delete: the employee and every task assigned to them.
async fn delete_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let deleted_tasks = state.db().delete_employee_cascade(&employee_id)?;
    Ok(Json(
        ApiResponse::confirmation("Employee and all associated tasks deleted successfully.")
            .with_deleted_tasks(deleted_tasks),
    ))
}

// =============================================================================
// Tasks
// =============================================================================

async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> ApiResult<Json<ApiResponse<Vec<TaskDetail>>>> {
    let filter = TaskFilter::from(params);
    let tasks = state.db().list_tasks(&filter)?;
    info!(
        status = filter.status.as_deref().unwrap_or("*"),
        employee_id = filter.employee_id.as_deref().unwrap_or("*"),
        count = tasks.len() as u64,
        "Tasks fetched"
    );
    let count = tasks.len();
    Ok(Json(
        ApiResponse::success(tasks)
            .with_message("Tasks fetched successfully")
            .with_count(count),
    ))
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    let task = state
        .db()
        .get_task(&task_id)?
        .ok_or_else(|| ApiError::not_found("Task not found."))?;
    Ok(Json(ApiResponse::success(task)))
}

async fn create_task(
    State(state): State<AppState>,
    payload: JsonBody<NewTask>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Task>>)> {
    let Json(payload) = payload?;
    let task = state.db().create_task(payload)?;
    info!(task_id = %task.id, employee_id = %task.employee, "Task created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(task).with_message("Task created successfully")),
    ))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    payload: JsonBody<TaskUpdate>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let Json(payload) = payload?;
    let task = state.db().update_task(&task_id, payload)?;
    info!(task_id = %task.id, status = %task.status, "Task updated");
    Ok(Json(
        ApiResponse::success(task).with_message("Task updated successfully"),
    ))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.db().delete_task(&task_id)?;
    info!(task_id = %task_id, "Task deleted");
    Ok(Json(ApiResponse::confirmation("Task deleted successfully")))
}

// =============================================================================
// Dashboard
// =============================================================================

async fn dashboard(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<DashboardSummary>>> {
    let summary = state.db().get_dashboard_summary()?;
    info!(
        total_tasks = summary.overall.total_tasks,
        completion_rate = summary.overall.completion_rate,
        employees = summary.employees.len() as u64,
        "Dashboard summary computed"
    );
    Ok(Json(ApiResponse::success(summary)))
}

/// Unknown routes answer with the JSON envelope too.
async fn fallback() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Build the router with all routes.
pub fn build_router(db: Arc<Database>) -> Router {
    // The browser client is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/employees", get(list_employees).post(create_employee))
        .route(
            "/api/employees/{employee_id}",
            axum::routing::delete(delete_employee),
        )
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/dashboard", get(dashboard))
        .fallback(fallback)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(db))
}

/// Handle for a running server.
pub struct ServerHandle {
    /// Address the listener is bound to.
    pub addr: SocketAddr,
    /// Channel to signal shutdown.
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Trigger graceful shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            tracing::error!("Server task ended abnormally: {}", e);
        }
    }
}

/// Start the HTTP server on the given address.
///
/// Binding happens before this returns, so a port conflict is reported to
/// the caller. Serving continues on a background task until shutdown.
pub async fn start_server(db: Arc<Database>, bind: IpAddr, port: u16) -> anyhow::Result<ServerHandle> {
    let app = build_router(db);

    let addr = SocketAddr::new(bind, port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: bound_addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
