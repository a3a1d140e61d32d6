//! Task CRUD with employee dereferencing.

use super::employees::get_employee_internal;
use super::{Database, ms_to_datetime, new_id, now_ms};
use crate::error::ApiError;
use crate::types::{EmployeeRef, NewTask, Task, TaskDetail, TaskStatus, TaskUpdate};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Filters for listing tasks. Absent filters impose no constraint; present
/// filters are exact matches combined with AND.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub employee_id: Option<String>,
}

impl TaskFilter {
    pub fn by_status(status: TaskStatus) -> Self {
        Self {
            status: Some(status.as_str().to_string()),
            employee_id: None,
        }
    }

    pub fn by_employee(employee_id: impl Into<String>) -> Self {
        Self {
            status: None,
            employee_id: Some(employee_id.into()),
        }
    }
}

const TASK_DETAIL_SELECT: &str = "SELECT t.*, e.name AS employee_name, e.position AS employee_position
     FROM tasks t
     LEFT JOIN employees e ON e.id = t.employee_id";

fn conversion_error(row: &Row, column: &str, message: String) -> rusqlite::Error {
    let idx = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let status = status
        .parse::<TaskStatus>()
        .map_err(|e| conversion_error(row, "status", e))?;

    let due_date: Option<String> = row.get("due_date")?;
    let due_date = due_date
        .map(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d"))
        .transpose()
        .map_err(|e| conversion_error(row, "due_date", e.to_string()))?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        due_date,
        employee: row.get("employee_id")?,
        created_at: ms_to_datetime(row.get("created_at")?),
        updated_at: ms_to_datetime(row.get("updated_at")?),
    })
}

/// Parse a row of [`TASK_DETAIL_SELECT`]; the employee is `None` when the
/// join found no record.
fn parse_task_detail_row(row: &Row) -> rusqlite::Result<TaskDetail> {
    let task = parse_task_row(row)?;
    let name: Option<String> = row.get("employee_name")?;
    let position: Option<String> = row.get("employee_position")?;
    let employee = name.map(|name| EmployeeRef {
        id: task.employee.clone(),
        name,
        position: position.unwrap_or_default(),
    });
    Ok(TaskDetail::new(task, employee))
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            "SELECT * FROM tasks WHERE id = ?1",
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

/// Trim a required text field, rejecting blank values.
fn required_text(value: Option<&str>, field: &str, message: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::validation(field, message).into()),
    }
}

/// Resolve an employee reference, failing with NotFound when it is missing,
/// blank or unknown.
fn require_employee(conn: &Connection, employee: Option<&str>) -> Result<String> {
    let employee_id = employee
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(ApiError::employee_not_found)?;
    if get_employee_internal(conn, employee_id)?.is_none() {
        return Err(ApiError::employee_not_found().into());
    }
    Ok(employee_id.to_string())
}

fn format_due_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

impl Database {
    /// List tasks matching the filter, each with its employee dereferenced.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskDetail>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE (?1 IS NULL OR t.status = ?1)
                   AND (?2 IS NULL OR t.employee_id = ?2)
                 ORDER BY t.created_at, t.id",
                TASK_DETAIL_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(
                    params![filter.status, filter.employee_id],
                    parse_task_detail_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Get a task by id with its employee dereferenced.
    pub fn get_task(&self, task_id: &str) -> Result<Option<TaskDetail>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE t.id = ?1", TASK_DETAIL_SELECT);
            let task = conn
                .query_row(&sql, params![task_id], parse_task_detail_row)
                .optional()?;
            Ok(task)
        })
    }

    /// Create a task.
    ///
    /// The employee reference is checked before anything else, so a request
    /// naming an unknown employee fails with NotFound and writes nothing.
    pub fn create_task(&self, input: NewTask) -> Result<Task> {
        self.with_conn(|conn| {
            let employee = require_employee(conn, input.employee.as_deref())?;
            let title = required_text(input.title.as_deref(), "title", "Task title is required.")?;

            let id = new_id();
            let now = now_ms();
            let status = input.status.unwrap_or_default();

            conn.execute(
                "INSERT INTO tasks (id, title, description, status, due_date, employee_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    id,
                    title,
                    input.description,
                    status.as_str(),
                    format_due_date(input.due_date),
                    employee,
                    now,
                ],
            )?;

            Ok(Task {
                id,
                title,
                description: input.description,
                status,
                due_date: input.due_date,
                employee,
                created_at: ms_to_datetime(now),
                updated_at: ms_to_datetime(now),
            })
        })
    }

    /// Apply a partial update to a task.
    ///
    /// Supplied fields go through the creation validators; a new employee
    /// reference must exist.
    pub fn update_task(&self, task_id: &str, update: TaskUpdate) -> Result<Task> {
        self.with_conn(|conn| {
            let mut task = get_task_internal(conn, task_id)?.ok_or_else(ApiError::task_not_found)?;

            if let Some(title) = update.title {
                task.title = required_text(title.as_deref(), "title", "Task title is required.")?;
            }
            if let Some(description) = update.description {
                task.description = description;
            }
            if let Some(status) = update.status {
                task.status = status;
            }
            if let Some(due_date) = update.due_date {
                task.due_date = due_date;
            }
            if let Some(ref employee) = update.employee {
                task.employee = require_employee(conn, Some(employee.as_str()))?;
            }

            let now = now_ms();
            conn.execute(
                "UPDATE tasks
                 SET title = ?2, description = ?3, status = ?4, due_date = ?5,
                     employee_id = ?6, updated_at = ?7
                 WHERE id = ?1",
                params![
                    task.id,
                    task.title,
                    task.description,
                    task.status.as_str(),
                    format_due_date(task.due_date),
                    task.employee,
                    now,
                ],
            )?;
            task.updated_at = ms_to_datetime(now);

            Ok(task)
        })
    }

    /// Delete a task by id.
    pub fn delete_task(&self, task_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            if deleted == 0 {
                return Err(ApiError::task_not_found().into());
            }
            Ok(())
        })
    }

    /// Delete every task assigned to an employee. Returns the number removed.
    pub fn delete_tasks_for_employee(&self, employee_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM tasks WHERE employee_id = ?1",
                params![employee_id],
            )?;
            Ok(deleted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn setup_db() -> Database {
        Database::open_in_memory().expect("Failed to create in-memory database")
    }

    fn new_task(employee: &str, title: &str) -> NewTask {
        NewTask {
            title: Some(title.to_string()),
            employee: Some(employee.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_task_defaults() {
        let db = setup_db();
        let emp = db.create_employee("Linus", None).unwrap();

        let task = db.create_task(new_task(&emp.id, "  Patch kernel  ")).unwrap();

        assert_eq!(task.title, "Patch kernel");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.employee, emp.id);
        assert!(task.description.is_none());
        assert!(task.due_date.is_none());
    }

    #[test]
    fn test_employee_check_precedes_title_validation() {
        let db = setup_db();
        let input = NewTask {
            title: None,
            employee: Some("ghost".to_string()),
            ..Default::default()
        };
        let err = ApiError::from(db.create_task(input).unwrap_err());
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Employee not found");
    }

    #[test]
    fn test_create_task_without_employee_is_not_found() {
        let db = setup_db();
        let input = NewTask {
            title: Some("Orphan".to_string()),
            employee: Some("   ".to_string()),
            ..Default::default()
        };
        let err = ApiError::from(db.create_task(input).unwrap_err());
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_create_task_blank_title_is_validation_error() {
        let db = setup_db();
        let emp = db.create_employee("Linus", None).unwrap();
        let err = ApiError::from(db.create_task(new_task(&emp.id, "")).unwrap_err());
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.field.as_deref(), Some("title"));
        assert!(db.list_tasks(&TaskFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_update_task_partial_fields() {
        let db = setup_db();
        let emp = db.create_employee("Linus", None).unwrap();
        let mut input = new_task(&emp.id, "Review");
        input.description = Some("Read the diff".to_string());
        input.due_date = NaiveDate::from_ymd_opt(2030, 1, 31);
        let task = db.create_task(input).unwrap();

        let updated = db
            .update_task(
                &task.id,
                TaskUpdate {
                    status: Some(TaskStatus::InProgress),
                    description: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "Review");
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert!(updated.description.is_none());
        assert_eq!(updated.due_date, NaiveDate::from_ymd_opt(2030, 1, 31));
        assert!(updated.updated_at >= task.updated_at);

        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::InProgress);
        assert!(stored.description.is_none());
    }

    #[test]
    fn test_update_task_validates_fields() {
        let db = setup_db();
        let emp = db.create_employee("Linus", None).unwrap();
        let task = db.create_task(new_task(&emp.id, "Review")).unwrap();

        let blank = TaskUpdate {
            title: Some(Some(" ".to_string())),
            ..Default::default()
        };
        let err = ApiError::from(db.update_task(&task.id, blank).unwrap_err());
        assert_eq!(err.code, ErrorCode::ValidationError);

        let reassign = TaskUpdate {
            employee: Some("ghost".to_string()),
            ..Default::default()
        };
        let err = ApiError::from(db.update_task(&task.id, reassign).unwrap_err());
        assert_eq!(err.code, ErrorCode::NotFound);

        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.title, "Review");
        assert_eq!(stored.employee.unwrap().id, emp.id);
    }

    #[test]
    fn test_update_null_title_is_validation_error() {
        let db = setup_db();
        let emp = db.create_employee("Linus", None).unwrap();
        let task = db.create_task(new_task(&emp.id, "Review")).unwrap();

        let update: TaskUpdate = serde_json::from_str(r#"{"title": null}"#).unwrap();
        let err = ApiError::from(db.update_task(&task.id, update).unwrap_err());
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.field.as_deref(), Some("title"));

        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.title, "Review");
    }

    #[test]
    fn test_update_unknown_task() {
        let db = setup_db();
        let err = ApiError::from(
            db.update_task("missing", TaskUpdate::default())
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Task not found");
    }

    #[test]
    fn test_delete_task() {
        let db = setup_db();
        let emp = db.create_employee("Linus", None).unwrap();
        let task = db.create_task(new_task(&emp.id, "Review")).unwrap();

        db.delete_task(&task.id).unwrap();
        assert!(db.get_task(&task.id).unwrap().is_none());

        let err = ApiError::from(db.delete_task(&task.id).unwrap_err());
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_orphaned_task_has_no_employee() {
        let db = setup_db();
        let emp = db.create_employee("Linus", None).unwrap();
        let task = db.create_task(new_task(&emp.id, "Review")).unwrap();

        // Remove the employee without the cascade.
        db.with_conn(|conn| {
            conn.execute("DELETE FROM employees WHERE id = ?1", params![emp.id])?;
            Ok(())
        })
        .unwrap();

        let detail = db.get_task(&task.id).unwrap().unwrap();
        assert!(detail.employee.is_none());
    }
}
