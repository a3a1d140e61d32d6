//! Employee CRUD and the cascading delete.

use super::{Database, ms_to_datetime, new_id, now_ms};
use crate::error::ApiError;
use crate::types::Employee;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

/// Position assigned when none is given.
pub const DEFAULT_POSITION: &str = "Staff";

pub fn parse_employee_row(row: &Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get("id")?,
        name: row.get("name")?,
        position: row.get("position")?,
        created_at: ms_to_datetime(row.get("created_at")?),
        updated_at: ms_to_datetime(row.get("updated_at")?),
    })
}

/// Internal helper to get an employee using an existing connection.
pub(crate) fn get_employee_internal(conn: &Connection, id: &str) -> Result<Option<Employee>> {
    let employee = conn
        .query_row(
            "SELECT * FROM employees WHERE id = ?1",
            params![id],
            parse_employee_row,
        )
        .optional()?;
    Ok(employee)
}

impl Database {
    /// List all employees in creation order.
    pub fn list_employees(&self) -> Result<Vec<Employee>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM employees ORDER BY created_at, id")?;
            let employees = stmt
                .query_map([], parse_employee_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(employees)
        })
    }

    /// Get an employee by id.
    pub fn get_employee(&self, id: &str) -> Result<Option<Employee>> {
        self.with_conn(|conn| get_employee_internal(conn, id))
    }

    /// Create an employee. The name is trimmed and must not be empty.
    pub fn create_employee(&self, name: &str, position: Option<&str>) -> Result<Employee> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("name", "Employee name is required.").into());
        }
        let position = position.unwrap_or(DEFAULT_POSITION);

        self.with_conn(|conn| {
            let id = new_id();
            let now = now_ms();
            conn.execute(
                "INSERT INTO employees (id, name, position, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![id, name, position, now],
            )?;

            Ok(Employee {
                id,
                name: name.to_string(),
                position: position.to_string(),
                created_at: ms_to_datetime(now),
                updated_at: ms_to_datetime(now),
            })
        })
    }

    /// Delete an employee and every task assigned to them.
    ///
    /// Tasks are removed first, then the employee, as two separate statements
    /// with no enclosing transaction. Returns the number of tasks removed.
    pub fn delete_employee_cascade(&self, id: &str) -> Result<usize> {
        let employee = self
            .get_employee(id)?
            .ok_or_else(|| ApiError::not_found("Employee not found."))?;

        let deleted_tasks = self.delete_tasks_for_employee(id)?;

        self.with_conn(|conn| {
            conn.execute("DELETE FROM employees WHERE id = ?1", params![id])?;
            Ok(())
        })?;

        info!(
            employee_id = %id,
            employee_name = %employee.name,
            deleted_tasks = deleted_tasks as u64,
            "Employee deleted with associated tasks"
        );

        Ok(deleted_tasks)
    }
}
