//! Aggregation queries for the completion dashboard.

use super::Database;
use crate::types::{CompletionSummary, DashboardSummary, EmployeeSummary, TaskStatus};
use anyhow::Result;
use rusqlite::params;

/// Percentage of completed tasks, rounded to two decimals with ties to even.
///
/// An empty population has a rate of 0.
pub fn completion_rate(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = completed as f64 / total as f64 * 100.0;
    (rate * 100.0).round_ties_even() / 100.0
}

impl CompletionSummary {
    pub fn new(total_tasks: i64, completed_tasks: i64) -> Self {
        Self {
            total_tasks,
            completed_tasks,
            completion_rate: completion_rate(completed_tasks, total_tasks),
        }
    }
}

impl Database {
    /// Completion figures over every task.
    pub fn get_overall_summary(&self) -> Result<CompletionSummary> {
        self.with_conn(|conn| {
            let (total, completed): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0)
                 FROM tasks",
                params![TaskStatus::Completed.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(CompletionSummary::new(total, completed))
        })
    }

    /// Completion figures per employee.
    ///
    /// Grouping runs over tasks, so employees without tasks do not appear.
    /// Groups whose employee record is gone are dropped by the join.
    pub fn get_employee_summaries(&self) -> Result<Vec<EmployeeSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT e.id, e.name, e.position,
                        COUNT(*) AS total_tasks,
                        SUM(CASE WHEN t.status = ?1 THEN 1 ELSE 0 END) AS completed_tasks
                 FROM tasks t
                 INNER JOIN employees e ON e.id = t.employee_id
                 GROUP BY e.id, e.name, e.position
                 ORDER BY e.name, e.id",
            )?;

            let rows = stmt
                .query_map(params![TaskStatus::Completed.as_str()], |row| {
                    let total_tasks: i64 = row.get("total_tasks")?;
                    let completed_tasks: i64 = row.get("completed_tasks")?;
                    Ok(EmployeeSummary {
                        employee_id: row.get(0)?,
                        name: row.get(1)?,
                        position: row.get(2)?,
                        total_tasks,
                        completed_tasks,
                        completion_rate: completion_rate(completed_tasks, total_tasks),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(rows)
        })
    }

    /// Overall and per-employee completion summary.
    pub fn get_dashboard_summary(&self) -> Result<DashboardSummary> {
        Ok(DashboardSummary {
            overall: self.get_overall_summary()?,
            employees: self.get_employee_summaries()?,
        })
    }
}
