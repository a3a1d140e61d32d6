//! JSON response envelope shared by every endpoint.

use crate::error::ErrorCode;
use serde::Serialize;

/// Response envelope.
///
/// ```json
/// { "success": true, "message": "Tasks fetched successfully", "count": 2, "data": [...] }
/// { "success": false, "code": "NOT_FOUND", "error": "Task not found" }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_tasks: Option<usize>,
}

impl<T> ApiResponse<T> {
    fn empty(success: bool) -> Self {
        Self {
            success,
            data: None,
            message: None,
            error: None,
            code: None,
            count: None,
            deleted_tasks: None,
        }
    }

    /// Successful response carrying data.
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::empty(true)
        }
    }

    /// Successful response with only a confirmation message.
    pub fn confirmation(message: impl Into<String>) -> Self {
        Self::empty(true).with_message(message)
    }

    /// Failed response.
    pub fn failure(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            code: Some(code),
            ..Self::empty(false)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_deleted_tasks(mut self, deleted: usize) -> Self {
        self.deleted_tasks = Some(deleted);
        self
    }
}
