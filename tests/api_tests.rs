//! HTTP tests for the REST API.
//!
//! Requests are driven through the axum `Router` in-process with
//! `tower::ServiceExt::oneshot`, backed by an in-memory database.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use task_tracker::api::build_router;
use task_tracker::db::Database;
use tower::ServiceExt;

fn setup_app() -> Router {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    build_router(Arc::new(db))
}

/// Send a request and return the status with the body parsed as JSON
/// (`Value::Null` for non-JSON bodies).
async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(raw) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(raw.to_string())
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(&body.to_string())).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn create_employee(app: &Router, name: &str) -> String {
    let (status, body) = post_json(
        app,
        "/api/employees",
        json!({"name": name, "position": "Engineer"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().expect("employee id").to_string()
}

async fn create_task(app: &Router, employee: &str, title: &str, status: &str) -> String {
    let (code, body) = post_json(
        app,
        "/api/tasks",
        json!({"title": title, "status": status, "employee": employee}),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().expect("task id").to_string()
}

mod general {
    use super::*;

    #[tokio::test]
    async fn root_reports_running() {
        let app = setup_app();
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Task Tracker API is running.");
    }

    #[tokio::test]
    async fn health_check() {
        let app = setup_app();
        let (status, body) = get(&app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn unknown_route_uses_envelope() {
        let app = setup_app();
        let (status, body) = get(&app, "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

mod employees {
    use super::*;

    #[tokio::test]
    async fn create_and_list() {
        let app = setup_app();
        let id = create_employee(&app, "Ada").await;

        let (status, body) = get(&app, "/api/employees").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let list = body["data"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], id.as_str());
        assert_eq!(list[0]["position"], "Engineer");
        assert!(list[0]["createdAt"].is_string());
    }

    #[tokio::test]
    async fn missing_name_is_bad_request() {
        let app = setup_app();

        let (status, body) = post_json(&app, "/api/employees", json!({"position": "Engineer"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"], "Employee name is required.");

        let (_, list) = get(&app, "/api/employees").await;
        assert!(list["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = setup_app();

        let (status, body) = send(&app, Method::POST, "/api/employees", Some("{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn cascade_delete_reports_deleted_tasks() {
        let app = setup_app();
        let ada = create_employee(&app, "Ada").await;
        for title in ["a", "b", "c"] {
            create_task(&app, &ada, title, "Pending").await;
        }

        let (status, body) = send(&app, Method::DELETE, &format!("/api/employees/{ada}"), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["deletedTasks"], 3);
        assert_eq!(
            body["message"],
            "Employee and all associated tasks deleted successfully."
        );

        let (_, tasks) = get(&app, &format!("/api/tasks?employeeId={ada}")).await;
        assert_eq!(tasks["count"], 0);
    }

    #[tokio::test]
    async fn delete_unknown_employee_is_not_found() {
        let app = setup_app();

        let (status, body) = send(&app, Method::DELETE, "/api/employees/missing", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Employee not found.");
    }
}

mod tasks {
    use super::*;

    #[tokio::test]
    async fn create_task_returns_created_envelope() {
        let app = setup_app();
        let ada = create_employee(&app, "Ada").await;

        let (status, body) = post_json(
            &app,
            "/api/tasks",
            json!({"title": "Ship it", "employee": ada, "dueDate": "2030-05-01"}),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Task created successfully");
        assert_eq!(body["data"]["status"], "Pending");
        assert_eq!(body["data"]["dueDate"], "2030-05-01");
        assert_eq!(body["data"]["employee"], ada.as_str());
    }

    #[tokio::test]
    async fn unknown_employee_is_not_found() {
        let app = setup_app();

        let (status, body) = post_json(
            &app,
            "/api/tasks",
            json!({"title": "Ship it", "employee": "ghost"}),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Employee not found");

        let (_, list) = get(&app, "/api/tasks").await;
        assert_eq!(list["count"], 0);
    }

    #[tokio::test]
    async fn invalid_status_is_bad_request() {
        let app = setup_app();
        let ada = create_employee(&app, "Ada").await;

        let (status, body) = post_json(
            &app,
            "/api/tasks",
            json!({"title": "Ship it", "employee": ada, "status": "Done"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn get_task_dereferences_employee() {
        let app = setup_app();
        let ada = create_employee(&app, "Ada").await;
        let task = create_task(&app, &ada, "Ship it", "In Progress").await;

        let (status, body) = get(&app, &format!("/api/tasks/{task}")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "In Progress");
        assert_eq!(body["data"]["employee"]["name"], "Ada");
        assert_eq!(body["data"]["employee"]["position"], "Engineer");
    }

    #[tokio::test]
    async fn get_unknown_task_is_not_found() {
        let app = setup_app();

        let (status, body) = get(&app, "/api/tasks/missing").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Task not found.");
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let app = setup_app();
        let ada = create_employee(&app, "Ada").await;
        create_task(&app, &ada, "a", "Completed").await;
        create_task(&app, &ada, "b", "Pending").await;
        create_task(&app, &ada, "c", "Completed").await;

        let (status, body) = get(&app, "/api/tasks?status=Completed").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Tasks fetched successfully");
        assert_eq!(body["count"], 2);
        let tasks = body["data"].as_array().unwrap();
        assert!(tasks.iter().all(|t| t["status"] == "Completed"));
    }

    #[tokio::test]
    async fn update_then_delete() {
        let app = setup_app();
        let ada = create_employee(&app, "Ada").await;
        let task = create_task(&app, &ada, "Ship it", "Pending").await;
        let uri = format!("/api/tasks/{task}");

        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(r#"{"status": "Completed", "description": "done"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task updated successfully");
        assert_eq!(body["data"]["status"], "Completed");
        assert_eq!(body["data"]["description"], "done");
        assert_eq!(body["data"]["title"], "Ship it");

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task deleted successfully");

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Task not found");
    }

    #[tokio::test]
    async fn update_with_blank_or_null_title_is_bad_request() {
        let app = setup_app();
        let ada = create_employee(&app, "Ada").await;
        let task = create_task(&app, &ada, "Ship it", "Pending").await;
        let uri = format!("/api/tasks/{task}");

        for payload in [r#"{"title": "   "}"#, r#"{"title": null}"#] {
            let (status, body) = send(&app, Method::PUT, &uri, Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
            assert_eq!(body["success"], false);
            assert_eq!(body["code"], "VALIDATION_ERROR");
            assert_eq!(body["error"], "Task title is required.");
        }

        let (_, body) = get(&app, &uri).await;
        assert_eq!(body["data"]["title"], "Ship it");
    }

    #[tokio::test]
    async fn update_with_unknown_employee_is_not_found() {
        let app = setup_app();
        let ada = create_employee(&app, "Ada").await;
        let task = create_task(&app, &ada, "Ship it", "Pending").await;
        let uri = format!("/api/tasks/{task}");

        let (status, body) = send(&app, Method::PUT, &uri, Some(r#"{"employee": "ghost"}"#)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["error"], "Employee not found");

        let (_, body) = get(&app, &uri).await;
        assert_eq!(body["data"]["employee"]["id"], ada.as_str());
    }

    #[tokio::test]
    async fn update_unknown_task_is_not_found() {
        let app = setup_app();

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/tasks/missing",
            Some(r#"{"title": "x"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn empty_store() {
        let app = setup_app();

        let (status, body) = get(&app, "/api/dashboard").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!({
                "overall": {"totalTasks": 0, "completedTasks": 0, "completionRate": 0.0},
                "employees": []
            })
        );
    }

    #[tokio::test]
    async fn per_employee_breakdown() {
        let app = setup_app();
        let ada = create_employee(&app, "Ada").await;
        create_employee(&app, "Idle").await;
        create_task(&app, &ada, "a", "Completed").await;
        create_task(&app, &ada, "b", "Pending").await;
        create_task(&app, &ada, "c", "Pending").await;

        let (status, body) = get(&app, "/api/dashboard").await;

        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["overall"]["totalTasks"], 3);
        assert_eq!(data["overall"]["completionRate"], 33.33);
        let employees = data["employees"].as_array().unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0]["employeeId"], ada.as_str());
        assert_eq!(employees[0]["name"], "Ada");
        assert_eq!(employees[0]["completedTasks"], 1);
    }
}
