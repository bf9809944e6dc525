/// End-to-end tests for the HTTP API
///
/// Each test drives the router in process against the database named by
/// `DATABASE_URL` and returns early when it is unset.

mod common;

use axum::http::{Method, StatusCode};
use common::{unique, TestContext};
use projectdesk_shared::models::access_token::AccessToken;
use serde_json::json;

macro_rules! context {
    () => {
        match TestContext::new().await {
            Some(ctx) => ctx,
            None => {
                eprintln!("DATABASE_URL not set; skipping");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_health_reports_database() {
    let ctx = context!();

    let (status, body) = ctx.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["migrations_up_to_date"], true);
}

#[tokio::test]
async fn test_project_create_then_show_round_trip() {
    let ctx = context!();
    let name = unique("website");

    let (status, created) = ctx
        .post(
            "/project",
            None,
            json!({ "name": name, "description": "Company site", "status": "active" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Project created");

    let id = created["data"]["id"].as_i64().unwrap();
    let (status, shown) = ctx.get(&format!("/project/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shown["message"], "Project found");
    assert_eq!(shown["data"]["name"], name);
    assert_eq!(shown["data"]["description"], "Company site");
    assert_eq!(shown["data"]["status"], "active");
    assert_eq!(shown["data"]["tasks"], json!([]));
}

#[tokio::test]
async fn test_duplicate_project_name_rejected() {
    let ctx = context!();
    let name = unique("dup");

    let (status, first) = ctx.post("/project", None, json!({ "name": name, "status": "active" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = first["data"]["id"].as_i64().unwrap();

    let (status, body) = ctx
        .post("/project", None, json!({ "name": name, "status": "inactive" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["name"][0], "The name has already been taken.");

    let (_, shown) = ctx.get(&format!("/project/{}", id), None).await;
    assert_eq!(shown["data"]["status"], "active");
}

#[tokio::test]
async fn test_validation_lists_every_failing_field() {
    let ctx = context!();

    let (status, body) = ctx.post("/project", None, json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["name"][0], "The name field is required.");
    assert_eq!(body["errors"]["status"][0], "The status field is required.");
    assert_eq!(body["message"], "The name field is required. (and 1 more error)");
}

#[tokio::test]
async fn test_invalid_status_update_leaves_project_unchanged() {
    let ctx = context!();
    let id = ctx.create_project("active").await;
    let (_, before) = ctx.get(&format!("/project/{}", id), None).await;

    let (status, body) = ctx
        .put(
            &format!("/project/{}", id),
            None,
            json!({ "name": unique("renamed"), "status": "archived" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["status"][0].as_str().unwrap().contains("active, inactive"));

    let (_, after) = ctx.get(&format!("/project/{}", id), None).await;
    assert_eq!(after["data"], before["data"]);
}

#[tokio::test]
async fn test_project_update_keeps_own_name_and_description_rules() {
    let ctx = context!();
    let name = unique("keep");

    let (_, created) = ctx
        .post("/project", None, json!({ "name": name, "description": "v1", "status": "active" }))
        .await;
    let uri = format!("/project/{}", created["data"]["id"]);

    // Same name as itself is not a conflict; omitted description is kept
    let (status, body) = ctx.put(&uri, None, json!({ "name": name, "status": "inactive" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Project updated");
    assert_eq!(body["data"]["status"], "inactive");
    assert_eq!(body["data"]["description"], "v1");

    let (status, body) = ctx
        .put(&uri, None, json!({ "name": name, "status": "inactive", "description": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["description"].is_null());
}

#[tokio::test]
async fn test_project_list_filters() {
    let ctx = context!();
    let marker = unique("filter");

    for (suffix, status) in [("alpha", "active"), ("beta", "inactive")] {
        let (code, _) = ctx
            .post(
                "/project",
                None,
                json!({ "name": format!("{}-{}", marker, suffix), "status": status }),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (status, body) = ctx
        .get(&format!("/project?name={}&status=inact", marker.to_uppercase()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Project list");

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], format!("{}-beta", marker));

    let (status, body) = ctx.get("/project?from=not-a-date", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["from"].is_array());
}

#[tokio::test]
async fn test_project_delete_removes_tasks() {
    let ctx = context!();
    let project_id = ctx.create_project("active").await;

    let (_, task) = ctx
        .post(
            "/task",
            None,
            json!({
                "project_id": project_id,
                "title": "Doomed task",
                "status": "pending",
                "priority": "low",
                "due_date": "2025-06-01",
            }),
        )
        .await;
    let task_id = task["data"]["id"].as_i64().unwrap();

    let (status, body) = ctx.delete(&format!("/project/{}", project_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Project deleted" }));

    let (status, _) = ctx.get(&format!("/task/{}", task_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_round_trip_with_project() {
    let ctx = context!();
    let project_id = ctx.create_project("active").await;

    let (status, created) = ctx
        .post(
            "/task",
            None,
            json!({
                "project_id": project_id,
                "title": "Write release notes",
                "status": "pending",
                "priority": "high",
                "due_date": "2025-06-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Task created");

    let (status, shown) = ctx.get(&format!("/task/{}", created["data"]["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shown["data"]["due_date"], "2025-06-01");
    assert_eq!(shown["data"]["project"]["id"], project_id);
    assert!(shown["data"]["description"].is_null());
}

#[tokio::test]
async fn test_task_requires_existing_project() {
    let ctx = context!();

    let (status, body) = ctx
        .post(
            "/task",
            None,
            json!({
                "project_id": i64::MAX,
                "title": "Orphan",
                "status": "pending",
                "priority": "low",
                "due_date": "2025-06-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["project_id"][0], "The selected project id is invalid.");

    let (status, body) = ctx
        .post("/task", None, json!({ "title": "No project", "priority": "urgent", "due_date": "soon" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["project_id"][0], "The project id field is required.");
    assert_eq!(body["errors"]["status"][0], "The status field is required.");
    assert!(body["errors"]["priority"][0].as_str().unwrap().contains("low, medium, high"));
    assert_eq!(body["errors"]["due_date"][0], "The due date field must be a valid date.");
}

#[tokio::test]
async fn test_task_blank_and_mistyped_fields_are_keyed() {
    let ctx = context!();

    let (status, body) = ctx
        .post(
            "/task",
            None,
            json!({
                "project_id": "abc",
                "title": "   ",
                "description": ["not", "text"],
                "status": "",
                "priority": { "level": "high" },
                "due_date": " ",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let errors = body["errors"].as_object().unwrap();
    let mut fields: Vec<&str> = errors.keys().map(String::as_str).collect();
    fields.sort_unstable();
    assert_eq!(
        fields,
        ["description", "due_date", "priority", "project_id", "status", "title"]
    );
    assert_eq!(errors["project_id"][0], "The project id field must be an integer.");
    assert_eq!(errors["title"][0], "The title field is required.");
    assert_eq!(errors["description"][0], "The description field must be a string.");
    assert_eq!(errors["priority"][0], "The priority field must be a string.");
    assert!(body["message"].as_str().unwrap().ends_with("(and 5 more errors)"));
}

#[tokio::test]
async fn test_task_accepts_project_id_as_string() {
    let ctx = context!();
    let project_id = ctx.create_project("active").await;

    let (status, created) = ctx
        .post(
            "/task",
            None,
            json!({
                "project_id": project_id.to_string(),
                "title": "  Padded title  ",
                "status": "pending",
                "priority": "medium",
                "due_date": "2025-06-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["project_id"], project_id);
    assert_eq!(created["data"]["title"], "Padded title");
}

#[tokio::test]
async fn test_client_blank_fields_are_required() {
    let ctx = context!();
    let root = ctx.user_with_role("superadmin").await;

    let (status, body) = ctx
        .post(
            "/client",
            Some(root.token.as_str()),
            json!({ "code": "", "name": "  ", "lastname": true, "phone": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["code"][0], "The code field is required.");
    assert_eq!(body["errors"]["name"][0], "The name field is required.");
    assert_eq!(body["errors"]["lastname"][0], "The lastname field must be a string.");
    assert_eq!(body["errors"]["phone"][0], "The phone field is required.");
}

#[tokio::test]
async fn test_task_filter_intersection() {
    let ctx = context!();
    let project_id = ctx.create_project("active").await;

    let combos = [
        ("pending", "high"),
        ("pending", "low"),
        ("done", "high"),
        ("pending", "high"),
    ];
    for (status, priority) in combos {
        let (code, _) = ctx
            .post(
                "/task",
                None,
                json!({
                    "project_id": project_id,
                    "title": format!("{} {}", status, priority),
                    "status": status,
                    "priority": priority,
                    "due_date": "2025-06-01",
                }),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (status, body) = ctx
        .get(
            &format!("/task?status=pending&priority=high&project_id={}", project_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    for task in data {
        assert_eq!(task["status"], "pending");
        assert_eq!(task["priority"], "high");
        assert_eq!(task["project_id"], project_id);
    }
    assert!(data[0]["id"].as_i64() < data[1]["id"].as_i64());

    let (status, _) = ctx.get("/task?project_id=abc", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_task_update_without_project_keeps_it() {
    let ctx = context!();
    let project_id = ctx.create_project("active").await;

    let (_, created) = ctx
        .post(
            "/task",
            None,
            json!({
                "project_id": project_id,
                "title": "Draft",
                "status": "pending",
                "priority": "medium",
                "due_date": "2025-06-01",
            }),
        )
        .await;

    let (status, body) = ctx
        .put(
            &format!("/task/{}", created["data"]["id"]),
            None,
            json!({ "title": "Draft v2", "status": "progress", "priority": "medium", "due_date": "2025-06-15" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["project_id"], project_id);
    assert_eq!(body["data"]["status"], "progress");
    assert_eq!(body["data"]["due_date"], "2025-06-15");
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let ctx = context!();

    let (status, body) = ctx.delete("/task/999999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Resource not found.");

    let (status, _) = ctx.get("/project/999999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.get("/project/not-a-number", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = context!();

    let (status, body) = ctx
        .request_raw(Method::POST, "/project", None, Some("{\"name\": ".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_login_with_wrong_password_issues_no_token() {
    let ctx = context!();
    let admin = ctx.user_with_role("admin").await;
    let tokens_before = AccessToken::count_for_user(&ctx.db, admin.user.id).await.unwrap();

    let (status, body) = ctx
        .post("/login", None, json!({ "email": admin.user.email, "password": "wrong-password" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
    assert!(body.get("token").is_none());

    let tokens_after = AccessToken::count_for_user(&ctx.db, admin.user.id).await.unwrap();
    assert_eq!(tokens_after, tokens_before);

    let (status, body) = ctx
        .post("/login", None, json!({ "email": "nobody@example.com", "password": "x" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_response_shape() {
    let ctx = context!();
    let admin = ctx.user_with_role("admin").await;

    let (status, body) = ctx
        .post(
            "/login",
            None,
            json!({ "email": admin.user.email, "password": common::TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["rol"], json!(["admin"]));
    assert_eq!(body["user"]["id"], admin.user.id);
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["token"].as_str().unwrap().contains('|'));

    let (status, body) = ctx.post("/login", None, json!({ "email": "bad" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
}

#[tokio::test]
async fn test_clients_require_a_valid_token() {
    let ctx = context!();

    let (status, body) = ctx.get("/client", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthenticated.");

    let (status, _) = ctx.get("/client", Some("1|not-the-secret")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.get("/client", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_client_crud_as_superadmin() {
    let ctx = context!();
    let root = ctx.user_with_role("superadmin").await;
    let token = Some(root.token.as_str());
    let code = unique("CL");

    let (status, created) = ctx
        .post(
            "/client",
            token,
            json!({ "code": code, "name": "Ana", "lastname": "Torres", "phone": "987654321" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Client created");
    let uri = format!("/client/{}", created["data"]["id"]);

    let (status, body) = ctx
        .post(
            "/client",
            token,
            json!({ "code": code, "name": "Other", "lastname": "Person", "phone": "1" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["code"][0], "The code has already been taken.");

    // Keeping its own code is allowed
    let (status, body) = ctx
        .put(
            &uri,
            token,
            json!({ "code": code, "name": "Ana", "lastname": "Torres Vega", "phone": "987654321" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lastname"], "Torres Vega");

    let (status, body) = ctx.get(&uri, token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Client found");

    let (status, body) = ctx.get("/client", token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().iter().any(|c| c["code"] == code));

    let (status, body) = ctx.delete(&uri, token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Client deleted");

    let (status, _) = ctx.delete(&uri, token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_destroy_requires_permission() {
    let ctx = context!();
    let root = ctx.user_with_role("superadmin").await;
    let admin = ctx.user_with_role("admin").await;
    let client = ctx.user_with_role("client").await;

    let (_, created) = ctx
        .post(
            "/client",
            Some(root.token.as_str()),
            json!({ "code": unique("CL"), "name": "Luis", "lastname": "Paz", "phone": "123" }),
        )
        .await;
    let uri = format!("/client/{}", created["data"]["id"]);

    for caller in [&admin, &client] {
        let (status, body) = ctx.delete(&uri, Some(caller.token.as_str())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "This action is unauthorized.");
    }

    // The client role may read but not write
    let (status, _) = ctx.get(&uri, Some(client.token.as_str())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx
        .post(
            "/client",
            Some(client.token.as_str()),
            json!({ "code": unique("CL"), "name": "No", "lastname": "Way", "phone": "1" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.get(&uri, Some(root.token.as_str())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_only_the_presented_token() {
    let ctx = context!();
    let admin = ctx.user_with_role("admin").await;
    let second_token = ctx.login(&admin.user.email).await;

    let (status, body) = ctx.post("/logout", Some(admin.token.as_str()), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (status, _) = ctx.get("/client", Some(admin.token.as_str())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.get("/client", Some(second_token.as_str())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_permission_reload() {
    let ctx = context!();
    let root = ctx.user_with_role("superadmin").await;
    let admin = ctx.user_with_role("admin").await;

    let (status, _) = ctx
        .post("/admin/permissions/reload", Some(admin.token.as_str()), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .post("/admin/permissions/reload", Some(root.token.as_str()), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Permissions reloaded");
    assert!(body["roles"].as_u64().unwrap() >= 3);
}
