//! HTTP-level tests driving the router in-process

mod common;

use axum::http::{Method, StatusCode};
use common::{TestContext, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_health_reports_store_status() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["store_status"], "connected");
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send(Method::GET, "/v1/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx
        .send(Method::GET, "/v1/projects", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_then_logout_revokes_the_token() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "ALICE@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user"]["role"], "Manager");
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = ctx
        .send(Method::GET, "/v1/projects", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send(Method::POST, "/v1/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send(Method::GET, "/v1/projects", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let ctx = TestContext::new().await;

    let (wrong_status, wrong_body) = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "Wrong#2025" })),
        )
        .await;
    let (unknown_status, unknown_body) = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["message"], unknown_body["message"]);
}

#[tokio::test]
async fn test_manager_creates_project_contributor_is_forbidden() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post(
            "/v1/projects",
            &ctx.alice,
            json!({ "name": "Launch", "description": "Q1 launch" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["owner_id"], ctx.alice.id);
    assert_eq!(body["version"], 1);

    let (status, body) = ctx
        .post(
            "/v1/projects",
            &ctx.bob,
            json!({ "name": "Side", "description": "Not allowed" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, body) = ctx.get("/v1/projects", &ctx.bob).await;
    assert_eq!(status, StatusCode::OK);
    let projects = body.as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["owner"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_invalid_project_fields_return_details() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post(
            "/v1/projects",
            &ctx.alice,
            json!({ "name": "   ", "description": "Q1 launch" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "name");

    let (status, body) = ctx
        .post("/v1/projects", &ctx.alice, json!({ "name": "Launch" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_tasks_are_listed_high_priority_first() {
    let ctx = TestContext::new().await;
    let project = ctx.create_project(&ctx.alice, "Launch").await;

    ctx.create_task(&ctx.alice, project, &ctx.bob, "Book venue", "Medium")
        .await;
    let draft = ctx
        .create_task(&ctx.alice, project, &ctx.bob, "Draft outline", "High")
        .await;

    let (status, body) = ctx
        .get(&format!("/v1/projects/{}/tasks", project), &ctx.bob)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"][0]["id"], draft);
    assert_eq!(body["tasks"][0]["priority"], "High");
    assert_eq!(body["tasks"][0]["is_complete"], false);
    assert_eq!(body["counts"]["total"], 2);
    assert_eq!(body["counts"]["pending"], 2);
}

#[tokio::test]
async fn test_task_creation_checks_role_and_references() {
    let ctx = TestContext::new().await;
    let project = ctx.create_project(&ctx.tess, "Launch").await;

    let task = |assignee: i64| {
        json!({
            "assigned_to_id": assignee,
            "title": "Write copy",
            "description": "Landing page copy",
            "due_date": "2030-01-15T09:00:00Z",
        })
    };

    let (status, _) = ctx
        .post(&format!("/v1/projects/{}/tasks", project), &ctx.bob, task(ctx.bob.id))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .post(&format!("/v1/projects/{}/tasks", project), &ctx.tess, task(4040))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "assigned_to_id");

    let (status, body) = ctx
        .post("/v1/projects/9999/tasks", &ctx.tess, task(ctx.bob.id))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "project_id");

    let (status, body) = ctx
        .post(&format!("/v1/projects/{}/tasks", project), &ctx.tess, task(ctx.bob.id))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["priority"], "Medium");
}

#[tokio::test]
async fn test_deleting_project_cascades_to_tasks() {
    let ctx = TestContext::new().await;
    let project = ctx.create_project(&ctx.alice, "Launch").await;
    for title in ["One", "Two", "Three"] {
        ctx.create_task(&ctx.alice, project, &ctx.bob, title, "Low")
            .await;
    }

    let (status, body) = ctx
        .delete(&format!("/v1/projects/{}", project), &ctx.alice)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks_removed"], 3);

    let (status, _) = ctx
        .get(&format!("/v1/projects/{}/tasks", project), &ctx.alice)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx.delete("/v1/projects/9999", &ctx.alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_only_contributors_toggle_completion() {
    let ctx = TestContext::new().await;
    let project = ctx.create_project(&ctx.alice, "Launch").await;
    let task = ctx
        .create_task(&ctx.alice, project, &ctx.bob, "Flip", "Low")
        .await;
    let uri = format!("/v1/tasks/{}/toggle", task);

    let (status, body) = ctx.post(&uri, &ctx.bob, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_complete"], true);

    let (_, body) = ctx.post(&uri, &ctx.bob, json!({})).await;
    assert_eq!(body["is_complete"], false);

    let (status, _) = ctx.post(&uri, &ctx.alice, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.post("/v1/tasks/9999/toggle", &ctx.bob, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_edit_flow_detects_stale_versions() {
    let ctx = TestContext::new().await;
    let project = ctx.create_project(&ctx.alice, "Launch").await;
    let uri = format!("/v1/projects/{}", project);

    let (status, _) = ctx.get("/v1/projects/9999", &ctx.bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = ctx.get(&uri, &ctx.bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, loaded) = ctx.get(&uri, &ctx.tess).await;
    assert_eq!(status, StatusCode::OK);
    let version = loaded["version"].as_i64().unwrap();

    let (status, body) = ctx
        .put(
            &uri,
            &ctx.tess,
            json!({ "name": "Launch v2", "description": "Q2", "version": version }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], version + 1);
    assert_eq!(body["owner_id"], ctx.alice.id);

    let (status, body) = ctx
        .put(
            &uri,
            &ctx.alice,
            json!({ "name": "Launch v1", "description": "Q1", "version": version }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (_, stored) = ctx.get(&uri, &ctx.alice).await;
    assert_eq!(stored["name"], "Launch v2");
}

#[tokio::test]
async fn test_any_user_edits_tasks_and_leads_delete_them() {
    let ctx = TestContext::new().await;
    let project = ctx.create_project(&ctx.alice, "Launch").await;
    let other = ctx.create_project(&ctx.alice, "Other").await;
    let task = ctx
        .create_task(&ctx.alice, project, &ctx.bob, "Draft", "Low")
        .await;

    let (status, body) = ctx
        .put(
            &format!("/v1/tasks/{}", task),
            &ctx.bob,
            json!({
                "title": "Draft v2",
                "description": "Reworked",
                "due_date": "2030-02-01T09:00:00Z",
                "is_complete": false,
                "priority": "High",
                "assigned_to_id": ctx.tess.id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["title"], "Draft v2");
    assert_eq!(body["assigned_to_id"], ctx.tess.id);

    let (status, _) = ctx
        .delete(&format!("/v1/projects/{}/tasks/{}", project, task), &ctx.bob)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .delete(&format!("/v1/projects/{}/tasks/{}", other, task), &ctx.alice)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .delete(&format!("/v1/projects/{}/tasks/{}", project, task), &ctx.alice)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_managers_administer_users() {
    let ctx = TestContext::new().await;
    let project = ctx.create_project(&ctx.alice, "Launch").await;
    ctx.create_task(&ctx.alice, project, &ctx.bob, "Bob's", "High")
        .await;

    let (status, body) = ctx.get("/v1/users", &ctx.bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let carol = json!({
        "first_name": "Carol",
        "last_name": "Diaz",
        "email": "carol@example.com",
        "password": "Carol#2025",
        "role": "Contributor",
    });

    let (status, _) = ctx.post("/v1/users", &ctx.tess, carol.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.post("/v1/users", &ctx.alice, carol.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "Contributor");

    let (status, body) = ctx.post("/v1/users", &ctx.alice, carol).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "email");

    let (status, _) = ctx
        .delete(&format!("/v1/users/{}", ctx.bob.id), &ctx.alice)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.get("/v1/projects", &ctx.bob).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = ctx
        .get(&format!("/v1/projects/{}/tasks", project), &ctx.alice)
        .await;
    assert_eq!(body["counts"]["total"], 0);
}

#[tokio::test]
async fn test_task_edit_must_send_every_field() {
    let ctx = TestContext::new().await;
    let project = ctx.create_project(&ctx.alice, "Launch").await;
    let task = ctx
        .create_task(&ctx.alice, project, &ctx.bob, "Ship", "High")
        .await;

    let (status, _) = ctx
        .post(&format!("/v1/tasks/{}/toggle", task), &ctx.bob, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .put(
            &format!("/v1/tasks/{}", task),
            &ctx.bob,
            json!({
                "title": "Ship it",
                "description": "Partial edit",
                "due_date": "2030-02-01T09:00:00Z",
                "assigned_to_id": ctx.bob.id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (_, body) = ctx
        .get(&format!("/v1/projects/{}/tasks", project), &ctx.bob)
        .await;
    assert_eq!(body["tasks"][0]["title"], "Ship");
    assert_eq!(body["tasks"][0]["is_complete"], true);
    assert_eq!(body["tasks"][0]["priority"], "High");
}
