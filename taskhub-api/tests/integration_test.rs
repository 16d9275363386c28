/// Integration tests for the Taskhub API
///
/// These tests drive the real router over in-memory repositories:
/// - Registration, login, logout and profile endpoints
/// - Task lifecycle (create → complete → delete → restore)
/// - Ownership isolation between accounts
/// - Category rename and delete
/// - Rate limiting
/// - CORS origin handling

mod common;

use axum::http::{header, StatusCode};
use common::{
    body_json, empty_request, json_request, session_cookie, set_cookie_header, test_config,
    TestContext, PASSWORD,
};
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let response = ctx.send(empty_request("GET", "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "in-memory");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_register_sets_cookie_and_hides_password() {
    let ctx = TestContext::new();

    let response = ctx
        .send(json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({ "email": "alice@example.com", "password": PASSWORD, "displayName": "Alice" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = set_cookie_header(&response);
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=604800"));
    assert!(!cookie.contains("Secure"));

    let body = body_json(response).await;
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["displayName"], "Alice");
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let ctx = TestContext::new();
    ctx.register("alice@example.com", "Alice").await;

    let response = ctx
        .send(json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({ "email": "alice@example.com", "password": PASSWORD, "displayName": "Other" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], "3004");
}

#[tokio::test]
async fn test_register_weak_password_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .send(json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({ "email": "bob@example.com", "password": "abc", "displayName": "Bob" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "3003");
}

#[tokio::test]
async fn test_register_missing_fields_reports_details() {
    let ctx = TestContext::new();

    let response = ctx
        .send(json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({ "email": "", "password": PASSWORD, "displayName": "Bob" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["details"]["fields"][0]["field"], "email");
}

#[tokio::test]
async fn test_login_flow() {
    let ctx = TestContext::new();
    ctx.register("alice@example.com", "Alice").await;

    let wrong = ctx
        .send(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": "wrong-pass1!" }),
        ))
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong).await["code"], "3005");

    let unknown = ctx
        .send(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(unknown).await["code"], "3005");

    // Browser-session cookie without rememberMe
    let response = ctx
        .send(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!set_cookie_header(&response).contains("Max-Age"));
    let cookie = session_cookie(&response).unwrap();

    let me = ctx.send(empty_request("GET", "/v1/auth/me", Some(&cookie))).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(body_json(me).await["email"], "alice@example.com");

    // Persistent cookie with rememberMe
    let remembered = ctx
        .send(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": PASSWORD, "rememberMe": true }),
        ))
        .await;
    assert!(set_cookie_header(&remembered).contains("Max-Age=604800"));
}

#[tokio::test]
async fn test_me_requires_session() {
    let ctx = TestContext::new();

    let response = ctx.send(empty_request("GET", "/v1/auth/me", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bogus = ctx
        .send(empty_request("GET", "/v1/auth/me", Some("session_id=not-a-session")))
        .await;
    assert_eq!(bogus.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(bogus).await["code"], "3006");

    // Well-formed but never issued
    let unknown = format!("session_id={}", "A".repeat(48));
    let response = ctx
        .send(empty_request("GET", "/v1/auth/me", Some(&unknown)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "3006");
}

#[tokio::test]
async fn test_malformed_session_cookie_rejected() {
    let ctx = TestContext::new();
    ctx.register("alice@example.com", "Alice").await;

    for cookie in [
        "session_id=../../etc/passwd",
        "session_id=short",
        "session_id=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA!",
    ] {
        let response = ctx.send(empty_request("GET", "/v1/tasks", Some(cookie))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", cookie);
        assert_eq!(body_json(response).await["code"], "3006");
    }
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice@example.com", "Alice").await;

    let response = ctx
        .send(empty_request("POST", "/v1/auth/logout", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(set_cookie_header(&response).contains("Max-Age=0"));

    let me = ctx.send(empty_request("GET", "/v1/auth/me", Some(&cookie))).await;
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile_and_password() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice@example.com", "Alice").await;

    let response = ctx
        .send(json_request(
            "PUT",
            "/v1/auth/me",
            Some(&cookie),
            json!({ "displayName": "  Alice Liddell " }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["displayName"], "Alice Liddell");

    let wrong = ctx
        .send(json_request(
            "PUT",
            "/v1/auth/password",
            Some(&cookie),
            json!({ "currentPassword": "nope", "newPassword": "fresh9?pass" }),
        ))
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let changed = ctx
        .send(json_request(
            "PUT",
            "/v1/auth/password",
            Some(&cookie),
            json!({ "currentPassword": PASSWORD, "newPassword": "fresh9?pass" }),
        ))
        .await;
    assert_eq!(changed.status(), StatusCode::NO_CONTENT);

    let login = ctx
        .send(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": "fresh9?pass" }),
        ))
        .await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice@example.com", "Alice").await;

    let task = ctx.create_task(&cookie, "Buy milk", "groceries").await;
    let id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["completed"], false);
    assert!(task["deletedAt"].is_null());
    ctx.create_task(&cookie, "Write report", "work").await;

    let completed = ctx
        .send(json_request(
            "PUT",
            &format!("/v1/tasks/{}/complete", id),
            Some(&cookie),
            json!({ "completed": true }),
        ))
        .await;
    assert_eq!(completed.status(), StatusCode::OK);
    assert_eq!(body_json(completed).await["completed"], true);

    let filtered = ctx
        .send(empty_request("GET", "/v1/tasks?completed=true", Some(&cookie)))
        .await;
    let page = body_json(filtered).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["tasks"][0]["id"], id.as_str());

    let deleted = ctx
        .send(empty_request("DELETE", &format!("/v1/tasks/{}", id), Some(&cookie)))
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert!(body_json(deleted).await["deletedAt"].is_string());

    let again = ctx
        .send(empty_request("DELETE", &format!("/v1/tasks/{}", id), Some(&cookie)))
        .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(again).await["code"], "3010");

    let live = body_json(ctx.send(empty_request("GET", "/v1/tasks", Some(&cookie))).await).await;
    assert_eq!(live["total"], 1);

    let all = body_json(
        ctx.send(empty_request("GET", "/v1/tasks?includeDeleted=true", Some(&cookie)))
            .await,
    )
    .await;
    assert_eq!(all["total"], 2);

    let restored = ctx
        .send(empty_request(
            "POST",
            &format!("/v1/tasks/{}/restore", id),
            Some(&cookie),
        ))
        .await;
    assert_eq!(restored.status(), StatusCode::OK);
    let restored = body_json(restored).await;
    assert!(restored["deletedAt"].is_null());
    assert_eq!(restored["completed"], true);

    let not_deleted = ctx
        .send(empty_request(
            "POST",
            &format!("/v1/tasks/{}/restore", id),
            Some(&cookie),
        ))
        .await;
    assert_eq!(not_deleted.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(not_deleted).await["code"], "3011");
}

#[tokio::test]
async fn test_create_task_validation() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice@example.com", "Alice").await;

    let blank = ctx
        .send(json_request(
            "POST",
            "/v1/tasks",
            Some(&cookie),
            json!({ "description": "   " }),
        ))
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let too_long = ctx
        .send(json_request(
            "POST",
            "/v1/tasks",
            Some(&cookie),
            json!({ "description": "x".repeat(10_001) }),
        ))
        .await;
    assert_eq!(too_long.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(too_long).await["code"], "3008");

    let malformed = ctx
        .send(
            axum::http::Request::builder()
                .method("POST")
                .uri("/v1/tasks")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, &cookie)
                .body(axum::body::Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(malformed).await["code"], "4001");
}

#[tokio::test]
async fn test_create_task_with_null_category() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice@example.com", "Alice").await;

    let response = ctx
        .send(json_request(
            "POST",
            "/v1/tasks",
            Some(&cookie),
            json!({ "description": "no label", "category": null }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["category"], "");
}

#[tokio::test]
async fn test_list_category_filter_is_trimmed() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice@example.com", "Alice").await;

    let task = ctx.create_task(&cookie, "report", " work ").await;
    assert_eq!(task["category"], "work");
    ctx.create_task(&cookie, "laundry", "home").await;

    let page = body_json(
        ctx.send(empty_request("GET", "/v1/tasks?category=%20work%20", Some(&cookie)))
            .await,
    )
    .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["tasks"][0]["description"], "report");
}

#[tokio::test]
async fn test_list_filters_validated() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice@example.com", "Alice").await;

    let response = ctx
        .send(empty_request("GET", "/v1/tasks?limit=1001", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "3015");

    for i in 0..3 {
        ctx.create_task(&cookie, &format!("task {}", i), "").await;
    }
    let page = body_json(
        ctx.send(empty_request("GET", "/v1/tasks?limit=2&offset=2", Some(&cookie)))
            .await,
    )
    .await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["tasks"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_tasks_are_isolated_between_users() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com", "Alice").await;
    let bob = ctx.register("bob@example.com", "Bob").await;

    let task = ctx.create_task(&alice, "Alice's secret", "private").await;
    let id = task["id"].as_str().unwrap();

    let peek = ctx
        .send(empty_request("GET", &format!("/v1/tasks/{}", id), Some(&bob)))
        .await;
    assert_eq!(peek.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(peek).await["code"], "3009");

    let delete = ctx
        .send(empty_request("DELETE", &format!("/v1/tasks/{}", id), Some(&bob)))
        .await;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    let bogus = ctx
        .send(empty_request("GET", "/v1/tasks/not-a-uuid", Some(&bob)))
        .await;
    assert_eq!(bogus.status(), StatusCode::NOT_FOUND);

    let list = body_json(ctx.send(empty_request("GET", "/v1/tasks", Some(&bob))).await).await;
    assert_eq!(list["total"], 0);

    let categories =
        body_json(ctx.send(empty_request("GET", "/v1/categories", Some(&bob))).await).await;
    assert_eq!(categories["categories"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_category_rename_and_delete() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice@example.com", "Alice").await;

    ctx.create_task(&cookie, "Buy milk", "groceries").await;
    ctx.create_task(&cookie, "Buy eggs", "groceries").await;
    ctx.create_task(&cookie, "Write report", "work").await;

    let listing =
        body_json(ctx.send(empty_request("GET", "/v1/categories", Some(&cookie))).await).await;
    assert_eq!(listing["categories"][0]["name"], "groceries");
    assert_eq!(listing["categories"][0]["taskCount"], 2);
    assert_eq!(listing["categories"][1]["name"], "work");

    let renamed = ctx
        .send(json_request(
            "PUT",
            "/v1/categories/groceries",
            Some(&cookie),
            json!({ "newName": "shopping" }),
        ))
        .await;
    assert_eq!(renamed.status(), StatusCode::OK);
    let renamed = body_json(renamed).await;
    assert_eq!(renamed["name"], "shopping");
    assert_eq!(renamed["updatedTasks"], 2);

    let missing = ctx
        .send(json_request(
            "PUT",
            "/v1/categories/groceries",
            Some(&cookie),
            json!({ "newName": "food" }),
        ))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await["code"], "3013");

    let deleted = ctx
        .send(empty_request("DELETE", "/v1/categories/work", Some(&cookie)))
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(body_json(deleted).await["updatedTasks"], 1);

    let listing =
        body_json(ctx.send(empty_request("GET", "/v1/categories", Some(&cookie))).await).await;
    let names: Vec<&str> = listing["categories"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names, vec!["shopping"]);
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let ctx = TestContext::with_rate_limit(3);

    for _ in 0..3 {
        let response = ctx.send(empty_request("GET", "/v1/auth/me", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-ratelimit-remaining"));
    }

    let limited = ctx.send(empty_request("GET", "/v1/auth/me", None)).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(limited.headers().get("x-ratelimit-remaining").unwrap(), "0");
    assert_eq!(body_json(limited).await["code"], "4003");

    // Health is outside the limited tree
    let health = ctx.send(empty_request("GET", "/health", None)).await;
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_wildcard_never_allows_credentials() {
    let ctx = TestContext::new();

    let mut request = empty_request("GET", "/health", None);
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://evil.example".parse().unwrap());
    let response = ctx.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS));
}

#[tokio::test]
async fn test_cors_explicit_origins() {
    let mut config = test_config();
    config.api.cors_origins = vec!["https://app.example".to_string()];
    let ctx = TestContext::with_config(config);

    let mut listed = empty_request("GET", "/health", None);
    listed
        .headers_mut()
        .insert(header::ORIGIN, "https://app.example".parse().unwrap());
    let response = ctx.send(listed).await;
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://app.example"
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );

    let mut foreign = empty_request("GET", "/health", None);
    foreign
        .headers_mut()
        .insert(header::ORIGIN, "https://evil.example".parse().unwrap());
    let response = ctx.send(foreign).await;
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
