use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use budget_tracker::config::{Environment, JwtSettings};
use budget_tracker::identity::InMemoryIdentityProvider;
use budget_tracker::repositories::InMemoryStore;
use budget_tracker::{AppState, router};

fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "api_test_secret_with_enough_length".to_string(),
        issuer: "budget-tracker".to_string(),
        audience: "budget-tracker-clients".to_string(),
        access_token_minutes: 30,
    }
}

/// Helper function to create the application over empty in-memory stores
fn create_test_app() -> Router {
    let state = AppState::in_memory(
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryIdentityProvider::new()),
        &jwt_settings(),
        Environment::Production,
    );
    router(state)
}

/// Helper function to parse JSON response body
async fn parse_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn register(app: &Router, email: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": "password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    parse_json_body(response).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn create_account(app: &Router, token: &str, name: &str, currency: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/accounts",
        Some(token),
        Some(json!({ "name": name, "currency": currency })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_json_body(response).await["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let response = send(&app, "GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = create_test_app();

    let response = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "ann@example.com", "password": "password123", "userName": "Ann" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_json_body(response).await;
    assert_eq!(body["expiresInSeconds"], 1800);
    assert_eq!(body["userName"], "Ann");
    assert_eq!(body["roles"], json!([]));

    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "ann@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login = parse_json_body(response).await;
    assert_eq!(login["userId"], body["userId"]);
    let token = login["accessToken"].as_str().unwrap();

    let response = send(&app, "GET", "/api/auth/me", Some(token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = parse_json_body(response).await;
    assert_eq!(me["userId"], body["userId"]);
    assert_eq!(me["name"], "Ann");
    assert_eq!(me["email"], "ann@example.com");
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let app = create_test_app();
    register(&app, "ann@example.com").await;

    let mut details = Vec::new();
    for (email, password) in [
        ("ann@example.com", "wrong_password1"),
        ("nobody@example.com", "password123"),
    ] {
        let response = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = parse_json_body(response).await;
        assert_eq!(body["code"], "auth.unauthorized");
        details.push(body["detail"].clone());
    }
    assert_eq!(details[0], details[1]);
    assert_eq!(details[0], "Invalid Email or password");
}

#[tokio::test]
async fn test_duplicate_registration_is_unhandled_without_detail() {
    let app = create_test_app();
    register(&app, "ann@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "ann@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_json_body(response).await;
    assert_eq!(body["code"], "common.unhandled");
    assert!(body.get("detail").is_none());
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = create_test_app();

    let response = send(&app, "GET", "/api/accounts", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = parse_json_body(response).await;
    assert_eq!(body["status"], 401);
    assert_eq!(body["title"], "Unauthorized");
    assert_eq!(body["code"], "auth.unauthorized");
    assert_eq!(body["instance"], "/api/accounts");
    assert!(body["traceId"].is_string());

    let response = send(&app, "GET", "/api/accounts", Some("not-a-token"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_trace_id_is_echoed() {
    let app = create_test_app();
    let request = Request::builder()
        .uri("/api/accounts")
        .header("x-request-id", "trace-abc")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-abc");
    let body = parse_json_body(response).await;
    assert_eq!(body["traceId"], "trace-abc");
}

#[tokio::test]
async fn test_account_lifecycle() {
    let app = create_test_app();
    let token = register(&app, "ann@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/accounts",
        Some(&token),
        Some(json!({ "name": "  Main card ", "currency": "usd" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body = parse_json_body(response).await;
    assert_eq!(location, format!("/api/accounts/{}", body["id"].as_str().unwrap()));
    assert_eq!(body["name"], "Main card");
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["isArchived"], false);

    let response = send(
        &app,
        "POST",
        "/api/accounts",
        Some(&token),
        Some(json!({ "name": "Main card", "currency": "EUR" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = parse_json_body(response).await;
    assert_eq!(body["code"], "db.conflict");
    assert_eq!(body["detail"], "AccountWithTheSameNameExists");

    let other = register(&app, "bob@example.com").await;
    let response = send(&app, "GET", "/api/accounts", Some(&other), None).await;
    assert_eq!(parse_json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_validation_failure_lists_every_field() {
    let app = create_test_app();
    let token = register(&app, "ann@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/accounts",
        Some(&token),
        Some(json!({ "name": "", "currency": "dollars" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_json_body(response).await;
    assert_eq!(body["code"], "validation.failed");
    assert_eq!(body["title"], "Validation Failed");
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["currency"].is_array());
}

#[tokio::test]
async fn test_malformed_json_and_unknown_enum() {
    let app = create_test_app();
    let token = register(&app, "ann@example.com").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/categories")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_json_body(response).await["code"], "http.invalid_json");

    let response = send(
        &app,
        "POST",
        "/api/categories",
        Some(&token),
        Some(json!({ "name": "Food", "type": "Transfer" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_json_body(response).await["title"], "Invalid JSON");
}

#[tokio::test]
async fn test_category_tree_rules() {
    let app = create_test_app();
    let token = register(&app, "ann@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/categories",
        Some(&token),
        Some(json!({ "name": "Salary", "type": "Income" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let salary = parse_json_body(response).await["id"].clone();

    let response = send(
        &app,
        "POST",
        "/api/categories",
        Some(&token),
        Some(json!({ "name": "Rent", "type": "Expense", "parentId": salary })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        parse_json_body(response).await["detail"],
        "ParentAndChildCategoryMustMatch"
    );

    let response = send(
        &app,
        "POST",
        "/api/categories",
        Some(&token),
        Some(json!({
            "name": "Rent",
            "type": "Expense",
            "parentId": "00000000-0000-0000-0000-000000000001"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(parse_json_body(response).await["detail"], "ParentCategoryNotFound");
}

#[tokio::test]
async fn test_transaction_create_and_query() {
    let app = create_test_app();
    let token = register(&app, "ann@example.com").await;
    let card = create_account(&app, &token, "Card", "USD").await;

    for (day, amount) in [("2024-01-02", "10.00"), ("2024-01-05", "20.50"), ("2024-01-09", "30")] {
        let response = send(
            &app,
            "POST",
            "/api/transactions",
            Some(&token),
            Some(json!({
                "accountId": card,
                "type": "Expense",
                "amount": amount,
                "currency": "usd",
                "occurredAtUtc": format!("{}T12:00:00Z", day),
                "note": "  lunch  "
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = parse_json_body(response).await;
        assert_eq!(body["note"], "lunch");
        assert_eq!(body["currency"], "USD");
    }

    let uri = format!(
        "/api/transactions?fromUtc=2024-01-03T00:00:00Z&toUtc=2024-01-31T00:00:00Z&accountId={}&page=2&pageSize=1",
        card
    );
    let response = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_json_body(response).await;
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pageSize"], 1);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["occurredAtUtc"], "2024-01-05T12:00:00Z");
}

#[tokio::test]
async fn test_transaction_rule_failures() {
    let app = create_test_app();
    let token = register(&app, "ann@example.com").await;
    let card = create_account(&app, &token, "Card", "EUR").await;

    let response = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({ "accountId": card, "type": "Expense", "amount": "5", "currency": "USD" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        parse_json_body(response).await["detail"],
        "Currency does not match the account currency"
    );

    let response = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({
            "accountId": "00000000-0000-0000-0000-000000000001",
            "type": "Expense",
            "amount": "5",
            "currency": "EUR"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(parse_json_body(response).await["detail"], "Account not found");

    let response = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({
            "accountId": card,
            "type": "Expense",
            "amount": "100000000000000000.00",
            "currency": "EUR"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_json_body(response).await;
    assert_eq!(body["code"], "validation.failed");
    assert_eq!(
        body["errors"]["amount"][0],
        "Amount must not exceed 9999999999999999.99"
    );
}

#[tokio::test]
async fn test_query_validation_uses_blank_key_for_window() {
    let app = create_test_app();
    let token = register(&app, "ann@example.com").await;

    let response = send(
        &app,
        "GET",
        "/api/transactions?fromUtc=2024-02-01T00:00:00Z&toUtc=2024-01-01T00:00:00Z&pageSize=500",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_json_body(response).await;
    assert_eq!(body["errors"][""][0], "FromUtc must be before ToUtc.");
    assert_eq!(body["errors"]["pageSize"][0], "PageSize must be between 1 and 200");

    let response = send(&app, "GET", "/api/transactions?page=abc", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_json_body(response).await["code"], "http.bad_request");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = create_test_app();
    let response = send(&app, "GET", "/api/docs/openapi.json", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_json_body(response).await;
    assert!(body["paths"]["/api/transactions"].is_object());
}
