//! End-to-end tests through the router, backed by a throwaway JSON store

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use portfolio_server::{build_state, config::SiteConfig, router};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN_SECRET: &str = "let-me-in";

struct TestApp {
    _dir: TempDir,
    app: Router,
    state: portfolio_server::config::AppState,
}

async fn setup() -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut config = SiteConfig::new("test-secret", dir.path());
    config.bcrypt_cost = 4;
    config.admin_secret_key = Some(ADMIN_SECRET.to_string());
    config.site_url = "https://site.test".to_string();

    let state = build_state(config).await.unwrap();
    TestApp {
        _dir: dir,
        app: router(state.clone()),
        state,
    }
}

fn request(method: Method, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

/// `token=...` from a Set-Cookie header
fn session_from(headers: &HeaderMap) -> String {
    let cookie = headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    cookie.split(';').next().unwrap().to_string()
}

async fn admin_session(app: &Router) -> String {
    let (status, headers, _) = send(
        app,
        request(
            Method::POST,
            "/api/auth/create-admin",
            Some(json!({
                "name": "Admin",
                "email": "admin@example.com",
                "password": "admin-pass",
                "secretKey": ADMIN_SECRET
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(headers.get(header::SET_COOKIE).is_none());

    let (status, headers, _) = send(
        app,
        request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "admin@example.com", "password": "admin-pass" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    session_from(&headers)
}

async fn user_session(app: &Router) -> String {
    let (status, headers, _) = send(
        app,
        request(
            Method::POST,
            "/api/auth/signup",
            Some(json!({ "name": "Jane", "email": "jane@example.com", "password": "hunter22" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    session_from(&headers)
}

#[tokio::test]
async fn test_signup_stores_hash_and_signs_in() {
    let t = setup().await;

    let (status, headers, body) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/signup",
            Some(json!({ "name": "Jane", "email": "Jane@Example.com", "password": "hunter22" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "jane@example.com");
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"].get("password").is_none());

    let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=604800"));

    let stored = t
        .state
        .users()
        .find_by_email("jane@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password, "hunter22");
    assert!(stored.password.starts_with("$2"));

    let cookie = session_from(&headers);
    let (status, _, body) = send(&t.app, request(Method::GET, "/api/auth/me", None, Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Jane");

    // Same email again
    let (status, _, body) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/signup",
            Some(json!({ "name": "Jane", "email": "jane@example.com", "password": "hunter22" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_logout_and_password_change() {
    let t = setup().await;
    let cookie = user_session(&t.app).await;

    let (status, _, body) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "jane@example.com", "password": "wrong-pass" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, _, _) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/change-password",
            Some(json!({ "currentPassword": "hunter22", "newPassword": "correct horse" })),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "jane@example.com", "password": "correct horse" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, headers, _) = send(&t.app, request(Method::POST, "/api/auth/logout", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let cleared = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with("token=;"));
    assert!(cleared.contains("Max-Age=0"));

    let (status, _, _) = send(&t.app, request(Method::GET, "/api/auth/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_admin_needs_secret() {
    let t = setup().await;
    let (status, _, body) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/create-admin",
            Some(json!({
                "name": "Mallory",
                "email": "mallory@example.com",
                "password": "whatever",
                "secretKey": "guess"
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid secret key");
}

#[tokio::test]
async fn test_content_writes_need_admin() {
    let t = setup().await;
    let post = json!({ "title": "Hello World", "content": "Body" });

    let (status, _, body) = send(&t.app, request(Method::POST, "/api/blog", Some(post.clone()), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let user = user_session(&t.app).await;
    let (status, _, _) = send(&t.app, request(Method::POST, "/api/blog", Some(post.clone()), Some(&user))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = admin_session(&t.app).await;
    let (status, _, _) = send(&t.app, request(Method::POST, "/api/blog", Some(post), Some(&admin))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_then_get_by_id_or_slug() {
    let t = setup().await;
    let admin = admin_session(&t.app).await;

    let (status, _, created) = send(
        &t.app,
        request(
            Method::POST,
            "/api/blog",
            Some(json!({ "title": "Hello World", "content": "Body", "featured": true })),
            Some(&admin),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let data = &created["data"];
    assert_eq!(data["slug"], "hello-world");
    assert_eq!(data["author"], "Admin");
    assert_eq!(data["published"], true);
    assert_eq!(data["tags"], json!([]));
    let id = data["_id"].as_str().unwrap();
    assert_eq!(id.len(), 24);

    let (status, _, by_id) = send(&t.app, request(Method::GET, &format!("/api/blog/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&by_id["data"], data);

    let (status, _, by_slug) = send(&t.app, request(Method::GET, "/api/blog/hello-world", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&by_slug["data"], data);

    let (_, _, featured) = send(&t.app, request(Method::GET, "/api/blog?featured=true", None, None)).await;
    assert_eq!(featured["data"].as_array().unwrap().len(), 1);
    let (_, _, not_featured) = send(&t.app, request(Method::GET, "/api/blog?featured=false", None, None)).await;
    assert_eq!(not_featured["data"], json!([]));

    let (status, _, _) = send(&t.app, request(Method::GET, "/api/blog/no-such-post", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_put_without_required_field_leaves_record() {
    let t = setup().await;
    let admin = admin_session(&t.app).await;

    let (_, _, created) = send(
        &t.app,
        request(
            Method::POST,
            "/api/services",
            Some(json!({ "title": "Audit", "description": "Full audit" })),
            Some(&admin),
        ),
    )
    .await;
    let id = created["data"]["_id"].as_str().unwrap().to_string();
    let uri = format!("/api/services/{}", id);

    let (status, _, body) = send(
        &t.app,
        request(Method::PUT, &uri, Some(json!({ "title": "Renamed" })), Some(&admin)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, _, current) = send(&t.app, request(Method::GET, &uri, None, None)).await;
    assert_eq!(current["data"], created["data"]);

    let (status, _, updated) = send(
        &t.app,
        request(
            Method::PUT,
            &uri,
            Some(json!({ "title": "Renamed", "description": "Full audit", "active": false })),
            Some(&admin),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["title"], "Renamed");
    assert_eq!(updated["data"]["createdAt"], created["data"]["createdAt"]);

    let (_, _, active) = send(&t.app, request(Method::GET, "/api/services?active=true", None, None)).await;
    assert_eq!(active["data"], json!([]));
}

#[tokio::test]
async fn test_delete_missing_is_404_every_time() {
    let t = setup().await;
    let admin = admin_session(&t.app).await;

    for uri in [
        "/api/projects/507f1f77bcf86cd799439011",
        "/api/projects/507f1f77bcf86cd799439011",
        "/api/projects/not-an-id",
    ] {
        let (status, _, body) = send(&t.app, request(Method::DELETE, uri, None, Some(&admin))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Project not found");
    }
}

#[tokio::test]
async fn test_malformed_body_is_an_envelope() {
    let t = setup().await;
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/contacts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, _, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_contact_inbox() {
    let t = setup().await;

    let (status, _, created) = send(
        &t.app,
        request(
            Method::POST,
            "/api/contacts",
            Some(json!({ "name": "Bob", "email": "bob@example.com", "message": "Hi", "read": true })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["read"], false);

    let (status, _, _) = send(&t.app, request(Method::GET, "/api/contacts", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = admin_session(&t.app).await;
    let id = created["data"]["_id"].as_str().unwrap();
    let (status, _, updated) = send(
        &t.app,
        request(
            Method::PUT,
            &format!("/api/contacts/{}", id),
            Some(json!({ "read": true })),
            Some(&admin),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["read"], true);

    let (_, _, list) = send(&t.app, request(Method::GET, "/api/contacts", None, Some(&admin))).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_settings_defaults_and_upsert() {
    let t = setup().await;

    let (status, _, defaults) = send(&t.app, request(Method::GET, "/api/settings", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(defaults["data"]["maintenanceMode"], false);

    let admin = admin_session(&t.app).await;
    let (status, _, first) = send(
        &t.app,
        request(
            Method::PUT,
            "/api/settings",
            Some(json!({ "siteName": "Jane Doe", "socialLinks": { "github": "https://github.com/jane" } })),
            Some(&admin),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, second) = send(
        &t.app,
        request(Method::PUT, "/api/settings", Some(json!({ "heroTitle": "Hi" })), Some(&admin)),
    )
    .await;
    assert_eq!(second["data"]["_id"], first["data"]["_id"]);
    assert_eq!(second["data"]["siteName"], "Jane Doe");
    assert_eq!(second["data"]["heroTitle"], "Hi");

    let (_, _, stored) = send(&t.app, request(Method::GET, "/api/settings", None, None)).await;
    assert_eq!(stored["data"]["socialLinks"]["github"], "https://github.com/jane");
}

#[tokio::test]
async fn test_subscribe_twice() {
    let t = setup().await;
    let body = json!({ "email": "a@b.com" });

    let (status, _, first) = send(&t.app, request(Method::POST, "/api/newsletter/subscribe", Some(body.clone()), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["success"], true);

    let (status, _, second) = send(&t.app, request(Method::POST, "/api/newsletter/subscribe", Some(body), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(second, json!({ "success": false, "message": "Email already subscribed" }));

    let (_, _, status_body) = send(
        &t.app,
        request(Method::GET, "/api/newsletter/subscribe?email=a@b.com", None, None),
    )
    .await;
    assert_eq!(status_body["data"]["subscribed"], true);
}

#[tokio::test]
async fn test_unsubscribe_link_redirects() {
    let t = setup().await;
    let token = portfolio_server::handlers::newsletter::encode_unsubscribe_token("a@b.com");
    let link = format!("/api/newsletter/unsubscribe?token={}", token.replace('=', "%3D"));

    // Not subscribed yet
    let (status, headers, _) = send(&t.app, request(Method::GET, &link, None, None)).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        "https://site.test/newsletter/unsubscribe?status=error"
    );

    let (status, headers, _) = send(
        &t.app,
        request(Method::GET, "/api/newsletter/unsubscribe?token=%21%21%21", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        "https://site.test/newsletter/unsubscribe?status=invalid"
    );

    send(
        &t.app,
        request(Method::POST, "/api/newsletter/subscribe", Some(json!({ "email": "a@b.com" })), None),
    )
    .await;
    let (_, headers, _) = send(&t.app, request(Method::GET, &link, None, None)).await;
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        "https://site.test/newsletter/unsubscribe?status=success"
    );

    let (_, _, status_body) = send(
        &t.app,
        request(Method::GET, "/api/newsletter/subscribe?email=a@b.com", None, None),
    )
    .await;
    assert_eq!(status_body["data"]["subscribed"], false);

    // Resubscribing reactivates the same record
    let (status, _, body) = send(
        &t.app,
        request(Method::POST, "/api/newsletter/subscribe", Some(json!({ "email": "a@b.com" })), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully resubscribed to newsletter");
}

#[tokio::test]
async fn test_admin_subscriber_routes() {
    let t = setup().await;
    for email in ["one@example.com", "two@example.com"] {
        send(
            &t.app,
            request(Method::POST, "/api/newsletter/subscribe", Some(json!({ "email": email })), None),
        )
        .await;
    }
    send(
        &t.app,
        request(
            Method::POST,
            "/api/newsletter/unsubscribe",
            Some(json!({ "email": "two@example.com" })),
            None,
        ),
    )
    .await;

    let (status, _, _) = send(&t.app, request(Method::GET, "/api/admin/subscribers", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = user_session(&t.app).await;
    let (status, _, _) = send(&t.app, request(Method::GET, "/api/admin/subscribers", None, Some(&user))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = admin_session(&t.app).await;
    let (_, _, all) = send(&t.app, request(Method::GET, "/api/admin/subscribers", None, Some(&admin))).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    let (_, _, inactive) = send(
        &t.app,
        request(Method::GET, "/api/admin/subscribers?active=false", None, Some(&admin)),
    )
    .await;
    let inactive = inactive["data"].as_array().unwrap();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0]["email"], "two@example.com");
    assert!(inactive[0]["unsubscribedAt"].is_string());

    let id = inactive[0]["_id"].as_str().unwrap();
    let (status, _, updated) = send(
        &t.app,
        request(
            Method::PUT,
            &format!("/api/admin/subscribers/{}", id),
            Some(json!({ "active": true })),
            Some(&admin),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["active"], true);
    assert!(updated["data"]["unsubscribedAt"].is_null());

    let (status, _, _) = send(
        &t.app,
        request(Method::DELETE, &format!("/api/admin/subscribers/{}", id), None, Some(&admin)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight() {
    let t = setup().await;

    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/blog")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let (status, headers, _) = send(&t.app, preflight("http://localhost:3000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );

    let (_, headers, _) = send(&t.app, preflight("https://evil.example")).await;
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_health() {
    let t = setup().await;
    let (status, _, body) = send(&t.app, request(Method::GET, "/api/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_unmatched_requests_get_envelopes() {
    let t = setup().await;

    let (status, _, body) = send(&t.app, request(Method::GET, "/api/nope", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "Route not found" }));

    let (status, _, body) = send(&t.app, request(Method::PATCH, "/api/blog", None, None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "success": false, "message": "Method not allowed" }));

    let (status, _, body) = send(&t.app, request(Method::GET, "/elsewhere", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
