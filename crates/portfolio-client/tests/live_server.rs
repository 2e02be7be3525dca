//! Client against a real server on an ephemeral port

use portfolio_client::{ApiClient, ClientError};
use portfolio_server::{build_state, config::SiteConfig, serve};
use reqwest::StatusCode;
use tempfile::TempDir;
use tokio::net::TcpListener;

async fn spawn_server(dir: &TempDir) -> String {
    let mut config = SiteConfig::new("client-test-secret", dir.path());
    config.bcrypt_cost = 4;
    config.admin_secret_key = Some("bootstrap".to_string());

    let state = build_state(config).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = serve(listener, state).await;
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_session_persists_across_calls() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = ApiClient::new(&base).unwrap();

    client
        .post::<serde_json::Value>(
            "auth/create-admin",
            &serde_json::json!({
                "name": "Admin",
                "email": "admin@example.com",
                "password": "admin-pass",
                "secretKey": "bootstrap"
            }),
        )
        .await
        .unwrap();

    let user = client.login("admin@example.com", "admin-pass").await.unwrap();
    assert_eq!(user.role, "admin");

    // Cookie from login authorizes the write
    client
        .post::<serde_json::Value>(
            "blog",
            &serde_json::json!({ "title": "From the client", "content": "Body", "featured": true }),
        )
        .await
        .unwrap();

    let featured = client.list_posts(Some(true)).await.unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0]["slug"], "from-the-client");

    client.logout().await.unwrap();
    let err = client
        .post::<serde_json::Value>(
            "blog",
            &serde_json::json!({ "title": "Denied", "content": "Body" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status: StatusCode::UNAUTHORIZED, .. }
    ));
}

#[tokio::test]
async fn test_public_helpers() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = ApiClient::new(&base).unwrap();

    let message = client.subscribe("reader@example.com", Some("Reader")).await.unwrap();
    assert_eq!(message, "Successfully subscribed to newsletter");

    match client.subscribe("reader@example.com", None).await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "Email already subscribed");
        }
        other => panic!("expected an API error, got {:?}", other.map(|_| ())),
    }

    let contact = client
        .submit_contact("Bob", "bob@example.com", Some("Hello"), "Nice site")
        .await
        .unwrap();
    assert_eq!(contact["read"], false);

    assert!(client.list_posts(None).await.unwrap().is_empty());
}
