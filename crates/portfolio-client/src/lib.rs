//! Portfolio API Client
//!
//! Thin wrapper over `reqwest` for the portfolio site API. The client keeps
//! a cookie store, so a session established by [`ApiClient::login`] is sent
//! on every later call.

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
    #[error("Response had no data")]
    MissingData,
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// The `{success, message, data?}` body every route returns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> Result<T> {
        self.data.ok_or(ClientError::MissingData)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Client for the server at `base_url`, e.g. `http://localhost:3001`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Envelope<T>> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut req = self.http.request(method, &url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await?;
        let status = response.status();
        let envelope: Envelope<T> = response.json().await?;

        if !status.is_success() || !envelope.success {
            return Err(ClientError::Api {
                status,
                message: envelope.message,
            });
        }
        Ok(envelope)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<Envelope<T>> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<Envelope<T>> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>> {
        self.request(Method::DELETE, path, None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser> {
        self.post("auth/login", &json!({ "email": email, "password": password }))
            .await?
            .into_data()
    }

    pub async fn logout(&self) -> Result<()> {
        self.post::<Value>("auth/logout", &json!({})).await?;
        Ok(())
    }

    /// Returns the server's message, which tells a new subscription
    /// apart from a reactivated one
    pub async fn subscribe(&self, email: &str, name: Option<&str>) -> Result<String> {
        let envelope = self
            .post::<Value>("newsletter/subscribe", &json!({ "email": email, "name": name }))
            .await?;
        Ok(envelope.message)
    }

    pub async fn list_posts(&self, featured: Option<bool>) -> Result<Vec<Value>> {
        let path = match featured {
            Some(flag) => format!("blog?featured={}", flag),
            None => "blog".to_string(),
        };
        self.get(&path).await?.into_data()
    }

    pub async fn submit_contact(
        &self,
        name: &str,
        email: &str,
        subject: Option<&str>,
        message: &str,
    ) -> Result<Value> {
        self.post(
            "contacts",
            &json!({ "name": name, "email": email, "subject": subject, "message": message }),
        )
        .await?
        .into_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("http://localhost:3001/").unwrap();
        assert_eq!(client.url("/blog"), "http://localhost:3001/api/blog");
        assert_eq!(client.url("auth/me"), "http://localhost:3001/api/auth/me");
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: Envelope<Value> =
            serde_json::from_str(r#"{"success":false,"message":"Email already subscribed"}"#)
                .unwrap();
        assert!(!envelope.success);
        assert!(matches!(envelope.into_data(), Err(ClientError::MissingData)));
    }
}
