//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::auth::SessionKeys;
use crate::store::DocumentStore;

/// Where documents live
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// MongoDB at `uri`, using `database`
    Mongo { uri: String, database: String },
    /// One JSON file per collection under `dir`
    Json { dir: PathBuf },
}

/// Configuration for the portfolio server
#[derive(Clone, Debug)]
pub struct SiteConfig {
    /// Address to bind
    pub addr: SocketAddr,
    /// Document store selection
    pub backend: StoreBackend,
    /// HS256 key for session tokens
    pub jwt_secret: String,
    /// Shared secret for `POST /api/auth/create-admin`
    pub admin_secret_key: Option<String>,
    /// Set the `Secure` flag on session cookies
    pub secure_cookies: bool,
    /// Origins allowed to call `/api/*` with credentials
    pub allowed_origins: Vec<String>,
    /// Public site URL, used for unsubscribe redirects
    pub site_url: String,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

impl SiteConfig {
    /// Minimal config storing documents under `data_dir`.
    pub fn new(jwt_secret: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            backend: StoreBackend::Json {
                dir: data_dir.into(),
            },
            jwt_secret: jwt_secret.into(),
            admin_secret_key: None,
            secure_cookies: false,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            site_url: "http://localhost:3000".to_string(),
            bcrypt_cost: 10,
        }
    }

    /// Read configuration from the environment.
    ///
    /// Fails when `JWT_SECRET` is unset or blank; there is no fallback key.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => bail!("JWT_SECRET must be set; refusing to start without a session signing key"),
        };

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = match get("PORT") {
            Some(p) => p.parse().with_context(|| format!("Invalid PORT: {}", p))?,
            None => 3001,
        };
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

        let backend = match get("MONGODB_URI") {
            Some(uri) => StoreBackend::Mongo {
                uri,
                database: get("MONGODB_DB").unwrap_or_else(|| "portfolio".to_string()),
            },
            None => StoreBackend::Json {
                dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string())),
            },
        };

        let bcrypt_cost: u32 = match get("BCRYPT_COST") {
            Some(c) => c.parse().with_context(|| format!("Invalid BCRYPT_COST: {}", c))?,
            None => 10,
        };
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31, got {}", bcrypt_cost);
        }

        let allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            addr,
            backend,
            jwt_secret,
            admin_secret_key: get("ADMIN_SECRET_KEY"),
            secure_cookies: get("APP_ENV").as_deref() == Some("production"),
            allowed_origins,
            site_url: get("SITE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            bcrypt_cost,
        })
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SiteConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub keys: Arc<SessionKeys>,
}

impl AppState {
    pub fn new(config: SiteConfig, store: Arc<dyn DocumentStore>) -> Self {
        let keys = Arc::new(SessionKeys::new(&config.jwt_secret));
        Self {
            config: Arc::new(config),
            store,
            keys,
        }
    }

    /// Repository for one entity type over the shared store
    pub fn repo<T: crate::models::Entity>(&self) -> crate::store::Repository<T> {
        crate::store::Repository::new(self.store.clone())
    }

    pub fn users(&self) -> crate::store::UserStore {
        crate::store::UserStore::new(self.store.clone(), self.config.bcrypt_cost)
    }
}
