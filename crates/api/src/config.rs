//! Server configuration loaded from environment variables.

/// Which document-store backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Which blob-store backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobBackend {
    Gcs,
    Memory,
}

/// Server configuration.
///
/// All fields have defaults suitable for local development except the
/// Google project id. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Deployment environment name (`development` / `production`).
    pub app_env: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Google Cloud project id (Firestore + identity audience).
    pub project_id: String,
    /// Firestore collection holding character documents.
    pub collection: String,
    /// Cloud Storage bucket for character imagery.
    pub bucket: String,
    /// Document-store backend selection.
    pub store_backend: StoreBackend,
    /// Blob-store backend selection.
    pub blob_backend: BlobBackend,
    /// Skip identity verification and substitute a fixed test identity.
    /// Never valid in production.
    pub auth_bypass: bool,
    /// Identity substituted when `auth_bypass` is on.
    pub auth_bypass_uid: String,
    /// Simulated training duration in seconds (default: `120`).
    pub training_delay_secs: u64,
    /// Signed upload URL lifetime in seconds (default: `900`).
    pub upload_url_ttl_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `8080`                  |
    /// | `APP_ENV`              | `development`           |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `GOOGLE_PROJECT_ID`    | **required**            |
    /// | `CHARACTER_COLLECTION` | `characters`            |
    /// | `STORAGE_BUCKET`       | `{project id}.appspot.com` |
    /// | `STORE_BACKEND`        | `firestore`             |
    /// | `BLOB_BACKEND`         | `gcs`                   |
    /// | `AUTH_BYPASS`          | `false`                 |
    /// | `AUTH_BYPASS_UID`      | `local-test-user`       |
    /// | `TRAINING_DELAY_SECS`  | `120`                   |
    /// | `UPLOAD_URL_TTL_SECS`  | `900`                   |
    ///
    /// # Panics
    ///
    /// Panics on missing/invalid values, and if `AUTH_BYPASS` is enabled
    /// while `APP_ENV` is `production` -- the bypass must never be
    /// reachable in a production deployment.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let project_id =
            std::env::var("GOOGLE_PROJECT_ID").expect("GOOGLE_PROJECT_ID must be set");

        let collection =
            std::env::var("CHARACTER_COLLECTION").unwrap_or_else(|_| "characters".into());

        let bucket = std::env::var("STORAGE_BUCKET")
            .unwrap_or_else(|_| format!("{project_id}.appspot.com"));

        let store_backend = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".into())
            .as_str()
        {
            "firestore" => StoreBackend::Firestore,
            "memory" => StoreBackend::Memory,
            other => panic!("STORE_BACKEND must be 'firestore' or 'memory', got '{other}'"),
        };

        let blob_backend = match std::env::var("BLOB_BACKEND")
            .unwrap_or_else(|_| "gcs".into())
            .as_str()
        {
            "gcs" => BlobBackend::Gcs,
            "memory" => BlobBackend::Memory,
            other => panic!("BLOB_BACKEND must be 'gcs' or 'memory', got '{other}'"),
        };

        let auth_bypass = std::env::var("AUTH_BYPASS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        assert!(
            !(auth_bypass && app_env == "production"),
            "AUTH_BYPASS must not be enabled in production"
        );

        let auth_bypass_uid =
            std::env::var("AUTH_BYPASS_UID").unwrap_or_else(|_| "local-test-user".into());

        let training_delay_secs: u64 = std::env::var("TRAINING_DELAY_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("TRAINING_DELAY_SECS must be a valid u64");

        let upload_url_ttl_secs: u64 = std::env::var("UPLOAD_URL_TTL_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("UPLOAD_URL_TTL_SECS must be a valid u64");

        Self {
            host,
            port,
            app_env,
            cors_origins,
            request_timeout_secs,
            project_id,
            collection,
            bucket,
            store_backend,
            blob_backend,
            auth_bypass,
            auth_bypass_uid,
            training_delay_secs,
            upload_url_ttl_secs,
        }
    }
}
