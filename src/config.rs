use std::env;
use std::path::PathBuf;

/// Process-wide configuration, read once at startup and passed explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    /// Directory the `uploads/` attachment directory lives under.
    pub app_root: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        if jwt_secret.is_empty() {
            panic!("JWT_SECRET cannot be empty");
        }

        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:staffdir.db".to_string());
        let app_root = env::var("APP_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        AppConfig {
            bind_addr: format!("127.0.0.1:{}", port),
            database_url,
            jwt_secret,
            app_root,
        }
    }
}
