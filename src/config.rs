// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Seconds a participant session ticks between countdown decrements.
pub const TICK_PERIOD_SECONDS: u64 = 1;

/// How often submitted sessions are dropped from the live registry.
pub const SESSION_SWEEP_SECONDS: u64 = 60;

/// Quiz codes are typed by hand; anything outside this window is rejected before lookup.
pub const MIN_QUIZ_CODE_LEN: usize = 6;
pub const MAX_QUIZ_CODE_LEN: usize = 20;

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` runs the service in offline mode.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Admin token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: String,
    pub admin_password: String,
    /// Directory holding per-session recovery logs.
    pub session_cache_dir: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_username =
            env::var("ADMIN_USERNAME").unwrap_or_else(|_| DEFAULT_ADMIN_USERNAME.to_string());

        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            eprintln!("ADMIN_PASSWORD not set, falling back to the default admin password");
            DEFAULT_ADMIN_PASSWORD.to_string()
        });

        let session_cache_dir =
            env::var("SESSION_CACHE_DIR").unwrap_or_else(|_| "session_cache".to_string());

        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username,
            admin_password,
            session_cache_dir,
            server_port,
        }
    }
}
