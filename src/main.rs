// src/main.rs

use std::{net::SocketAddr, sync::Arc, time::Duration};

use code_clash::{
    cache::{FileCache, SessionCache},
    config::{Config, SESSION_SWEEP_SECONDS},
    routes,
    state::AppState,
    store::{MemoryStore, PgStore, QuizStore, memory::OFFLINE_QUIZ_CODE},
};
use dotenvy::dotenv;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store: Arc<dyn QuizStore> = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url).await;

            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Migrations applied successfully.");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set, running offline with quiz {}",
                OFFLINE_QUIZ_CODE
            );
            Arc::new(MemoryStore::with_offline_quiz())
        }
    };

    let cache: Arc<dyn SessionCache> = Arc::new(FileCache::new(&config.session_cache_dir));
    tracing::info!("Session recovery logs under {}", config.session_cache_dir);

    let port = config.server_port;
    let state = AppState::new(store, cache, config).expect("Failed to prepare admin credentials");

    state
        .sessions
        .clone()
        .spawn_sweeper(Duration::from_secs(SESSION_SWEEP_SECONDS));

    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    axum::serve(listener, app).await.expect("Server error");
}

/// Connects to Postgres, retrying while the database starts up.
async fn connect_with_retry(url: &str) -> PgPool {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return pool;
            }
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
