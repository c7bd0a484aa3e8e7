use crate::{
    app::{App, DEFAULT_MAX_ATTEMPTS},
    codegen::{DEFAULT_CODE_LENGTH, MAX_CODE_LENGTH},
    db::{LinksDB, MemoryDb, PostgresDb},
    db_pool::DbPool,
    handler::{handle_health, handle_home, handle_redirect, handle_shorten},
    migrations::run_migrations,
};
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use clap::{Parser, ValueEnum};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod clicks;
mod codegen;
mod db;
mod db_pool;
mod handler;
mod migrations;
mod models;
mod schema;
mod signals;

#[cfg(not(debug_assertions))]
#[must_use]
pub const fn is_debug() -> bool {
    false
}

#[cfg(debug_assertions)]
#[must_use]
pub const fn is_debug() -> bool {
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Storage {
    Postgres,
    Memory,
}

#[derive(Parser, Debug)]
struct Arguments {
    #[arg(long, default_value_t = true, help = "Relax CORS", env = "RELAX_CORS")]
    cors_relaxed: bool,

    #[arg(long, default_value_t = 8080, help = "Port to listen on", env = "PORT")]
    port: u16,

    #[arg(long, default_value_t = String::from("http://localhost:8080"), help = "Public URL prefix of short links", env = "BASE_URL")]
    base_url: String,

    #[arg(long, value_enum, default_value_t = Storage::Postgres, help = "Link storage backend", env = "STORAGE")]
    storage: Storage,

    #[arg(long, help = "Postgres connection string", env = "DATABASE_URL")]
    db_url: Option<String>,

    #[arg(
        long,
        default_value_t = 10,
        help = "DB pool size",
        env = "DB_POOL_SIZE"
    )]
    db_pool_size: usize,

    #[arg(long, default_value_t = false, help = "Use TLS for DB connections", env = "DB_TLS")]
    db_tls: bool,

    #[arg(
        long,
        default_value_t = DEFAULT_CODE_LENGTH as u8,
        value_parser = clap::value_parser!(u8).range(1..=MAX_CODE_LENGTH as i64),
        help = "Short code length",
        env = "CODE_LENGTH"
    )]
    code_length: u8,

    #[arg(
        long,
        default_value_t = DEFAULT_MAX_ATTEMPTS as u8,
        value_parser = clap::value_parser!(u8).range(1..),
        help = "Attempts to find a free short code",
        env = "MAX_ATTEMPTS"
    )]
    max_attempts: u8,

    #[arg(long, default_value_t = 100, help = "Cache size", env = "CACHE_SIZE")]
    cache_size: usize,

    #[arg(
        long,
        default_value_t = 15,
        help = "Request timeout",
        env = "REQUEST_TIMEOUT_SECS"
    )]
    request_timeout_secs: u64,

    #[arg(long, help = "Logging level of the Rust log", env = "RUST_LOG")]
    #[clap(default_value_t = String::from("info,tower_http=debug"))]
    rust_log_level: String,
}

fn setup_cors(relaxed: bool) -> CorsLayer {
    if relaxed {
        tracing::info!("cors setup: very_permissive");
        CorsLayer::very_permissive().allow_credentials(true)
    } else {
        tracing::info!("cors setup: default");
        CorsLayer::new()
    }
}

pub(crate) fn build_router(app: Arc<App>, cors: CorsLayer, request_timeout_secs: u64) -> Router {
    Router::new()
        .route("/", get(handle_home))
        .route("/health", get(handle_health))
        .route("/shorten", post(handle_shorten))
        .route("/{code}", get(handle_redirect))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_secs),
        ))
        .layer(cors)
        .with_state(app)
}

async fn setup_storage(args: &Arguments) -> anyhow::Result<Arc<dyn LinksDB>> {
    match (args.storage, &args.db_url) {
        (Storage::Memory, _) => {
            tracing::warn!("using in-memory storage, links are lost on restart");
            Ok(Arc::new(MemoryDb::new()))
        }
        (Storage::Postgres, None) => anyhow::bail!("DATABASE_URL is required for postgres storage"),
        (Storage::Postgres, Some(db_url)) => {
            if args.db_tls {
                rustls::crypto::aws_lc_rs::default_provider()
                    .install_default()
                    .map_err(|_| anyhow::anyhow!("Could not install rustls default crypto provider."))?;
            }

            run_migrations(db_url)?;

            let dbpool = DbPool::build(db_url, args.db_pool_size, args.db_tls).await?;

            Ok(Arc::new(PostgresDb::new(dbpool)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        return Err(e.into());
    }

    let args = Arguments::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(args.rust_log_level.clone()))
        .with(tracing_subscriber::fmt::layer().with_ansi(is_debug()))
        .init();

    let db = setup_storage(&args).await?;

    let app = App::new(
        args.base_url.clone(),
        usize::from(args.code_length),
        usize::from(args.max_attempts),
        db,
        args.cache_size,
    );

    let router = build_router(
        app,
        setup_cors(args.cors_relaxed),
        args.request_timeout_secs,
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    tracing::info!(base_url = args.base_url, "listening on http://{}", addr);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    signals::create_term_signal_handler(tx);

    let listener = TcpListener::bind(addr).await?;

    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    );

    let graceful = server.with_graceful_shutdown(async {
        rx.await.ok();
    });

    if let Err(e) = graceful.await {
        tracing::error!("server error: {}", e);
    }

    tracing::info!("server stopped");

    Ok(())
}
