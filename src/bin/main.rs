use std::sync::Arc;

use clap::Parser;
use eyre::WrapErr;
use listenfd::ListenFd;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use raw_http_server::api::routes;
use raw_http_server::application::repositories::{InMemoryUserRepository, UserRepository};
use raw_http_server::config::ServerConfig;
use raw_http_server::infrastructure::server_impl::connection::serve;
use raw_http_server::infrastructure::server_impl::router::Router;
use raw_http_server::infrastructure::PostgresUserRepository;
use raw_http_server::AnyResult;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::parse();

    match config.db_url.as_deref() {
        Some(url) => {
            let users = PostgresUserRepository::connect(url, config.db_pool_size).await?;
            let status = users.health().await?;
            tracing::info!(size = status.size, max_size = status.max_size, "database ready");
            run(config, users).await
        }
        None => {
            tracing::warn!("DB_URL not set, users are kept in memory");
            run(config, InMemoryUserRepository::new()).await
        }
    }
}

async fn run<R: UserRepository>(config: ServerConfig, users: R) -> AnyResult<()> {
    // routes are frozen before the first connection is accepted
    let router = Router::new(routes(Arc::new(users)));
    tracing::info!("Handlers registered");

    let listener = listener(&config).await?;
    serve(listener, router, config.connection_settings()).await
}

/// Reuses a socket handed over by a supervisor when there is one.
async fn listener(config: &ServerConfig) -> AnyResult<TcpListener> {
    let mut listenfd = ListenFd::from_env();
    if let Some(std_listener) = listenfd.take_tcp_listener(0)? {
        std_listener.set_nonblocking(true)?;
        return Ok(TcpListener::from_std(std_listener)?);
    }

    let addr = config.socket_addr();
    TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to port {}", config.port))
}
