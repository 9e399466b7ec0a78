use todo_api::{
    application::todo_service::TodoServiceImpl,
    config::Config,
    domain::repository::TodoRepository,
    http::routing::{self, todos},
    infrastructure::sqlite_repo::SqliteTodoRepository,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()))
        .init();

    let config = Config::from_env()?;
    let repo = SqliteTodoRepository::connect(&config.database_url).await?;
    if config.reset_schema {
        tracing::warn!(database_url = %config.database_url, "TODO_RESET_SCHEMA set, dropping existing todos");
        repo.reset().await?;
        tracing::info!("database tables recreated");
    } else {
        repo.init().await?;
        tracing::info!(database_url = %config.database_url, "database schema ready");
    }

    let service = TodoServiceImpl::new(repo.clone());
    let todos_router = todos::router(todos::AppState { service });
    let router = routing::app(todos_router);

    tracing::info!(addr = %config.addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(config.addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    repo.close().await;
    tracing::info!("store closed");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
