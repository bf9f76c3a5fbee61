use contactbook_core::db::open_db;
use contactbook_core::{init_logging, ContactCache};
use contactbook_server::{app, AppState, ServerConfig};
use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    let log_dir = config.log_dir.display().to_string();
    init_logging(&config.log_level, &log_dir)?;

    let conn = open_db(&config.db_path)?;
    let state = AppState::new(
        conn,
        ContactCache::new(config.cache_capacity),
        config.page_size,
    );

    info!(
        "event=server_start module=server status=ok bind={} db_path={} page_size={} cache_capacity={}",
        config.bind,
        config.db_path.display(),
        config.page_size,
        config.cache_capacity
    );
    println!("contactbook_server listening on http://{}", config.bind);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
