use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rollbook::auth::sessions;
use rollbook::config::{Cli, Config};
use rollbook::directory::seed;
use rollbook::state::AppState;
use rollbook::{db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    if config.uses_default_password() {
        tracing::warn!("Using the default admin password; set ADMIN_PASSWORD");
    }

    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    let state = AppState::new(pool, config.clone());

    if let Some(ref path) = cli.seed {
        seed::import_file(state.directory.as_ref(), path).await?;
    } else if cli.reindex {
        seed::reindex(state.directory.as_ref()).await?;
    }

    let _sweeper = sessions::spawn_sweeper(state.sessions.clone(), config.auth.sweep_interval());

    let app = routes::app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
