use habit_ledger::{
    config::{database, settings},
    core::progress,
    errors::Result,
};
use dotenvy::dotenv;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Load .env file so RUST_LOG and DATABASE_URL can come from it
    dotenv().ok();

    // 2. Load configuration (defaults when no config.toml exists)
    let app_config = settings::load_default_config()?;

    // 3. Initialize tracing; RUST_LOG wins over the configured filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.log_filter)),
        )
        .init();
    info!(
        "Configuration loaded (streak policy: {:?})",
        app_config.streak_policy
    );

    // 4. Open the database and make sure the schema exists
    let database_url = database::get_database_url(app_config.database_url.as_deref());
    ensure_sqlite_dir(&database_url)?;

    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Leaderboard snapshot
    let board = progress::leaderboard(&db, app_config.leaderboard_size).await?;
    if board.is_empty() {
        info!("No XP recorded yet");
    }
    for entry in board {
        info!(
            "#{} {} - level {} ({} XP)",
            entry.rank, entry.owner_id, entry.level, entry.total_xp
        );
    }

    Ok(())
}

/// Creates the parent directory of a file-backed `SQLite` URL.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
