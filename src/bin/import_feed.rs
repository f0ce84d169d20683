//! Operator-initiated feed import: load a local YAML price feed and replace
//! the shop's listings, the same transformation `POST /partner/update`
//! applies to a remote feed.
//!
//! Usage: `import-feed <path-to-feed.yaml>`

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::sync::mpsc;

use bazaar_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path: PathBuf = std::env::args()
        .nth(1)
        .context("usage: import-feed <path-to-feed.yaml>")?
        .into();

    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(&cfg.log_level);

    let db_pool = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to database")?;
    api::db::run_migrations(&db_pool)
        .await
        .context("failed to run migrations")?;
    let db = Arc::new(db_pool);

    // The importer publishes post-commit events; drain them so the channel
    // never blocks.
    let (event_tx, event_rx) = mpsc::channel(64);
    let event_sender = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(
        event_rx,
        Arc::new(api::events::LogNotifier),
    ));

    let importer = api::services::FeedImportService::new(
        db,
        Arc::new(event_sender),
        Duration::from_secs(cfg.feed_fetch_timeout_secs),
    )
    .context("failed to build importer")?;

    let summary = importer
        .import_from_file(&path)
        .await
        .with_context(|| format!("import failed for {}", path.display()))?;

    println!(
        "imported {} listings into shop {}",
        summary.listings, summary.shop_id
    );
    Ok(())
}
