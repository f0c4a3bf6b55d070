use airdrop_racer::{
    bot::{self, BotData},
    config::{catalog, database, settings::Settings},
    core::catalog as catalog_store,
    errors::{Error, Result},
    price_feed::{BinanceFeed, PriceFeed},
    scheduler::Scheduler,
};
use dotenvy::dotenv;
use std::{env, path::Path, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    let settings = Settings::from_env()?;
    info!(?settings, "Loaded settings");

    // 3. Database and schema
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 4. Seed the catalog if a config file is present
    if Path::new(&settings.catalog_path).exists() {
        let config = catalog::load_config(&settings.catalog_path)?;
        let (articles, tasks) = catalog_store::seed_catalog(&db, &config, chrono::Utc::now())
            .await
            .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
        info!(articles, tasks, "Catalog seeded");
    } else {
        warn!(path = %settings.catalog_path, "No catalog file found, skipping seeding");
    }

    // 5. Price feed and background jobs
    let feed: Arc<dyn PriceFeed> = Arc::new(BinanceFeed::new(
        &settings.price_feed_url,
        settings.price_feed_timeout,
    )?);
    let _jobs = Scheduler::spawn(db.clone(), Arc::clone(&feed), &settings);

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, BotData::new(db, feed)).await
}
