//! Bot layer - Discord interface for the tracker and the coin race
//!
//! This module provides the slash commands, autocomplete handlers and the bot context.
//! Commands stay thin: they resolve the caller's account and delegate to `core`.

/// Discord command implementations (race, points, plan, general)
pub mod commands;
/// Discord interaction handlers (autocomplete)
pub mod handlers;

use crate::{
    core::user,
    entities::UserModel,
    errors::{Error, Result},
    price_feed::PriceFeed,
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Live prices for the race overview
    pub price_feed: Arc<dyn PriceFeed>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub fn new(database: DatabaseConnection, price_feed: Arc<dyn PriceFeed>) -> Self {
        Self {
            database,
            price_feed,
        }
    }
}

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// The account behind the command author, created on first contact.
pub async fn author_account(ctx: Context<'_>) -> Result<UserModel> {
    let author = ctx.author();
    user::get_or_create_chat_user(
        &ctx.data().database,
        &author.id.to_string(),
        &author.name,
        chrono::Utc::now(),
    )
    .await
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("❌ {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Connects to Discord and serves commands until the client stops.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::race(),
                commands::bet(),
                commands::mybets(),
                commands::points(),
                commands::history(),
                commands::leaderboard(),
                commands::articles(),
                commands::plan(),
                commands::plan_add(),
                commands::complete(),
                commands::uncomplete(),
                commands::link(),
                commands::article_delete(),
                commands::task_delete(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered globally");
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;
