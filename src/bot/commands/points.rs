//! Point Discord commands - `points`, `history` and `leaderboard`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, author_account},
        core::user,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    const HISTORY_LIMIT: u64 = 15;
    const LEADERBOARD_LIMIT: u64 = 10;

    /// Shows your point balance.
    #[poise::command(slash_command, prefix_command)]
    pub async fn points(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let account = author_account(ctx).await?;
        ctx.say(format!(
            "💰 **{}** has {} points",
            account.username, account.total_points
        ))
        .await?;
        Ok(())
    }

    /// Shows your most recent point changes.
    #[poise::command(slash_command, prefix_command)]
    pub async fn history(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let account = author_account(ctx).await?;
        let rows = user::get_point_history(&ctx.data().database, account.id, HISTORY_LIMIT).await?;

        if rows.is_empty() {
            ctx.say("No point history yet.").await?;
            return Ok(());
        }

        let mut text = String::from("📜 **Point history**\n");
        for row in &rows {
            let _ = writeln!(
                text,
                "• {} | {:+} | {}",
                row.created_at.format("%Y-%m-%d %H:%M"),
                row.points,
                row.reason
            );
        }
        ctx.say(text).await?;
        Ok(())
    }

    /// Shows the players with the most points.
    #[poise::command(slash_command, prefix_command)]
    pub async fn leaderboard(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let top = user::leaderboard(&ctx.data().database, LEADERBOARD_LIMIT).await?;

        let mut text = String::from("🏆 **Leaderboard**\n");
        for (rank, player) in top.iter().enumerate() {
            let _ = writeln!(
                text,
                "{}. {} - {} points",
                rank + 1,
                player.username,
                player.total_points
            );
        }
        ctx.say(text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
