//! General Discord commands - ping and help.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::bet::{MAX_STAKE, PAYOUT_MULTIPLIER},
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = format!(
            "**Airdrop Racer Help**\n\n\
            **Coin Race**\n\
            • `/race` - Shows the upcoming, live and last completed race.\n\
            • `/bet <coin> <stake>` - Bets up to {MAX_STAKE} points on tomorrow's race. \
            A winning bet pays {PAYOUT_MULTIPLIER}x the stake.\n\
            • `/mybets` - Lists your recent bets.\n\n\
            **Points**\n\
            • `/points` - Shows your balance.\n\
            • `/history` - Shows your recent point changes.\n\
            • `/leaderboard` - Shows the top players.\n\n\
            **Airdrop Tasks**\n\
            • `/articles` - Lists airdrop guides and their tasks.\n\
            • `/plan` - Shows your task plan.\n\
            • `/plan_add <task>` - Adds a task to your plan.\n\
            • `/complete <task> [cost]` - Completes a task (daily 100, weekly 500, one-time 1000 points).\n\
            • `/uncomplete <task>` - Reverts a completion.\n\n\
            **Account**\n\
            • `/link` - Issues a code; `/link <code>` moves this chat account to that user. \
            Only allowed while the account you are leaving has no points or pending bets.\n\
            • `/ping` - Checks if the bot is responsive.\n\n\
            **Admin**\n\
            • `/article_delete <guide>` - Removes a guide and its tasks.\n\
            • `/task_delete <task>` - Removes a task.\n\n\
            Daily tasks reset at midnight KST, weekly tasks on Sunday midnight KST."
        );

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
