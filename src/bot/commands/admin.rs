//! Catalog administration commands - soft deleting guides and tasks.
//!
//! Restricted to server administrators. Deleted rows stay in the database so plans and
//! point history keep their references.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::catalog,
        errors::{Error, Result},
    };
    use tracing::info;

    /// Removes an airdrop guide and all of its tasks from the catalog.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        default_member_permissions = "ADMINISTRATOR"
    )]
    pub async fn article_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Guide to remove"]
        #[autocomplete = "autocomplete::autocomplete_article"]
        article: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(found) = catalog::find_article_by_title(db, &article).await? else {
            ctx.say(format!("❌ Guide '{article}' not found or already deleted."))
                .await?;
            return Ok(());
        };

        catalog::soft_delete_article(db, found.id).await?;
        info!(
            article_id = found.id,
            by = %ctx.author().id,
            "Article soft-deleted"
        );
        ctx.say(format!("🗑️ Guide '{}' and its tasks were removed.", found.title))
            .await?;
        Ok(())
    }

    /// Removes a single task from the catalog.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        default_member_permissions = "ADMINISTRATOR"
    )]
    pub async fn task_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Task to remove"]
        #[autocomplete = "autocomplete::autocomplete_task"]
        task: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(found) = catalog::find_task_by_title(db, &task).await? else {
            ctx.say(format!("❌ Task '{task}' not found or already deleted."))
                .await?;
            return Ok(());
        };

        catalog::soft_delete_task(db, found.id).await?;
        info!(task_id = found.id, by = %ctx.author().id, "Task soft-deleted");
        ctx.say(format!("🗑️ Task '{}' was removed.", found.title)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
