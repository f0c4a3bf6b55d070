//! Task plan Discord commands - catalog browsing, plan management, completions and
//! account linking.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, author_account, handlers::autocomplete},
        core::{catalog, link, plan as plans},
        entities::TaskModel,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    async fn lookup_task(
        ctx: poise::Context<'_, BotData, Error>,
        title: &str,
    ) -> Result<Option<TaskModel>> {
        let found = catalog::find_task_by_title(&ctx.data().database, title).await?;
        if found.is_none() {
            ctx.say(format!(
                "❌ Task '{title}' not found. Use `/articles` to see available tasks."
            ))
            .await?;
        }
        Ok(found)
    }

    /// Lists airdrop guides and their tasks.
    #[poise::command(slash_command, prefix_command)]
    pub async fn articles(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let all = catalog::list_articles(db).await?;

        if all.is_empty() {
            ctx.say("No airdrop guides yet.").await?;
            return Ok(());
        }

        let mut text = String::from("📚 **Airdrop guides**\n");
        for a in &all {
            let _ = writeln!(text, "\n**{}** - {}", a.title, a.description);
            if let Some(url) = &a.url {
                let _ = writeln!(text, "<{url}>");
            }
            for t in catalog::list_tasks_for_article(db, a.id).await? {
                let _ = writeln!(
                    text,
                    "• {} ({}, {} points)",
                    t.title,
                    t.frequency.label(),
                    t.frequency.points()
                );
            }
        }
        ctx.say(text).await?;
        Ok(())
    }

    /// Shows your task plan.
    #[poise::command(slash_command, prefix_command)]
    pub async fn plan(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let account = author_account(ctx).await?;
        let entries = plans::get_user_plan(&ctx.data().database, account.id).await?;

        if entries.is_empty() {
            ctx.say("Your plan is empty. Add tasks with `/plan_add`.").await?;
            return Ok(());
        }

        let mut text = String::from("🗒️ **Your plan**\n");
        for (entry, t) in &entries {
            let mark = if entry.completed { "✅" } else { "⬜" };
            let cost = entry
                .cost
                .map(|c| format!(" | cost ${c:.2}"))
                .unwrap_or_default();
            let _ = writeln!(text, "{mark} {} ({}){cost}", t.title, t.frequency.label());
        }
        ctx.say(text).await?;
        Ok(())
    }

    /// Adds a task to your plan.
    #[poise::command(slash_command, prefix_command)]
    pub async fn plan_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Task to add"]
        #[autocomplete = "autocomplete::autocomplete_task"]
        task: String,
    ) -> Result<()> {
        let account = author_account(ctx).await?;
        let Some(t) = lookup_task(ctx, &task).await? else {
            return Ok(());
        };

        plans::add_to_plan(&ctx.data().database, account.id, t.id, chrono::Utc::now()).await?;
        ctx.say(format!("✅ Added '{}' to your plan", t.title)).await?;
        Ok(())
    }

    /// Marks a planned task as completed and awards its points.
    #[poise::command(slash_command, prefix_command)]
    pub async fn complete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Task to complete"]
        #[autocomplete = "autocomplete::autocomplete_planned_task"]
        task: String,
        #[description = "What the task cost you (gas, fees)"] cost: Option<f64>,
    ) -> Result<()> {
        if cost.is_some_and(|c| !c.is_finite() || c < 0.0) {
            ctx.say("❌ Invalid cost: must be a non-negative number").await?;
            return Ok(());
        }

        let account = author_account(ctx).await?;
        let Some(t) = lookup_task(ctx, &task).await? else {
            return Ok(());
        };

        match plans::complete_task(&ctx.data().database, account.id, t.id, cost, chrono::Utc::now())
            .await
        {
            Ok(done) if done.points_awarded > 0 => {
                ctx.say(format!(
                    "✅ Completed '{}' (+{} points). Balance: {}",
                    t.title, done.points_awarded, done.total_points
                ))
                .await?;
            }
            Ok(_) => {
                ctx.say(format!("'{}' is already completed for this period", t.title))
                    .await?;
            }
            Err(Error::PlanEntryNotFound { .. }) => {
                ctx.say(format!(
                    "❌ '{}' is not in your plan. Add it with `/plan_add` first.",
                    t.title
                ))
                .await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Reverts a completion and takes its points back.
    #[poise::command(slash_command, prefix_command)]
    pub async fn uncomplete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Task to revert"]
        #[autocomplete = "autocomplete::autocomplete_planned_task"]
        task: String,
    ) -> Result<()> {
        let account = author_account(ctx).await?;
        let Some(t) = lookup_task(ctx, &task).await? else {
            return Ok(());
        };

        match plans::uncomplete_task(&ctx.data().database, account.id, t.id, chrono::Utc::now())
            .await
        {
            Ok(undone) => {
                ctx.say(format!(
                    "↩️ Reverted '{}' (-{} points). Balance: {}",
                    t.title, undone.points_removed, undone.total_points
                ))
                .await?;
            }
            Err(Error::PlanEntryNotFound { .. }) => {
                ctx.say(format!("❌ '{}' is not completed", t.title)).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Issues a link code, or redeems one to attach this chat account to another user.
    ///
    /// Redeeming moves this chat identity to the code's owner. The account that held it
    /// before is left without a chat login, so it must have no points or pending bets.
    #[poise::command(slash_command, prefix_command, ephemeral)]
    pub async fn link(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Code issued for the account to link"] code: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let now = chrono::Utc::now();

        let Some(code) = code else {
            let account = author_account(ctx).await?;
            let issued = link::issue_link_code(db, account.id, now).await?;
            ctx.say(format!(
                "🔗 Your link code is `{}`. It expires in {} minutes.",
                issued.code,
                link::LINK_CODE_TTL_MINUTES
            ))
            .await?;
            return Ok(());
        };

        match link::redeem_link_code(db, &code, &ctx.author().id.to_string(), now).await {
            Ok(linked) => {
                ctx.say(format!("✅ This chat account is now linked to {}", linked.username))
                    .await?;
            }
            Err(e @ Error::LinkCodeInvalid) => {
                ctx.say(format!("❌ {e}")).await?;
            }
            Err(e @ Error::ChatAccountInUse { .. }) => {
                ctx.say(format!(
                    "❌ {e}. Spend or settle it first, or keep using that account."
                ))
                .await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
