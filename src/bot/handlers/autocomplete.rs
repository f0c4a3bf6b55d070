//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions are best effort: a database error yields an empty list.

use crate::{
    bot::BotData,
    core::{catalog, coin::COINS, plan},
    errors::Error,
};

/// Discord accepts at most 25 suggestions.
const MAX_SUGGESTIONS: usize = 25;

/// Race coin ids whose id, symbol or name contains `partial` (case-insensitive).
#[must_use]
pub fn matching_coin_ids(partial: &str) -> Vec<String> {
    let partial_lower = partial.trim().to_lowercase();

    COINS
        .iter()
        .filter(|coin| {
            coin.id.contains(&partial_lower)
                || coin.symbol.to_lowercase().contains(&partial_lower)
                || coin.name.to_lowercase().contains(&partial_lower)
        })
        .map(|coin| coin.id.to_string())
        .collect()
}

/// Suggests race coin ids matching the id, symbol or name typed so far.
pub async fn autocomplete_coin(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    matching_coin_ids(partial)
}

/// Suggests active task titles from the catalog.
pub async fn autocomplete_task(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(tasks) = catalog::list_all_tasks(&ctx.data().database).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    tasks
        .into_iter()
        .filter(|t| t.title.to_lowercase().contains(&partial_lower))
        .map(|t| t.title)
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Suggests active article titles from the catalog.
pub async fn autocomplete_article(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(articles) = catalog::list_articles(&ctx.data().database).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    articles
        .into_iter()
        .filter(|a| a.title.to_lowercase().contains(&partial_lower))
        .map(|a| a.title)
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Suggests titles of tasks already in the author's plan.
pub async fn autocomplete_planned_task(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let chat_id = ctx.author().id.to_string();

    let Ok(Some(account)) = crate::core::user::get_user_by_chat_id(db, &chat_id).await else {
        return Vec::new();
    };
    let Ok(entries) = plan::get_user_plan(db, account.id).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = entries
        .into_iter()
        .map(|(_, t)| t.title)
        .filter(|title| title.to_lowercase().contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .collect();

    matching.sort();
    matching
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_coin_ids() {
        assert_eq!(matching_coin_ids(""), vec!["btc", "eth", "sol", "xrp"]);
        assert_eq!(matching_coin_ids("ETH"), vec!["eth"]);
        assert_eq!(matching_coin_ids("bitc"), vec!["btc"]);
        assert!(matching_coin_ids("doge").is_empty());
    }
}
