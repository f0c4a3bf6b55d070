//! Coin race Discord commands - `race`, `bet` and `mybets`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, author_account, handlers::autocomplete},
        core::{
            bet as betting,
            clock::{self, RaceState},
            coin,
            race::{self as races, RaceSummary},
        },
        entities::BetStatus,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    const MY_BETS_LIMIT: u64 = 10;

    fn state_label(state: RaceState) -> &'static str {
        match state {
            RaceState::Upcoming => "Upcoming (betting open)",
            RaceState::Racing => "Racing",
            RaceState::Completed => "Completed",
        }
    }

    fn format_summary(summary: &RaceSummary) -> String {
        let mut out = format!(
            "**{}** - {}\n",
            clock::format_race_date(summary.race_date),
            state_label(summary.state)
        );

        for line in &summary.coins {
            let change = line
                .percent_change
                .map_or_else(|| "-".to_string(), |p| format!("{p:+.2}%"));
            let price = line
                .last_price
                .or(line.start_price)
                .map_or_else(|| "-".to_string(), |p| format!("${p:.4}"));
            let crown = if summary.winner.is_some_and(|w| w.id == line.coin.id) {
                " 🏆"
            } else {
                ""
            };
            let _ = writeln!(out, "• {} {} | {}{}", line.coin.symbol, price, change, crown);
        }

        if let Some(my_bet) = &summary.my_bet {
            let symbol = coin::find_coin(&my_bet.coin_id).map_or("?", |c| c.symbol);
            let _ = writeln!(
                out,
                "Your bet: {} points on {} ({:?})",
                my_bet.stake, symbol, my_bet.status
            );
        }
        out
    }

    /// Shows the upcoming, live and last completed race.
    #[poise::command(slash_command, prefix_command)]
    pub async fn race(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let account = author_account(ctx).await?;
        let live = ctx.data().price_feed.today_quotes().await;
        let overview =
            races::race_overview(&ctx.data().database, Some(account.id), &live, chrono::Utc::now())
                .await?;

        let text = format!(
            "🏁 **Daily Coin Race**\n\n{}\n{}\n{}",
            format_summary(&overview.upcoming),
            format_summary(&overview.racing),
            format_summary(&overview.completed)
        );
        ctx.say(text).await?;
        Ok(())
    }

    /// Bets points on a coin for tomorrow's race.
    #[poise::command(slash_command, prefix_command)]
    pub async fn bet(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Coin to bet on"]
        #[autocomplete = "autocomplete::autocomplete_coin"]
        coin_id: String,
        #[description = "Points to stake"] stake: i64,
    ) -> Result<()> {
        let account = author_account(ctx).await?;
        let now = chrono::Utc::now();

        match betting::place_bet(&ctx.data().database, account.id, &coin_id, stake, now).await {
            Ok(placed) => {
                ctx.say(format!(
                    "✅ Bet {} points on {} for the {} race. Potential payout: {} points. Balance: {}",
                    placed.bet.stake,
                    placed.coin_symbol,
                    placed.bet.race_date,
                    placed.potential_payout,
                    placed.remaining_points
                ))
                .await?;
            }
            Err(
                e @ (Error::InvalidStake { .. }
                | Error::InvalidCoin { .. }
                | Error::InsufficientPoints { .. }
                | Error::DuplicateBet { .. }),
            ) => {
                ctx.say(format!("❌ {e}")).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Lists your most recent bets.
    #[poise::command(slash_command, prefix_command)]
    pub async fn mybets(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let account = author_account(ctx).await?;
        let bets = betting::get_bets_for_user(&ctx.data().database, account.id, MY_BETS_LIMIT).await?;

        if bets.is_empty() {
            ctx.say("You have not placed any bets yet. Use `/bet` to join tomorrow's race.")
                .await?;
            return Ok(());
        }

        let mut text = String::from("🎲 **Your bets**\n");
        for b in &bets {
            let symbol = coin::find_coin(&b.coin_id).map_or("?", |c| c.symbol);
            let outcome = match b.status {
                BetStatus::Pending => "pending".to_string(),
                BetStatus::Won => format!("won {}", b.payout),
                BetStatus::Lost => "lost".to_string(),
            };
            let _ = writeln!(text, "• {} | {} | {} points | {}", b.race_date, symbol, b.stake, outcome);
        }
        ctx.say(text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
