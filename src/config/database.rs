//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The composite uniqueness rules the
//! point economy depends on (one bet per user per race, one plan entry per user and task,
//! one price row per race and coin) are added as unique indexes on top.

use crate::entities::{
    Article, Bet, LinkCode, PointHistory, Race, RaceCoin, SystemState, Task, User, UserPlan, bet,
    race_coin, user_plan,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://airdrop_racer.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(&get_database_url())
        .await
        .map_err(Into::into)
}

/// Creates all tables (if missing) from the entity definitions, then the unique indexes.
///
/// Parents are created before children so the generated foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, User).await?;
    create_table(db, Article).await?;
    create_table(db, Task).await?;
    create_table(db, UserPlan).await?;
    create_table(db, PointHistory).await?;
    create_table(db, Bet).await?;
    create_table(db, Race).await?;
    create_table(db, RaceCoin).await?;
    create_table(db, SystemState).await?;
    create_table(db, LinkCode).await?;

    let builder = db.get_database_backend();
    for index in unique_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_bets_user_race")
            .table(Bet)
            .col(bet::Column::UserId)
            .col(bet::Column::RaceDate)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_user_plans_user_task")
            .table(UserPlan)
            .col(user_plan::Column::UserId)
            .col(user_plan::Column::TaskId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_race_coins_race_coin")
            .table(RaceCoin)
            .col(race_coin::Column::RaceDate)
            .col(race_coin::Column::CoinId)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BetModel, RaceModel, SystemStateModel, UserModel, UserPlanModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<UserPlanModel> = UserPlan::find().limit(1).all(&db).await?;
        let _: Vec<BetModel> = Bet::find().limit(1).all(&db).await?;
        let _: Vec<RaceModel> = Race::find().limit(1).all(&db).await?;
        let _: Vec<SystemStateModel> = SystemState::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
