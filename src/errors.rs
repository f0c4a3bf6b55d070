//! Unified error type for the tracker, the race game and the chat front-end.

use thiserror::Error;

/// Every failure the crate can surface.
///
/// Domain variants (stake, coin, balance, duplicate bet, ...) are validation errors
/// produced before anything is written. The wrapped variants come from the database,
/// the price feed client and the chat framework.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// No user with this id / chat identity
    #[error("User not found: {user_id}")]
    UserNotFound {
        /// Lookup key that failed
        user_id: String,
    },

    /// No task with this id
    #[error("Task not found: {task_id}")]
    TaskNotFound {
        /// Lookup key that failed
        task_id: String,
    },

    /// No article with this id
    #[error("Article not found: {article_id}")]
    ArticleNotFound {
        /// Lookup key that failed
        article_id: i64,
    },

    /// The task is not in the user's plan, or is not in the state the operation needs
    #[error("Plan entry not found for user {user_id} and task {task_id}")]
    PlanEntryNotFound {
        /// User id
        user_id: i64,
        /// Task id
        task_id: i64,
    },

    /// Stake outside `1..=MAX_STAKE`
    #[error("Invalid stake {stake}: must be between 1 and {max}")]
    InvalidStake {
        /// Requested stake
        stake: i64,
        /// Maximum allowed stake
        max: i64,
    },

    /// Coin id is not one of the race coins
    #[error("Invalid coin: {coin_id}")]
    InvalidCoin {
        /// Requested coin id
        coin_id: String,
    },

    /// Point amount that makes no sense for a ledger operation
    #[error("Invalid point amount: {amount}")]
    InvalidAmount {
        /// Requested amount
        amount: i64,
    },

    /// Balance too low for a conditional debit
    #[error("Insufficient points: have {current}, need {required}")]
    InsufficientPoints {
        /// Balance at the time of the check
        current: i64,
        /// Points required
        required: i64,
    },

    /// The user already holds a bet for this race
    #[error("A bet for race {race_date} already exists")]
    DuplicateBet {
        /// Race date (`YYYY-MM-DD`)
        race_date: String,
    },

    /// Link code unknown or expired
    #[error("Link code is invalid or expired")]
    LinkCodeInvalid,

    /// The chat identity belongs to another account that still holds points or bets
    #[error(
        "This chat account belongs to {username}, which still has {points} points or a \
         pending bet"
    )]
    ChatAccountInUse {
        /// Account currently holding the chat identity
        username: String,
        /// Its current balance
        points: i64,
    },

    /// Upstream price feed failure
    #[error("Price feed error: {message}")]
    PriceFeed {
        /// What went wrong
        message: String,
    },

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Integer conversion error
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
