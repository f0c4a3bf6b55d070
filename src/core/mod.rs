/// Point betting on the upcoming race
pub mod bet;

/// Article and task catalog
pub mod catalog;

/// Race days (UTC) and reset boundaries (KST)
pub mod clock;

/// The fixed set of race coins
pub mod coin;

/// Point balance mutations and history rows
pub mod ledger;

/// Chat account linking codes
pub mod link;

/// Per-user task plans and the point awarder
pub mod plan;

/// Race rows, start prices and the race overview
pub mod race;

/// Daily and weekly completion resets
pub mod reset;

/// Winner selection and bet payouts
pub mod settlement;

/// Accounts, leaderboard and point history
pub mod user;
