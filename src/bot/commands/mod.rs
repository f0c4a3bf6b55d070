//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Catalog administration commands
pub mod admin;

/// General utility commands
pub mod general;

/// Task plan, catalog and account linking commands
pub mod plan;

/// Balance, history and leaderboard commands
pub mod points;

/// Coin race and betting commands
pub mod race;

// Export commands
pub use admin::*;
pub use general::*;
pub use plan::*;
pub use points::*;
pub use race::*;
