//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod article;
pub mod bet;
pub mod link_code;
pub mod point_history;
pub mod race;
pub mod race_coin;
pub mod system_state;
pub mod task;
pub mod user;
pub mod user_plan;

// Re-export specific types to avoid conflicts
pub use article::{Column as ArticleColumn, Entity as Article, Model as ArticleModel};
pub use bet::{BetStatus, Column as BetColumn, Entity as Bet, Model as BetModel};
pub use link_code::{Column as LinkCodeColumn, Entity as LinkCode, Model as LinkCodeModel};
pub use point_history::{
    Column as PointHistoryColumn, Entity as PointHistory, Model as PointHistoryModel,
};
pub use race::{Column as RaceColumn, Entity as Race, Model as RaceModel};
pub use race_coin::{Column as RaceCoinColumn, Entity as RaceCoin, Model as RaceCoinModel};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
pub use task::{Column as TaskColumn, Entity as Task, Model as TaskModel, TaskFrequency};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use user_plan::{Column as UserPlanColumn, Entity as UserPlan, Model as UserPlanModel};
