pub mod breakdown;
pub mod database_ops;
pub mod ranking;
pub mod tracing;

pub mod util {
    pub mod env;
}

pub use breakdown::{Breakdown, BreakdownEntry, BreakdownService, MemoryCache};
pub use database_ops::db::Db;
pub use database_ops::score_history::{ScoreHistory, ScoreTable};
pub use ranking::{RankingContext, RankingExtension, RankingTable, ScoreBreakdownExtension};
