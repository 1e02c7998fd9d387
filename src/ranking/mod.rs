//! Ranking-table rendering with pluggable extension points.

pub mod extension;
pub mod options;
pub mod params;
pub mod score_breakdown;
pub mod table;
pub mod template;

pub use extension::{
    NoTranslation, RankingContext, RankingExtension, RankingRow, RankingType, Translate,
};
pub use options::{EnvOptions, HostOptions, MapOptions, PointsConfig};
pub use params::RowParams;
pub use score_breakdown::{activate, admin_notice, ScoreBreakdownExtension};
pub use table::RankingTable;
