use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::params::RowParams;

/// Where the ranking table is being rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingType {
    #[default]
    Page,
    Widget,
    Shortcode,
}

impl FromStr for RankingType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "page" => Ok(Self::Page),
            "widget" => Ok(Self::Widget),
            "shortcode" => Ok(Self::Shortcode),
            other => bail!("unknown ranking type {other:?} (expected page, widget or shortcode)"),
        }
    }
}

/// Everything the host knows about the table being rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingContext {
    /// Participant viewing the table, highlighted in the output.
    pub viewing_user: Option<i64>,
    pub ranking_id: i64,
    /// Cross-league view with an extra league column.
    pub all_user_view: bool,
    pub ranking_type: RankingType,
}

/// One participant row as produced by the host's ranking computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRow {
    pub user_id: i64,
    pub user_name: String,
    pub points: i64,
    #[serde(default)]
    pub num_predictions: i64,
    /// Explicit rank (ties); position in the list when absent.
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub league_image: Option<String>,
    #[serde(default)]
    pub user_link: Option<String>,
    #[serde(default)]
    pub user_avatar: Option<String>,
}

/// Strategy the ranking renderer consults at its four extension points.
/// Every hook defaults to passing its input through unchanged.
#[async_trait]
pub trait RankingExtension: Send + Sync {
    fn extend_header_start(&self, markup: String, _ctx: &RankingContext) -> String {
        markup
    }

    fn extend_header_end(&self, markup: String, _ctx: &RankingContext) -> String {
        markup
    }

    fn extend_row_template(
        &self,
        template: String,
        _all_user_view: bool,
        _ranking_type: RankingType,
    ) -> String {
        template
    }

    async fn extend_row_params(
        &self,
        params: RowParams,
        _ctx: &RankingContext,
        _row: &RankingRow,
    ) -> Result<RowParams> {
        Ok(params)
    }
}

/// Label translation, owned by the host.
pub trait Translate: Send + Sync {
    fn translate(&self, text: &str) -> String;
}

/// Returns labels unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslation;

impl Translate for NoTranslation {
    fn translate(&self, text: &str) -> String {
        text.to_string()
    }
}
