//! Ranking extension that adds full/toto/goal-bonus/goal-diff columns.
//!
//! Header and row templates share the `breakdown_*` placeholder names set by
//! [`ScoreBreakdownExtension::extend_row_params`]. The question keys are filled
//! too, so a host template can show them without further changes.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{trace, warn};

use super::extension::{
    NoTranslation, RankingContext, RankingExtension, RankingRow, RankingType, Translate,
};
use super::options::{HostOptions, PointsConfig};
use super::params::RowParams;
use crate::breakdown::BreakdownService;

pub const HOST_MISSING_NOTICE: &str = "The Football Pool plugin is not activated. Make sure you activate it so the Football Pool extension plugin has some use.";

pub const BREAKDOWN_KEYS: [&str; 10] = [
    "breakdown_full",
    "breakdown_full_points",
    "breakdown_toto",
    "breakdown_toto_points",
    "breakdown_goalbonus",
    "breakdown_goalbonus_points",
    "breakdown_goaldiff",
    "breakdown_goaldiff_points",
    "breakdown_question",
    "breakdown_question_points",
];

const TEMPLATE_END: &str = "</tbody></table>";

const ROW_TEMPLATE: &str = r#"<tr class="%css_class%">
<td style="width:3em; text-align: right;">%rank%.</td>
<td><a href="%user_link%">%user_avatar%%user_name%</a></td>
<td class="num-predictions">%num_predictions%</td>
<td class="score-breakdown full">%breakdown_full_points%</td>
<td class="score-breakdown toto">%breakdown_toto_points%</td>
<td class="score-breakdown goalbonus">%breakdown_goalbonus_points%</td>
<td class="score-breakdown goaldiff">%breakdown_goaldiff_points%</td>
<td class="ranking score">%points%</td>
</tr>"#;

const ROW_TEMPLATE_ALL_USERS: &str = r#"<tr class="%css_class%">
<td style="width:3em; text-align: right;">%rank%.</td>
<td><a href="%user_link%">%user_avatar%%user_name%</a></td>
<td class="num-predictions">%num_predictions%</td>
<td class="score-breakdown full">%breakdown_full_points%</td>
<td class="score-breakdown toto">%breakdown_toto_points%</td>
<td class="score-breakdown goalbonus">%breakdown_goalbonus_points%</td>
<td class="score-breakdown goaldiff">%breakdown_goaldiff_points%</td>
<td class="ranking score">%points%</td>
<td>%league_image%</td>
</tr>"#;

pub struct ScoreBreakdownExtension {
    service: BreakdownService,
    options: Arc<dyn HostOptions>,
    translator: Arc<dyn Translate>,
}

impl ScoreBreakdownExtension {
    pub fn new(service: BreakdownService, options: Arc<dyn HostOptions>) -> Self {
        Self {
            service,
            options,
            translator: Arc::new(NoTranslation),
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translate>) -> Self {
        self.translator = translator;
        self
    }

    fn label(&self, text: &str) -> String {
        self.translator.translate(text)
    }
}

/// Build the extension when the host's score store is available. Without it
/// the host renders its default table and a single warning is logged.
pub fn activate(
    service: Option<BreakdownService>,
    options: Arc<dyn HostOptions>,
) -> Option<ScoreBreakdownExtension> {
    match service {
        Some(service) => Some(ScoreBreakdownExtension::new(service, options)),
        None => {
            warn!("{HOST_MISSING_NOTICE}");
            None
        }
    }
}

/// Admin notice markup for a missing host.
pub fn admin_notice() -> String {
    format!(r#"<div class="error"><p>{HOST_MISSING_NOTICE}</p></div>"#)
}

#[async_trait]
impl RankingExtension for ScoreBreakdownExtension {
    fn extend_header_start(&self, mut markup: String, ctx: &RankingContext) -> String {
        markup.push_str(&format!(
            r#"<thead>
<tr>
<th></th>
<th class="user">{}</th>
<th class="num-predictions">{}</th>
<th class="score-breakdown full">{}</th>
<th class="score-breakdown toto">{}</th>
<th class="score-breakdown goalbonus">{}</th>
<th class="score-breakdown goaldiff">{}</th>
<th class="score">{}</th>
{}</tr>
</thead>
<tbody>"#,
            self.label("user"),
            self.label("predictions"),
            self.label("full"),
            self.label("toto"),
            self.label("goal bonus"),
            self.label("goal diff"),
            self.label("points"),
            if ctx.all_user_view { "<th></th>" } else { "" },
        ));
        markup
    }

    fn extend_header_end(&self, _markup: String, _ctx: &RankingContext) -> String {
        TEMPLATE_END.to_string()
    }

    fn extend_row_template(
        &self,
        _template: String,
        all_user_view: bool,
        _ranking_type: RankingType,
    ) -> String {
        if all_user_view {
            ROW_TEMPLATE_ALL_USERS.to_string()
        } else {
            ROW_TEMPLATE.to_string()
        }
    }

    async fn extend_row_params(
        &self,
        mut params: RowParams,
        ctx: &RankingContext,
        row: &RankingRow,
    ) -> Result<RowParams> {
        let user_id = params.get_i64("user_id").unwrap_or(row.user_id);
        let breakdown = self.service.get_breakdown(ctx.ranking_id).await?;

        for key in BREAKDOWN_KEYS {
            params.set(key, 0);
        }

        let Some(entry) = breakdown.get(user_id) else {
            trace!(user_id, ranking_id = ctx.ranking_id, "no breakdown for participant");
            return Ok(params);
        };

        if let Some(counts) = entry.matches {
            let points = PointsConfig::load(self.options.as_ref());
            params.set("breakdown_full", counts.full);
            params.set(
                "breakdown_full_points",
                scaled(PointsConfig::FULL_OPTION, points.full, counts.full)?,
            );
            params.set("breakdown_toto", counts.toto);
            params.set(
                "breakdown_toto_points",
                scaled(PointsConfig::TOTO_OPTION, points.toto, counts.toto)?,
            );
            params.set("breakdown_goalbonus", counts.goal_bonus);
            params.set(
                "breakdown_goalbonus_points",
                scaled(PointsConfig::GOAL_OPTION, points.goal_bonus, counts.goal_bonus)?,
            );
            params.set("breakdown_goaldiff", counts.goal_diff);
            params.set(
                "breakdown_goaldiff_points",
                scaled(PointsConfig::DIFF_OPTION, points.goal_diff, counts.goal_diff)?,
            );
        }

        if let Some(tally) = entry.questions {
            params.set("breakdown_question", tally.correct);
            params.set("breakdown_question_points", tally.points);
        }

        Ok(params)
    }
}

fn scaled(option: &str, per_unit: i64, count: i64) -> Result<i64> {
    per_unit
        .checked_mul(count)
        .ok_or_else(|| anyhow!("{option} = {per_unit} overflows for a count of {count}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakdown::MemoryCache;
    use crate::database_ops::db::Db;
    use crate::database_ops::score_history::{ScoreRecord, ScoreTable};
    use crate::ranking::options::MapOptions;
    use crate::ranking::template::placeholders;

    async fn extension(records: &[ScoreRecord], options: MapOptions) -> ScoreBreakdownExtension {
        let db = Db::connect_sqlite_memory().await.unwrap();
        let table = ScoreTable::new(db, "pool_scorehistory").unwrap();
        table.create_if_missing().await.unwrap();
        table.insert_records(records).await.unwrap();
        let service = BreakdownService::new(Arc::new(table), Arc::new(MemoryCache::new()));
        ScoreBreakdownExtension::new(service, Arc::new(options))
    }

    fn ctx(ranking_id: i64, all_user_view: bool) -> RankingContext {
        RankingContext {
            ranking_id,
            all_user_view,
            ..Default::default()
        }
    }

    fn row(user_id: i64) -> RankingRow {
        RankingRow {
            user_id,
            user_name: format!("user{user_id}"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn scales_match_counts_by_configured_points() {
        let ext = extension(
            &[
                ScoreRecord::for_match(1, 1, 1, 1, 0, 1),
                ScoreRecord::for_match(1, 1, 1, 3, 1, 2),
            ],
            MapOptions::new()
                .with("fullpoints", 5)
                .with("totopoints", 3)
                .with("goalpoints", 1)
                .with("diffpoints", 1),
        )
        .await;

        let params = RowParams::new().with("user_id", 1);
        let out = ext.extend_row_params(params, &ctx(1, false), &row(1)).await.unwrap();

        assert_eq!(out.get_i64("breakdown_full"), Some(2));
        assert_eq!(out.get_i64("breakdown_full_points"), Some(10));
        assert_eq!(out.get_i64("breakdown_toto"), Some(4));
        assert_eq!(out.get_i64("breakdown_toto_points"), Some(12));
        assert_eq!(out.get_i64("breakdown_goalbonus_points"), Some(1));
        assert_eq!(out.get_i64("breakdown_goaldiff"), Some(3));
        assert_eq!(out.get_i64("breakdown_goaldiff_points"), Some(3));
        assert_eq!(out.get_i64("breakdown_question"), Some(0));
    }

    #[tokio::test]
    async fn oversized_multiplier_is_an_error_not_a_panic() {
        let ext = extension(
            &[ScoreRecord::for_match(1, 1, 3, 0, 0, 0)],
            MapOptions::new().with("fullpoints", i64::MAX / 2),
        )
        .await;

        let err = ext
            .extend_row_params(RowParams::new().with("user_id", 1), &ctx(1, false), &row(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("fullpoints"), "{err}");
    }

    #[tokio::test]
    async fn question_values_pass_through_unscaled() {
        let ext = extension(
            &[
                ScoreRecord::for_question(2, 1, 3),
                ScoreRecord::for_question(2, 1, 0),
                ScoreRecord::for_question(2, 1, -1),
                ScoreRecord::for_question(2, 1, 5),
            ],
            MapOptions::new().with("fullpoints", 100),
        )
        .await;

        let out = ext
            .extend_row_params(RowParams::new().with("user_id", 2), &ctx(1, false), &row(2))
            .await
            .unwrap();
        assert_eq!(out.get_i64("breakdown_question"), Some(2));
        assert_eq!(out.get_i64("breakdown_question_points"), Some(7));
        assert_eq!(out.get_i64("breakdown_full_points"), Some(0));
    }

    #[tokio::test]
    async fn unknown_participant_gets_zeros() {
        let ext = extension(&[ScoreRecord::for_match(1, 1, 1, 1, 1, 1)], MapOptions::new()).await;
        let params = RowParams::new().with("user_id", 77).with("points", 0);
        let out = ext.extend_row_params(params, &ctx(1, false), &row(77)).await.unwrap();

        for key in BREAKDOWN_KEYS {
            assert_eq!(out.get(key), Some("0"), "{key}");
        }
        assert_eq!(out.get("points"), Some("0"));
    }

    #[tokio::test]
    async fn falls_back_to_row_user_when_params_lack_it() {
        let ext = extension(&[ScoreRecord::for_match(9, 1, 2, 0, 0, 0)], MapOptions::new()).await;
        let out = ext
            .extend_row_params(RowParams::new(), &ctx(1, false), &row(9))
            .await
            .unwrap();
        assert_eq!(out.get_i64("breakdown_full_points"), Some(10));
    }

    #[tokio::test]
    async fn header_has_seven_labels_and_optional_league_cell() {
        let ext = extension(&[], MapOptions::new()).await;

        let single = ext.extend_header_start("<table>".into(), &ctx(1, false));
        assert!(single.starts_with("<table><thead>"));
        assert!(single.ends_with("<tbody>"));
        assert_eq!(single.matches("<th class=").count(), 7);
        assert_eq!(single.matches("<th></th>").count(), 1);

        let all = ext.extend_header_start(String::new(), &ctx(1, true));
        assert_eq!(all.matches("<th class=").count(), 7);
        assert_eq!(all.matches("<th></th>").count(), 2);
        for label in ["user", "predictions", "full", "toto", "goal bonus", "goal diff", "points"] {
            assert!(all.contains(&format!(">{label}</th>")), "{label}");
        }
    }

    struct Upper;

    impl Translate for Upper {
        fn translate(&self, text: &str) -> String {
            text.to_uppercase()
        }
    }

    #[tokio::test]
    async fn header_labels_are_translated() {
        let ext = extension(&[], MapOptions::new()).await.with_translator(Arc::new(Upper));
        let header = ext.extend_header_start(String::new(), &ctx(1, false));
        assert!(header.contains(">GOAL DIFF</th>"));
    }

    #[tokio::test]
    async fn header_end_replaces_input() {
        let ext = extension(&[], MapOptions::new()).await;
        assert_eq!(
            ext.extend_header_end("</table>".into(), &ctx(1, true)),
            "</tbody></table>"
        );
    }

    #[tokio::test]
    async fn row_templates_differ_by_league_cell() {
        let ext = extension(&[], MapOptions::new()).await;
        let single = ext.extend_row_template("ignored".into(), false, RankingType::Page);
        let all = ext.extend_row_template("ignored".into(), true, RankingType::Page);

        assert_eq!(single.matches("<td").count(), 8);
        assert_eq!(all.matches("<td").count(), 9);

        let single_names = placeholders(&single);
        let all_names = placeholders(&all);
        let extra: Vec<_> = all_names.difference(&single_names).collect();
        assert_eq!(extra, vec!["league_image"]);
        assert!(single_names.is_subset(&all_names));
        for key in [
            "breakdown_full_points",
            "breakdown_toto_points",
            "breakdown_goalbonus_points",
            "breakdown_goaldiff_points",
        ] {
            assert!(single_names.contains(key), "{key}");
        }
        assert!(all.trim_end().ends_with("<td>%league_image%</td>\n</tr>"));
    }

    #[tokio::test]
    async fn renders_breakdown_columns_through_the_table() {
        let ext = extension(
            &[
                ScoreRecord::for_match(1, 4, 1, 0, 0, 0),
                ScoreRecord::for_match(1, 4, 0, 1, 0, 0),
                ScoreRecord::for_match(2, 4, 0, 1, 0, 0),
            ],
            MapOptions::new(),
        )
        .await;
        let rows = vec![
            RankingRow { user_id: 1, user_name: "Ann".into(), points: 7, ..Default::default() },
            RankingRow { user_id: 2, user_name: "Bo".into(), points: 2, ..Default::default() },
            RankingRow { user_id: 3, user_name: "Cy".into(), points: 0, ..Default::default() },
        ];

        let html = crate::ranking::RankingTable::new(Some(&ext))
            .render(&ctx(4, false), &rows)
            .await
            .unwrap();

        assert!(html.contains("<thead>"));
        assert!(html.ends_with("</tbody></table>"));
        assert!(html.contains(r#"<td class="score-breakdown full">5</td>"#));
        assert_eq!(html.matches(r#"<td class="score-breakdown toto">2</td>"#).count(), 2);
        assert!(html.contains(r#"<td class="score-breakdown full">0</td>"#));
        assert!(!html.contains("%breakdown_"));
    }

    #[test]
    fn activate_without_store_yields_nothing() {
        assert!(activate(None, Arc::new(MapOptions::new())).is_none());
        assert_eq!(
            admin_notice(),
            format!(r#"<div class="error"><p>{HOST_MISSING_NOTICE}</p></div>"#)
        );
    }
}
