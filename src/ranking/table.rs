use anyhow::Result;
use tracing::{debug, instrument};

use super::extension::{RankingContext, RankingExtension, RankingRow};
use super::params::RowParams;
use super::template::substitute;

const DEFAULT_TEMPLATE_START: &str = r#"<table class="pool-ranking ranking">"#;
const DEFAULT_TEMPLATE_END: &str = "</table>";
const DEFAULT_ROW_TEMPLATE: &str = r#"<tr class="%css_class%">
<td style="width:3em; text-align: right;">%rank%.</td>
<td><a href="%user_link%">%user_avatar%%user_name%</a></td>
<td class="ranking score">%points%</td>
</tr>"#;
const DEFAULT_ROW_TEMPLATE_ALL_USERS: &str = r#"<tr class="%css_class%">
<td style="width:3em; text-align: right;">%rank%.</td>
<td><a href="%user_link%">%user_avatar%%user_name%</a></td>
<td class="ranking score">%points%</td>
<td>%league_image%</td>
</tr>"#;

/// Minimal host-side ranking renderer. An optional extension is consulted at
/// each extension point; without one the default markup is emitted.
#[derive(Clone, Copy, Default)]
pub struct RankingTable<'a> {
    extension: Option<&'a dyn RankingExtension>,
}

impl<'a> RankingTable<'a> {
    pub fn new(extension: Option<&'a dyn RankingExtension>) -> Self {
        Self { extension }
    }

    /// Render `rows` (already in ranking order) to HTML. The first failing
    /// extension call aborts the whole render.
    #[instrument(skip(self, rows), fields(ranking_id = ctx.ranking_id, rows = rows.len()))]
    pub async fn render(&self, ctx: &RankingContext, rows: &[RankingRow]) -> Result<String> {
        let mut start = DEFAULT_TEMPLATE_START.to_string();
        let mut end = DEFAULT_TEMPLATE_END.to_string();
        let mut row_template = if ctx.all_user_view {
            DEFAULT_ROW_TEMPLATE_ALL_USERS.to_string()
        } else {
            DEFAULT_ROW_TEMPLATE.to_string()
        };

        if let Some(ext) = self.extension {
            start = ext.extend_header_start(start, ctx);
            end = ext.extend_header_end(end, ctx);
            row_template = ext.extend_row_template(row_template, ctx.all_user_view, ctx.ranking_type);
        }

        let mut html = start;
        for (idx, row) in rows.iter().enumerate() {
            let mut params = default_row_params(ctx, row, idx);
            if let Some(ext) = self.extension {
                params = ext.extend_row_params(params, ctx, row).await?;
            }
            html.push_str(&substitute(&row_template, &params));
        }
        html.push_str(&end);

        debug!(bytes = html.len(), "ranking rendered");
        Ok(html)
    }
}

/// Parameters the host provides for every row before extensions run.
pub fn default_row_params(ctx: &RankingContext, row: &RankingRow, idx: usize) -> RowParams {
    let mut css_class = if ctx.viewing_user == Some(row.user_id) {
        "currentuser".to_string()
    } else {
        String::new()
    };
    css_class.push_str(if idx % 2 == 0 { " even" } else { " odd" });

    RowParams::new()
        .with("user_id", row.user_id)
        .with("rank", row.rank.unwrap_or(idx as i64 + 1))
        .with("user_name", &row.user_name)
        .with("user_link", row.user_link.as_deref().unwrap_or("#"))
        .with("user_avatar", row.user_avatar.as_deref().unwrap_or(""))
        .with("num_predictions", row.num_predictions)
        .with("points", row.points)
        .with("css_class", css_class.trim_start())
        .with("league_image", row.league_image.as_deref().unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn rows() -> Vec<RankingRow> {
        vec![
            RankingRow {
                user_id: 3,
                user_name: "Ann".into(),
                points: 20,
                ..Default::default()
            },
            RankingRow {
                user_id: 8,
                user_name: "Bo".into(),
                points: 14,
                league_image: Some("<img src=\"l.png\">".into()),
                ..Default::default()
            },
        ]
    }

    #[tokio::test]
    async fn renders_defaults_without_extension() {
        let ctx = RankingContext {
            ranking_id: 1,
            viewing_user: Some(8),
            ..Default::default()
        };
        let html = RankingTable::new(None).render(&ctx, &rows()).await.unwrap();

        assert!(html.starts_with(DEFAULT_TEMPLATE_START));
        assert!(html.ends_with("</table>"));
        assert!(html.contains(r#"<tr class="even">"#));
        assert!(html.contains(r#"<tr class="currentuser odd">"#));
        assert!(html.contains(">1.</td>") && html.contains(">2.</td>"));
        assert!(!html.contains('%'), "unsubstituted placeholder in {html}");
    }

    #[tokio::test]
    async fn all_user_view_adds_league_column() {
        let ctx = RankingContext {
            ranking_id: 1,
            all_user_view: true,
            ..Default::default()
        };
        let html = RankingTable::new(None).render(&ctx, &rows()).await.unwrap();
        assert!(html.contains(r#"<td><img src="l.png"></td>"#));
    }

    struct Shout;

    #[async_trait]
    impl RankingExtension for Shout {
        async fn extend_row_params(
            &self,
            mut params: RowParams,
            _ctx: &RankingContext,
            row: &RankingRow,
        ) -> Result<RowParams> {
            params.set("user_name", row.user_name.to_uppercase());
            Ok(params)
        }
    }

    #[tokio::test]
    async fn partial_extension_keeps_other_defaults() {
        let ext = Shout;
        let ctx = RankingContext { ranking_id: 1, ..Default::default() };
        let html = RankingTable::new(Some(&ext)).render(&ctx, &rows()).await.unwrap();
        assert!(html.contains("ANN") && html.contains("BO"));
        assert!(html.ends_with(DEFAULT_TEMPLATE_END));
    }

    struct Broken;

    #[async_trait]
    impl RankingExtension for Broken {
        async fn extend_row_params(
            &self,
            _params: RowParams,
            _ctx: &RankingContext,
            _row: &RankingRow,
        ) -> Result<RowParams> {
            anyhow::bail!("store unavailable")
        }
    }

    #[tokio::test]
    async fn extension_failure_aborts_render() {
        let ext = Broken;
        let ctx = RankingContext { ranking_id: 1, ..Default::default() };
        let err = RankingTable::new(Some(&ext)).render(&ctx, &rows()).await.unwrap_err();
        assert_eq!(err.to_string(), "store unavailable");
    }
}
