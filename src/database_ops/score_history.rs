use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::Row;
use tracing::{debug, instrument};

use crate::database_ops::db::{Db, DbPool};

/// Item type stored in the `type` column of the score history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Match,
    Question,
}

impl ItemType {
    /// Host constants: matches are `0`, bonus questions `1`.
    pub const fn code(self) -> i32 {
        match self {
            ItemType::Match => 0,
            ItemType::Question => 1,
        }
    }
}

/// One row of the host's score history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub user_id: i64,
    pub ranking_id: i64,
    pub item_type: ItemType,
    pub full: i64,
    pub toto: i64,
    pub goal_bonus: i64,
    pub goal_diff_bonus: i64,
    pub score: i64,
}

impl ScoreRecord {
    pub fn for_match(
        user_id: i64,
        ranking_id: i64,
        full: i64,
        toto: i64,
        goal_bonus: i64,
        goal_diff_bonus: i64,
    ) -> Self {
        Self {
            user_id,
            ranking_id,
            item_type: ItemType::Match,
            full,
            toto,
            goal_bonus,
            goal_diff_bonus,
            score: 0,
        }
    }

    pub fn for_question(user_id: i64, ranking_id: i64, score: i64) -> Self {
        Self {
            user_id,
            ranking_id,
            item_type: ItemType::Question,
            full: 0,
            toto: 0,
            goal_bonus: 0,
            goal_diff_bonus: 0,
            score,
        }
    }
}

/// Summed match sub-scores for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchTotals {
    pub user_id: i64,
    pub full: i64,
    pub toto: i64,
    pub goal_bonus: i64,
    pub goal_diff: i64,
}

/// Bonus-question aggregate for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTotals {
    pub user_id: i64,
    /// Rows with a strictly positive score.
    pub correct: i64,
    /// Sum of all scores; may be zero or negative.
    pub points: i64,
}

/// Read access to the grouped score history.
#[async_trait]
pub trait ScoreHistory: Send + Sync {
    /// Match totals per participant, ascending by participant id.
    async fn match_totals(&self, ranking_id: i64) -> Result<Vec<MatchTotals>>;

    /// Question totals per participant, ascending by participant id.
    async fn question_totals(&self, ranking_id: i64) -> Result<Vec<QuestionTotals>>;
}

/// The host's score-history table reached through [`Db`].
#[derive(Clone, Debug)]
pub struct ScoreTable {
    db: Db,
    table: String,
}

impl ScoreTable {
    /// The table name is interpolated into SQL, so only plain identifiers pass.
    pub fn new(db: Db, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if !is_plain_identifier(&table) {
            bail!("invalid score table name {table:?}");
        }
        Ok(Self { db, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn match_totals_sql(&self) -> String {
        let (ranking, kind) = self.placeholders();
        format!(
            r#"
            SELECT CAST("user_id" AS BIGINT) AS "user_id",
                   CAST(COALESCE(SUM("full"), 0) AS BIGINT) AS "breakdown_full",
                   CAST(COALESCE(SUM("toto"), 0) AS BIGINT) AS "breakdown_toto",
                   CAST(COALESCE(SUM("goal_bonus"), 0) AS BIGINT) AS "breakdown_goalbonus",
                   CAST(COALESCE(SUM("goal_diff_bonus"), 0) AS BIGINT) AS "breakdown_goaldiff"
            FROM "{table}"
            WHERE "ranking_id" = {ranking} AND "type" = {kind}
            GROUP BY "user_id"
            ORDER BY "user_id" ASC
            "#,
            table = self.table,
        )
    }

    fn question_totals_sql(&self) -> String {
        let (ranking, kind) = self.placeholders();
        format!(
            r#"
            SELECT CAST("user_id" AS BIGINT) AS "user_id",
                   COUNT(CASE WHEN "score" > 0 THEN 1 END) AS "breakdown_question",
                   CAST(COALESCE(SUM("score"), 0) AS BIGINT) AS "breakdown_question_points"
            FROM "{table}"
            WHERE "ranking_id" = {ranking} AND "type" = {kind}
            GROUP BY "user_id"
            ORDER BY "user_id" ASC
            "#,
            table = self.table,
        )
    }

    fn placeholders(&self) -> (&'static str, &'static str) {
        match self.db.pool {
            DbPool::Postgres(_) => ("$1", "$2"),
            DbPool::Sqlite(_) => ("?1", "?2"),
        }
    }

    /// Create the table when it does not exist. Used for demo databases and
    /// tests; the host normally owns this schema.
    pub async fn create_if_missing(&self) -> Result<()> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{table}" (
                "user_id" BIGINT NOT NULL,
                "ranking_id" BIGINT NOT NULL,
                "type" INTEGER NOT NULL,
                "full" BIGINT NOT NULL DEFAULT 0,
                "toto" BIGINT NOT NULL DEFAULT 0,
                "goal_bonus" BIGINT NOT NULL DEFAULT 0,
                "goal_diff_bonus" BIGINT NOT NULL DEFAULT 0,
                "score" BIGINT NOT NULL DEFAULT 0
            )
            "#,
            table = self.table,
        );
        self.db.execute_raw(&ddl).await
    }

    #[instrument(skip(self, records), fields(table = %self.table, rows = records.len()))]
    pub async fn insert_records(&self, records: &[ScoreRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let values = match self.db.pool {
            DbPool::Postgres(_) => "($1, $2, $3, $4, $5, $6, $7, $8)",
            DbPool::Sqlite(_) => "(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        };
        let sql = format!(
            r#"INSERT INTO "{table}" ("user_id", "ranking_id", "type", "full", "toto", "goal_bonus", "goal_diff_bonus", "score") VALUES {values}"#,
            table = self.table,
        );
        match &self.db.pool {
            DbPool::Postgres(pool) => {
                let mut tx = pool.begin().await?;
                for r in records {
                    sqlx::query(&sql)
                        .bind(r.user_id)
                        .bind(r.ranking_id)
                        .bind(r.item_type.code())
                        .bind(r.full)
                        .bind(r.toto)
                        .bind(r.goal_bonus)
                        .bind(r.goal_diff_bonus)
                        .bind(r.score)
                        .execute(&mut *tx)
                        .await?;
                }
                tx.commit().await?;
            }
            DbPool::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                for r in records {
                    sqlx::query(&sql)
                        .bind(r.user_id)
                        .bind(r.ranking_id)
                        .bind(r.item_type.code())
                        .bind(r.full)
                        .bind(r.toto)
                        .bind(r.goal_bonus)
                        .bind(r.goal_diff_bonus)
                        .bind(r.score)
                        .execute(&mut *tx)
                        .await?;
                }
                tx.commit().await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ScoreHistory for ScoreTable {
    #[instrument(skip(self), fields(table = %self.table))]
    async fn match_totals(&self, ranking_id: i64) -> Result<Vec<MatchTotals>> {
        let sql = self.match_totals_sql();
        let kind = ItemType::Match.code();
        let out: Vec<MatchTotals> = match &self.db.pool {
            DbPool::Postgres(pool) => sqlx::query(&sql)
                .persistent(false)
                .bind(ranking_id)
                .bind(kind)
                .fetch_all(pool)
                .await?
                .iter()
                .map(|r| MatchTotals {
                    user_id: r.get("user_id"),
                    full: r.get("breakdown_full"),
                    toto: r.get("breakdown_toto"),
                    goal_bonus: r.get("breakdown_goalbonus"),
                    goal_diff: r.get("breakdown_goaldiff"),
                })
                .collect(),
            DbPool::Sqlite(pool) => sqlx::query(&sql)
                .bind(ranking_id)
                .bind(kind)
                .fetch_all(pool)
                .await?
                .iter()
                .map(|r| MatchTotals {
                    user_id: r.get("user_id"),
                    full: r.get("breakdown_full"),
                    toto: r.get("breakdown_toto"),
                    goal_bonus: r.get("breakdown_goalbonus"),
                    goal_diff: r.get("breakdown_goaldiff"),
                })
                .collect(),
        };
        debug!(rows = out.len(), "match totals fetched");
        Ok(out)
    }

    #[instrument(skip(self), fields(table = %self.table))]
    async fn question_totals(&self, ranking_id: i64) -> Result<Vec<QuestionTotals>> {
        let sql = self.question_totals_sql();
        let kind = ItemType::Question.code();
        let out: Vec<QuestionTotals> = match &self.db.pool {
            DbPool::Postgres(pool) => sqlx::query(&sql)
                .persistent(false)
                .bind(ranking_id)
                .bind(kind)
                .fetch_all(pool)
                .await?
                .iter()
                .map(|r| QuestionTotals {
                    user_id: r.get("user_id"),
                    correct: r.get("breakdown_question"),
                    points: r.get("breakdown_question_points"),
                })
                .collect(),
            DbPool::Sqlite(pool) => sqlx::query(&sql)
                .bind(ranking_id)
                .bind(kind)
                .fetch_all(pool)
                .await?
                .iter()
                .map(|r| QuestionTotals {
                    user_id: r.get("user_id"),
                    correct: r.get("breakdown_question"),
                    points: r.get("breakdown_question_points"),
                })
                .collect(),
        };
        debug!(rows = out.len(), "question totals fetched");
        Ok(out)
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
