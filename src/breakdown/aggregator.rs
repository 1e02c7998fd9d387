use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::cache::{cache_key, BreakdownCache};
use super::{Breakdown, MatchCounts, QuestionTally};
use crate::database_ops::score_history::ScoreHistory;

/// Computes per-participant breakdowns and memoizes them per ranking.
#[derive(Clone)]
pub struct BreakdownService {
    store: Arc<dyn ScoreHistory>,
    cache: Arc<dyn BreakdownCache>,
}

impl BreakdownService {
    pub fn new(store: Arc<dyn ScoreHistory>, cache: Arc<dyn BreakdownCache>) -> Self {
        Self { store, cache }
    }

    /// Breakdown for `ranking_id`, computed on first use and cached for the
    /// lifetime of the cache. Store errors are returned as-is and nothing is
    /// cached for that ranking.
    #[instrument(skip(self))]
    pub async fn get_breakdown(&self, ranking_id: i64) -> Result<Arc<Breakdown>> {
        let key = cache_key(ranking_id);
        if let Some(hit) = self.cache.get(&key) {
            debug!(%key, participants = hit.len(), "breakdown cache hit");
            return Ok(hit);
        }

        let breakdown = Arc::new(self.compute(ranking_id).await?);
        self.cache.set(&key, Arc::clone(&breakdown));
        info!(
            %key,
            participants = breakdown.len(),
            "breakdown computed and cached"
        );
        Ok(breakdown)
    }

    async fn compute(&self, ranking_id: i64) -> Result<Breakdown> {
        let mut breakdown = Breakdown::new();

        for row in self.store.match_totals(ranking_id).await? {
            breakdown.set_matches(
                row.user_id,
                MatchCounts {
                    full: row.full,
                    toto: row.toto,
                    goal_bonus: row.goal_bonus,
                    goal_diff: row.goal_diff,
                },
            );
        }

        for row in self.store.question_totals(ranking_id).await? {
            breakdown.set_questions(
                row.user_id,
                QuestionTally {
                    correct: row.correct,
                    points: row.points,
                },
            );
        }

        Ok(breakdown)
    }
}
