//! Score breakdown admin CLI.
//!
//! Environment:
//! - DATABASE_URL / FOOTBALLPOOL_DB_URL: `postgres://…` or `sqlite:…`
//! - FOOTBALLPOOL_DB_PREFIX, FOOTBALLPOOL_SCORE_TABLE: score-history table name parts
//! - FOOTBALLPOOL_FULLPOINTS / _TOTOPOINTS / _GOALPOINTS / _DIFFPOINTS: point multipliers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fp_score_breakdown::breakdown::{BreakdownService, MemoryCache};
use fp_score_breakdown::database_ops::db::Db;
use fp_score_breakdown::database_ops::score_history::{ScoreRecord, ScoreTable};
use fp_score_breakdown::ranking::{
    activate, admin_notice, EnvOptions, RankingContext, RankingExtension, RankingRow,
    RankingTable, RankingType,
};
use fp_score_breakdown::tracing::init_tracing;
use fp_score_breakdown::util::env::{self, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "fp-breakdown", version, about = "Football pool ranking score breakdown")]
struct Cli {
    /// Optional override for the database URL
    #[arg(long, global = true)]
    db_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Print the per-participant breakdown of a ranking as JSON
    Show {
        #[arg(long)]
        ranking_id: i64,
    },
    /// Render a ranking table with breakdown columns from a JSON file of rows
    Render {
        #[arg(long)]
        ranking_id: i64,
        /// JSON array of ranking rows, in ranking order
        #[arg(long)]
        rows: PathBuf,
        /// Render the cross-league view (extra league column)
        #[arg(long, default_value_t = false)]
        all_users: bool,
        /// Highlight this participant's row
        #[arg(long)]
        viewing_user: Option<i64>,
        #[arg(long, default_value = "page")]
        ranking_type: RankingType,
        /// Render without the breakdown columns
        #[arg(long, default_value_t = false)]
        plain: bool,
    },
    /// Create the score table (if missing) and load a few demo rows
    SeedDemo {
        #[arg(long, default_value_t = 1)]
        ranking_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info,sqlx=warn")?;
    env::init_env();
    let cli = Cli::parse();

    let settings = match Settings::resolve(cli.db_url.clone()) {
        Ok(s) => s,
        Err(e) => {
            // Host store missing: nothing to extend.
            warn!(error = %e, "no database configured");
            eprintln!("{}", admin_notice());
            std::process::exit(2);
        }
    };

    let db = Db::connect(&settings.database_url, settings.max_connections).await?;
    db.ping()
        .await
        .with_context(|| format!("{} database is not reachable", db.backend_name()))?;
    let table = ScoreTable::new(db, settings.score_table_name())?;

    match cli.command {
        Commands::Show { ranking_id } => {
            let service = BreakdownService::new(Arc::new(table), Arc::new(MemoryCache::new()));
            let breakdown = service.get_breakdown(ranking_id).await?;
            println!("{}", serde_json::to_string_pretty(breakdown.as_ref())?);
        }
        Commands::Render {
            ranking_id,
            rows,
            all_users,
            viewing_user,
            ranking_type,
            plain,
        } => {
            let raw = std::fs::read_to_string(&rows)
                .with_context(|| format!("failed to read {}", rows.display()))?;
            let rows: Vec<RankingRow> = serde_json::from_str(&raw)
                .with_context(|| format!("invalid ranking rows in {}", rows.display()))?;
            let ctx = RankingContext {
                viewing_user,
                ranking_id,
                all_user_view: all_users,
                ranking_type,
            };

            let extension = if plain {
                None
            } else {
                let service =
                    BreakdownService::new(Arc::new(table), Arc::new(MemoryCache::new()));
                activate(Some(service), Arc::new(EnvOptions))
            };
            let html = RankingTable::new(extension.as_ref().map(|e| e as &dyn RankingExtension))
                .render(&ctx, &rows)
                .await?;
            println!("{html}");
        }
        Commands::SeedDemo { ranking_id } => {
            table.create_if_missing().await?;
            let records = demo_records(ranking_id);
            table.insert_records(&records).await?;
            info!(
                table = table.table(),
                rows = records.len(),
                ranking_id,
                "demo score history loaded"
            );
        }
    }

    Ok(())
}

fn demo_records(ranking_id: i64) -> Vec<ScoreRecord> {
    vec![
        ScoreRecord::for_match(1, ranking_id, 1, 0, 0, 0),
        ScoreRecord::for_match(1, ranking_id, 0, 1, 1, 0),
        ScoreRecord::for_match(1, ranking_id, 0, 1, 0, 1),
        ScoreRecord::for_question(1, ranking_id, 5),
        ScoreRecord::for_match(2, ranking_id, 0, 1, 0, 0),
        ScoreRecord::for_match(2, ranking_id, 1, 0, 0, 0),
        ScoreRecord::for_question(2, ranking_id, 0),
        ScoreRecord::for_question(3, ranking_id, 10),
    ]
}
