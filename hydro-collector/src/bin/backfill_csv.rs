use std::{env, fs::File};

use anyhow::{bail, Result};
use hydro_client::parse::parse_usage_csv;
use hydro_collector::{
    config::AppConfig,
    observability,
    sinks::{QuestDbSink, Sink},
};
use sqlx::postgres::PgPoolOptions;

/// Loads a previously saved portal CSV export straight into QuestDB, for
/// backfilling history without touching the portal.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: backfill_csv <csv_file_path>");
    }
    let file_path = &args[1];

    let cfg = AppConfig::load()?;

    let file = File::open(file_path)?;
    let records = parse_usage_csv(file)?;
    tracing::info!(rows = records.len(), file = %file_path, "parsed usage export");

    let pool = PgPoolOptions::new()
        .max_connections(cfg.questdb.max_connections)
        .connect(&cfg.questdb.uri)
        .await?;
    let sink = QuestDbSink::new(pool, cfg.sink.batch_size);

    sink.write(&records).await?;

    Ok(())
}
