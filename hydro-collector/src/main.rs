use anyhow::Result;
use hydro_client::{DateRange, PortalClient, PORTAL_OFFSET};
use hydro_collector::{
    config::AppConfig,
    observability,
    sinks::{HomeAssistantSink, QuestDbSink, Sink},
};
use sqlx::postgres::PgPoolOptions;
use time::{Duration, OffsetDateTime};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.questdb.max_connections)
        .connect(&cfg.questdb.uri)
        .await?;
    let questdb = QuestDbSink::new(pool, cfg.sink.batch_size);
    let home_assistant = cfg.home_assistant.map(HomeAssistantSink::new);

    let client = PortalClient::connect(cfg.portal).await?;

    let today = OffsetDateTime::now_utc().to_offset(PORTAL_OFFSET).date();
    let start = match questdb.last_usage_timestamp().await? {
        Some(ts) => ts.to_offset(PORTAL_OFFSET).date(),
        None => today - Duration::days(cfg.collect.lookback_days),
    };
    tracing::info!(%start, %today, "collecting portal usage");

    // Each chunk is handed to the sinks as soon as it parses, so a failure
    // late in a long range only costs the chunks not yet written.
    for chunk in DateRange::new(start, today).chunks(today) {
        tracing::info!(start = %chunk.start, end = %chunk.end, "fetching usage chunk");
        let records = client.fetch_usage(chunk).await?;
        tracing::info!(rows = records.len(), "parsed usage records");

        questdb.write(&records).await?;
        if let Some(ha) = &home_assistant {
            ha.write(&records).await?;
        }
    }

    Ok(())
}
