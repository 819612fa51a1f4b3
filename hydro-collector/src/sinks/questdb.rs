use hydro_client::UsageRecord;
use sqlx::{postgres::PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use super::{Sink, SinkError};

const TABLE: &str = "hydro_usage";

/// Writes usage records to QuestDB over pgwire and answers the one query the
/// collector needs: the latest timestamp already written.
pub struct QuestDbSink {
    pool: PgPool,
    batch_size: usize,
}

impl QuestDbSink {
    pub fn new(pool: PgPool, batch_size: usize) -> Self {
        Self { pool, batch_size }
    }

    /// The newest `ts` in the usage table, or `None` when the table is empty.
    /// The caller uses this as the start of the next fetch window.
    pub async fn last_usage_timestamp(&self) -> Result<Option<OffsetDateTime>, SinkError> {
        let ts: Option<OffsetDateTime> =
            sqlx::query_scalar(&format!("SELECT max(ts) FROM {TABLE}"))
                .fetch_one(&self.pool)
                .await?;
        Ok(ts)
    }

    async fn insert_batch(&self, batch: &[UsageRecord]) -> Result<(), sqlx::Error> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("INSERT INTO {TABLE} (ts, kwh, peak, cost) "));

        builder.push_values(batch, |mut b, r| {
            b.push_bind(r.ts)
                .push_bind(r.kwh)
                .push_bind(&r.peak)
                .push_bind(r.cost);
        });

        let query = builder.build();
        query.execute(&self.pool).await.map(|_| ())
    }
}

#[async_trait::async_trait]
impl Sink for QuestDbSink {
    async fn write(&self, records: &[UsageRecord]) -> Result<(), SinkError> {
        for batch in records.chunks(self.batch_size) {
            self.insert_batch(batch).await?;
            tracing::info!(rows = batch.len(), "wrote usage batch to questdb");
        }
        Ok(())
    }
}
