pub mod home_assistant;
pub mod questdb;

pub use home_assistant::HomeAssistantSink;
pub use questdb::QuestDbSink;

use hydro_client::UsageRecord;

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("questdb write failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("home assistant request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("home assistant rejected state update with status {0}")]
    InvalidStatus(reqwest::StatusCode),
}

/// A downstream consumer of parsed usage records. Writes are expected to be
/// idempotent enough to tolerate a re-run from the same start date.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    async fn write(&self, records: &[UsageRecord]) -> Result<(), SinkError>;
}
