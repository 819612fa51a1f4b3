use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};

/// The portal reports all readings in a fixed UTC-5 offset, independent of
/// daylight saving and of wherever this tool happens to run. Timestamps are
/// never reinterpreted in host-local time.
pub const PORTAL_OFFSET: UtcOffset = time::macros::offset!(-5);

/// One hour of metered electricity usage, as exported by the portal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    /// Reading hour, in the portal's fixed UTC-5 offset.
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub kwh: f64,
    /// Time-of-use tier label (on/mid/off-peak). Opaque, passed through.
    pub peak: String,
    pub cost: f64,
}
