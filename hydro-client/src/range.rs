use time::{Date, Duration};

/// The portal caps a single usage query at this many days.
pub const MAX_CHUNK_DAYS: i64 = 30;

/// Wall-clock boundaries for a usage query, date-only granularity. Whether
/// the provider treats the range as half-open or closed is its own business;
/// boundaries are passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// Split into consecutive sub-ranges of at most [`MAX_CHUNK_DAYS`] days,
    /// clamping the overall end to `today`. Chunks are contiguous and
    /// non-overlapping; an empty or future-only range yields no chunks.
    pub fn chunks(self, today: Date) -> Vec<DateRange> {
        let end = self.end.min(today);

        let mut out = Vec::new();
        let mut cursor = self.start;
        while cursor < end {
            let chunk_end = (cursor + Duration::days(MAX_CHUNK_DAYS)).min(end);
            out.push(DateRange::new(cursor, chunk_end));
            cursor = chunk_end;
        }
        out
    }
}

/// `YYYY-MM-DD`, the only date format the portal accepts.
pub(crate) fn format_portal_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
