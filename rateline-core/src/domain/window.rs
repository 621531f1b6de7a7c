//! Time window — the (start, end) span a session requests history for.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default lookback when no explicit start is supplied.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 250;

/// Inclusive UTC time span.
///
/// Well-formed windows have `start <= end`. Degenerate windows are not
/// rejected; they are passed through to the terminal as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Resolve a window from optional bounds.
    ///
    /// End falls back to `now`; start falls back to end minus `lookback_days`
    /// whole days, clamped to the earliest representable instant.
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        lookback_days: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let end = end.unwrap_or(now);
        let start = start.unwrap_or_else(|| {
            end.checked_sub_signed(Duration::days(i64::from(lookback_days)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        });
        Self { start, end }
    }

    /// True when start lies after end.
    pub fn is_degenerate(&self) -> bool {
        self.start > self.end
    }

    /// Inclusive containment.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
