//! Injectable wall-clock source.
//!
//! Id allocation and invitation `sentAt` stamps both read time through this
//! trait so tests can pin it.

use chrono::{SecondsFormat, TimeZone, Utc};

pub trait Clock {
    /// Current time as Unix epoch milliseconds.
    fn now_millis(&self) -> i64;

    /// Current time as ISO-8601 UTC with millisecond precision, e.g.
    /// `2026-02-22T18:00:00.000Z`.
    fn now_iso(&self) -> String {
        let millis = self.now_millis();
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_default()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock};

    #[test]
    fn iso_rendering_uses_utc_millisecond_shape() {
        let clock = FixedClock(1_771_783_200_000);
        assert_eq!(clock.now_iso(), "2026-02-22T18:00:00.000Z");
    }
}
