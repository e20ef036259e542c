use std::time::Duration;

/// Remaining wait before the next poll cycle may start.
///
/// The interval is measured from cycle start, not cycle end, so the time
/// spent scraping is subtracted from the wait. Floors at zero when a scrape
/// overruns the interval.
pub fn remaining_wait(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}
