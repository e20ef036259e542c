use std::time::Duration;

use gradewatch_core::remaining_wait;

#[test]
fn scrape_time_is_subtracted_from_wait() {
    let wait = remaining_wait(Duration::from_secs(300), Duration::from_secs(45));
    assert_eq!(wait, Duration::from_secs(255));
}

#[test]
fn overrunning_scrape_floors_at_zero() {
    let wait = remaining_wait(Duration::from_secs(300), Duration::from_secs(301));
    assert_eq!(wait, Duration::ZERO);
}

#[test]
fn idle_cycle_waits_the_full_interval() {
    let wait = remaining_wait(Duration::from_secs(300), Duration::ZERO);
    assert_eq!(wait, Duration::from_secs(300));
}
