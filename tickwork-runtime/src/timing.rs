//! Pure calculations of the wait until the next occurrence of a schedule.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use std::time::Duration;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Parse a time of day in `HH:MM:SS` form
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M:%S").ok()
}

/// Time from `now` until the next occurrence of `target` as a time of day.
///
/// Zero when `now` is exactly `target`; a target earlier in the day rolls
/// over to tomorrow, so the result is always below 24h.
pub fn time_until_daily_target(now: NaiveTime, target: NaiveTime) -> Duration {
    let diff = target.signed_duration_since(now);
    let diff = if diff < chrono::Duration::zero() {
        diff + chrono::Duration::days(1)
    } else {
        diff
    };
    diff.to_std().unwrap_or_default()
}

/// Like [`time_until_daily_target`], but rolls forward a day at a time
/// until the occurrence lands on one of `weekdays`. An empty slice allows
/// every day.
pub fn time_until_daily_on(now: NaiveDateTime, target: NaiveTime, weekdays: &[Weekday]) -> Duration {
    let mut wait = time_until_daily_target(now.time(), target);
    if weekdays.is_empty() {
        return wait;
    }
    for _ in 0..7 {
        if weekdays.contains(&occurrence(now, wait).weekday()) {
            break;
        }
        wait += DAY;
    }
    wait
}

/// Time until `target_second` within the current or next minute.
///
/// The result is in `(0, 60]` seconds: a target equal to or behind the
/// current second waits for the next minute, never firing immediately.
pub fn time_until_minute_target(now_second: u32, target_second: u32) -> Duration {
    let now_second = now_second % 60;
    let target_second = target_second % 60;
    let secs = if now_second >= target_second {
        60 - now_second + target_second
    } else {
        target_second - now_second
    };
    Duration::from_secs(u64::from(secs))
}

/// Wait until the next minute-at-second occurrence as seen from `now`
pub(crate) fn time_until_minute_at(now: NaiveDateTime, target_second: u32) -> Duration {
    time_until_minute_target(now.second(), target_second)
}

/// Wait before the next daily run of a loop. After a run has just fired,
/// a zero wait means "this very occurrence" and is pushed to the next day.
pub(crate) fn next_daily_wait(
    now: NaiveDateTime,
    target: NaiveTime,
    weekdays: &[Weekday],
    just_fired: bool,
) -> Duration {
    let wait = time_until_daily_on(now, target, weekdays);
    if just_fired && wait.is_zero() {
        let tomorrow = now + chrono::Duration::days(1);
        return DAY + time_until_daily_on(tomorrow, target, weekdays);
    }
    wait
}

fn occurrence(now: NaiveDateTime, wait: Duration) -> NaiveDateTime {
    now + chrono::Duration::from_std(wait).unwrap_or(chrono::Duration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn at(date: (i32, u32, u32), time: NaiveTime) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_time(time)
    }

    #[test]
    fn daily_target_cases() {
        let cases = [
            (hms(0, 0, 0), hms(0, 0, 1), 1),
            (hms(0, 0, 0), hms(0, 1, 0), 60),
            (hms(0, 0, 0), hms(0, 0, 0), 0),
            (hms(23, 59, 59), hms(0, 0, 0), 1),
            (hms(0, 0, 1), hms(0, 0, 0), 86_399),
        ];
        for (now, target, expected) in cases {
            assert_eq!(
                time_until_daily_target(now, target),
                Duration::from_secs(expected),
                "now={now} target={target}"
            );
        }
    }

    #[test]
    fn daily_target_lands_on_target_within_a_day() {
        for now_secs in (0..86_400).step_by(3_607) {
            for target_secs in (0..86_400).step_by(4_441) {
                let now = NaiveTime::from_num_seconds_from_midnight_opt(now_secs, 0).unwrap();
                let target = NaiveTime::from_num_seconds_from_midnight_opt(target_secs, 0).unwrap();
                let wait = time_until_daily_target(now, target);
                assert!(wait < DAY);
                let (landed, _) = now.overflowing_add_signed(chrono::Duration::from_std(wait).unwrap());
                assert_eq!(landed, target);
            }
        }
    }

    #[test]
    fn daily_target_with_subsecond_now_rolls_over() {
        let now = NaiveTime::from_hms_milli_opt(10, 0, 0, 500).unwrap();
        let wait = time_until_daily_target(now, hms(10, 0, 0));
        assert_eq!(wait, DAY - Duration::from_millis(500));
    }

    #[test]
    fn minute_target_cases() {
        assert_eq!(time_until_minute_target(0, 1), Duration::from_secs(1));
        assert_eq!(time_until_minute_target(59, 0), Duration::from_secs(1));
        assert_eq!(time_until_minute_target(0, 59), Duration::from_secs(59));
        assert_eq!(time_until_minute_target(31, 30), Duration::from_secs(59));
    }

    #[test]
    fn minute_target_never_fires_immediately() {
        for now in 0..60 {
            for target in 0..60 {
                let wait = time_until_minute_target(now, target);
                assert!(wait > Duration::ZERO && wait <= Duration::from_secs(60));
                assert_eq!((now + wait.as_secs() as u32) % 60, target);
            }
        }
    }

    #[test]
    fn weekday_restriction_rolls_forward() {
        // 2020-02-02 is a Sunday
        let sunday = at((2020, 2, 2), hms(10, 0, 0));
        let wait = time_until_daily_on(sunday, hms(10, 0, 1), &[Weekday::Mon]);
        assert_eq!(wait, DAY + Duration::from_secs(1));

        let wait = time_until_daily_on(sunday, hms(10, 0, 1), &[Weekday::Sun]);
        assert_eq!(wait, Duration::from_secs(1));

        let wait = time_until_daily_on(sunday, hms(9, 0, 0), &[Weekday::Sun]);
        assert_eq!(wait, 7 * DAY - Duration::from_secs(3600));
    }

    #[test]
    fn empty_weekdays_means_every_day() {
        let sunday = at((2020, 2, 2), hms(10, 0, 0));
        assert_eq!(
            time_until_daily_on(sunday, hms(10, 0, 1), &[]),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn next_daily_wait_skips_the_occurrence_just_fired() {
        let monday = at((2020, 2, 3), hms(10, 0, 1));
        assert_eq!(next_daily_wait(monday, hms(10, 0, 1), &[], false), Duration::ZERO);
        assert_eq!(next_daily_wait(monday, hms(10, 0, 1), &[], true), DAY);
        assert_eq!(
            next_daily_wait(monday, hms(10, 0, 1), &[Weekday::Mon], true),
            7 * DAY
        );
    }

    #[test]
    fn parses_time_of_day() {
        assert_eq!(parse_time_of_day("10:00:01"), Some(hms(10, 0, 1)));
        assert_eq!(parse_time_of_day("23:59:59"), Some(hms(23, 59, 59)));
        assert_eq!(parse_time_of_day("24:00:00"), None);
        assert_eq!(parse_time_of_day("10:00"), None);
        assert_eq!(parse_time_of_day("noon"), None);
    }
}
