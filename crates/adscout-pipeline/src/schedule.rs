//! Recurring triggers for the three runs.
//!
//! Triggers are evaluated in a fixed UTC offset. Each one renders to the
//! six-field cron syntax (`sec min hour day month weekday`) used by the live
//! scheduler and can compute its next fire time directly, so schedules are
//! testable without a running timer.

use std::fmt;

use chrono::{DateTime, Duration, DurationRound, FixedOffset, NaiveTime, Timelike, Utc};

pub const SCRAPING_JOB: &str = "scraping";
pub const ANALYSIS_JOB: &str = "analysis";
pub const CLEANUP_JOB: &str = "cleanup";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSpec {
    /// On the hour, every `n` hours counted from local midnight.
    EveryHours(u32),
    /// On the minute, every `n` minutes counted from the top of the hour.
    EveryMinutes(u32),
    DailyAt { hour: u32, minute: u32 },
}

impl TriggerSpec {
    #[must_use]
    pub fn cron_expression(&self) -> String {
        match *self {
            TriggerSpec::EveryHours(n) => format!("0 0 */{} * * *", n.clamp(1, 23)),
            TriggerSpec::EveryMinutes(n) => format!("0 */{} * * * *", n.clamp(1, 59)),
            TriggerSpec::DailyAt { hour, minute } => {
                format!("0 {} {} * * *", minute.min(59), hour.min(23))
            }
        }
    }

    /// First fire time strictly after `after`, with the trigger read in
    /// `offset` local time.
    #[must_use]
    pub fn next_fire_after(&self, after: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
        let local = after.with_timezone(&offset);
        match *self {
            TriggerSpec::EveryHours(n) => {
                let n = n.clamp(1, 23);
                let mut candidate = truncate(local, Duration::hours(1)) + Duration::hours(1);
                while candidate.hour() % n != 0 {
                    candidate += Duration::hours(1);
                }
                candidate.with_timezone(&Utc)
            }
            TriggerSpec::EveryMinutes(n) => {
                let n = n.clamp(1, 59);
                let mut candidate = truncate(local, Duration::minutes(1)) + Duration::minutes(1);
                while candidate.minute() % n != 0 {
                    candidate += Duration::minutes(1);
                }
                candidate.with_timezone(&Utc)
            }
            TriggerSpec::DailyAt { hour, minute } => {
                let at = NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0)
                    .unwrap_or(NaiveTime::MIN);
                let today = local
                    .date_naive()
                    .and_time(at)
                    .and_local_timezone(offset)
                    .single()
                    .map_or(after, |t| t.with_timezone(&Utc));
                if today > after {
                    today
                } else {
                    today + Duration::days(1)
                }
            }
        }
    }
}

fn truncate(t: DateTime<FixedOffset>, unit: Duration) -> DateTime<FixedOffset> {
    t.duration_trunc(unit).unwrap_or(t)
}

impl fmt::Display for TriggerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSpec::EveryHours(n) => write!(f, "every {n}h on the hour"),
            TriggerSpec::EveryMinutes(n) => write!(f, "every {n} min"),
            TriggerSpec::DailyAt { hour, minute } => write!(f, "daily at {hour:02}:{minute:02}"),
        }
    }
}

/// The production schedule: scrape every two hours, analyze every half
/// hour, clean up nightly at 02:00.
#[must_use]
pub fn default_schedule() -> [(&'static str, TriggerSpec); 3] {
    [
        (SCRAPING_JOB, TriggerSpec::EveryHours(2)),
        (ANALYSIS_JOB, TriggerSpec::EveryMinutes(30)),
        (CLEANUP_JOB, TriggerSpec::DailyAt { hour: 2, minute: 0 }),
    ]
}

/// `FixedOffset` for a whole-hour UTC offset, `None` if out of range.
#[must_use]
pub fn utc_offset(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}
