use chrono::{DateTime, Duration, Utc};

use kominukator_shared::constants::ACTIVE_NOW_WINDOW_SECS;

/// Presence shown next to a user in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    ActiveNow,
    ActiveAgo(Duration),
    Offline,
}

impl PresenceStatus {
    pub fn of(last_active: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(last) = last_active else {
            return Self::Offline;
        };
        let elapsed = now - last;
        if elapsed < Duration::seconds(ACTIVE_NOW_WINDOW_SECS) {
            Self::ActiveNow
        } else {
            Self::ActiveAgo(elapsed)
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::ActiveNow)
    }

    pub fn label(&self) -> String {
        match self {
            Self::ActiveNow => "Active now".to_string(),
            Self::Offline => "Offline".to_string(),
            Self::ActiveAgo(elapsed) => format!("Active {} ago", format_distance(*elapsed)),
        }
    }
}

const MINUTES_IN_DAY: i64 = 1_440;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;
const MINUTES_IN_YEAR: i64 = 525_600;

/// Coarse human distance such as "5 minutes" or "about 2 hours".
pub fn format_distance(elapsed: Duration) -> String {
    let seconds = elapsed.num_seconds().max(0);
    let minutes = (seconds as f64 / 60.0).round() as i64;

    match minutes {
        0 => "less than a minute".to_string(),
        1 => "1 minute".to_string(),
        m if m < 45 => format!("{m} minutes"),
        m if m < 90 => "about 1 hour".to_string(),
        m if m < MINUTES_IN_DAY => {
            let hours = (m as f64 / 60.0).round() as i64;
            format!("about {hours} hours")
        }
        m if m < 2_520 => "1 day".to_string(),
        m if m < MINUTES_IN_MONTH => {
            let days = (m as f64 / MINUTES_IN_DAY as f64).round() as i64;
            format!("{days} days")
        }
        m if m < MINUTES_IN_TWO_MONTHS => {
            let months = (m as f64 / MINUTES_IN_MONTH as f64).round() as i64;
            plural_about(months, "month")
        }
        m if m < MINUTES_IN_YEAR => {
            let months = (m as f64 / MINUTES_IN_MONTH as f64).round() as i64;
            format!("{months} months")
        }
        m => {
            let years = m / MINUTES_IN_YEAR;
            plural_about(years, "year")
        }
    }
}

fn plural_about(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("about 1 {unit}")
    } else {
        format!("about {n} {unit}s")
    }
}
