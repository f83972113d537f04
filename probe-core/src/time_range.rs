//! Preset time windows resolved against an explicit `now`.

use chrono::{DateTime, Datelike, Days, Duration, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------ //
//  Types                                                              //
// ------------------------------------------------------------------ //

/// A named relative window selectable on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    #[serde(rename = "24h")]
    Last24Hours,
    #[default]
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "14d")]
    Last14Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "custom")]
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 7] = [
        Preset::Last24Hours,
        Preset::Last7Days,
        Preset::Last14Days,
        Preset::Last30Days,
        Preset::Last90Days,
        Preset::YearToDate,
        Preset::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Last24Hours => "24h",
            Preset::Last7Days   => "7d",
            Preset::Last14Days  => "14d",
            Preset::Last30Days  => "30d",
            Preset::Last90Days  => "90d",
            Preset::YearToDate  => "ytd",
            Preset::Custom      => "custom",
        }
    }

    /// Parse a wire code. Unknown codes fall back to the default window.
    pub fn from_code(s: &str) -> Self {
        match s {
            "24h"    => Preset::Last24Hours,
            "14d"    => Preset::Last14Days,
            "30d"    => Preset::Last30Days,
            "90d"    => Preset::Last90Days,
            "ytd"    => Preset::YearToDate,
            "custom" => Preset::Custom,
            _        => Preset::Last7Days,
        }
    }

    fn calendar_days(self) -> Option<u64> {
        match self {
            Preset::Last7Days  => Some(7),
            Preset::Last14Days => Some(14),
            Preset::Last30Days => Some(30),
            Preset::Last90Days => Some(90),
            _ => None,
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Concrete `[from, to)` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn from_iso(&self) -> String {
        format_instant(&self.from)
    }

    pub fn to_iso(&self) -> String {
        format_instant(&self.to)
    }
}

// ------------------------------------------------------------------ //
//  Resolution                                                         //
// ------------------------------------------------------------------ //

/// Resolve `preset` relative to `now`.
///
/// Day-based presets subtract calendar days on `now`'s wall clock and map the
/// result back through `now`'s zone, so a window spanning a DST change is not
/// a fixed multiple of 24 hours. `ytd` starts at local midnight on January 1st.
///
/// Returns `None` for [`Preset::Custom`]: custom bounds come from the stored
/// selection, not from here.
pub fn resolve<Tz: TimeZone>(preset: Preset, now: &DateTime<Tz>) -> Option<TimeRange> {
    let from = match preset {
        Preset::Custom => return None,
        Preset::Last24Hours => shift_back(now, Duration::hours(24)),
        Preset::YearToDate => start_of_year(now),
        _ => {
            let days = preset.calendar_days()?;
            calendar_days_before(now, days)
        }
    };

    Some(TimeRange {
        from: from.with_timezone(&Utc),
        to: now.with_timezone(&Utc),
    })
}

fn shift_back<Tz: TimeZone>(now: &DateTime<Tz>, by: Duration) -> DateTime<Tz> {
    now.clone()
        .checked_sub_signed(by)
        .unwrap_or_else(|| now.clone())
}

fn calendar_days_before<Tz: TimeZone>(now: &DateTime<Tz>, days: u64) -> DateTime<Tz> {
    // A wall-clock time inside a DST gap has no instant; fall back to fixed days.
    now.naive_local()
        .checked_sub_days(Days::new(days))
        .and_then(|naive| now.timezone().from_local_datetime(&naive).earliest())
        .unwrap_or_else(|| shift_back(now, Duration::days(days as i64)))
}

fn start_of_year<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    now.timezone()
        .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
        .earliest()
        .unwrap_or_else(|| now.clone())
}

// ------------------------------------------------------------------ //
//  ISO-8601 boundary                                                  //
// ------------------------------------------------------------------ //

/// Format as RFC 3339 in UTC, keeping exactly as many sub-second digits as
/// the instant carries.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an RFC 3339 string with any offset into a UTC instant.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
