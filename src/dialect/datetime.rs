//! Date/time expression builders.
//!
//! Redshift has no `to_timestamp(double)`, so epoch values become the epoch
//! anchor plus an interval, and relative dates are `GETDATE()` plus an
//! interval literal. Every function here builds SQL text and performs no I/O.

use crate::error::{DialectError, DialectResult};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::str::FromStr;

/// The fixed epoch instant as a Redshift timestamp literal.
pub const EPOCH_ANCHOR: &str = "TIMESTAMP '1970-01-01T00:00:00Z'";

/// Redshift's current-timestamp function.
pub const REDSHIFT_NOW: &str = "GETDATE()";

/// Query returning the database's current time as text.
///
/// `OF` renders the session offset numerically (`+00`, `-08`, `+05:30`)
/// whatever zone `SET TIMEZONE` selected; `TZ` would render abbreviations.
pub const CURRENT_TIME_QUERY: &str =
    "SELECT to_char(current_timestamp, 'YYYY-MM-DD HH24:MI:SS.MS OF')";

/// chrono format of [`CURRENT_TIME_QUERY`] output, e.g. `2024-03-05 06:22:01.123 -08`.
pub const CURRENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %#z";

/// An opaque dialect-native SQL fragment for the query compiler to splice in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DateTimeExpression(String);

impl DateTimeExpression {
    pub(crate) fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_sql(&self) -> &str {
        &self.0
    }

    pub fn into_sql(self) -> String {
        self.0
    }
}

impl std::fmt::Display for DateTimeExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolution of an epoch-based numeric timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochUnit {
    Seconds,
    Milliseconds,
    Microseconds,
}

impl EpochUnit {
    /// Units per second.
    pub fn per_second(&self) -> u32 {
        match self {
            Self::Seconds => 1,
            Self::Milliseconds => 1_000,
            Self::Microseconds => 1_000_000,
        }
    }
}

impl FromStr for EpochUnit {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "second" | "seconds" => Ok(Self::Seconds),
            "ms" | "millisecond" | "milliseconds" => Ok(Self::Milliseconds),
            "us" | "microsecond" | "microseconds" => Ok(Self::Microseconds),
            other => Err(DialectError::invalid_input(format!(
                "unknown epoch unit '{}'",
                other
            ))),
        }
    }
}

/// Calendar unit of a relative-date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl CalendarUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

impl std::fmt::Display for CalendarUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalendarUnit {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let singular = lower.strip_suffix('s').unwrap_or(&lower);
        match singular {
            "second" => Ok(Self::Second),
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(DialectError::invalid_input(format!(
                "unknown calendar unit '{}'",
                s
            ))),
        }
    }
}

// =============================================================================
// Epoch Conversion
// =============================================================================

/// Convert a numeric epoch timestamp into a Redshift timestamp expression.
///
/// Milliseconds and microseconds are scaled down and re-enter as seconds;
/// only the seconds branch knows the epoch anchor. Non-finite values have no
/// timestamp and render as a typed `NULL`.
pub fn unix_timestamp(value: f64, unit: EpochUnit) -> DateTimeExpression {
    match unit {
        EpochUnit::Seconds if value.is_finite() => anchor_plus_seconds(&sql_number(value)),
        EpochUnit::Seconds => DateTimeExpression::new("CAST(NULL AS TIMESTAMP)"),
        EpochUnit::Milliseconds => unix_timestamp(value / 1000.0, EpochUnit::Seconds),
        EpochUnit::Microseconds => unix_timestamp(value / 1_000_000.0, EpochUnit::Seconds),
    }
}

/// Same as [`unix_timestamp`] for a SQL expression such as a column.
pub fn unix_timestamp_expr(sql: &str, unit: EpochUnit) -> DateTimeExpression {
    match unit {
        EpochUnit::Seconds => anchor_plus_seconds(&format!("({})", sql)),
        EpochUnit::Milliseconds => {
            unix_timestamp_expr(&format!("{} / 1000.0", sql), EpochUnit::Seconds)
        }
        EpochUnit::Microseconds => {
            unix_timestamp_expr(&format!("{} / 1000000.0", sql), EpochUnit::Seconds)
        }
    }
}

fn anchor_plus_seconds(seconds: &str) -> DateTimeExpression {
    DateTimeExpression::new(format!(
        "({} + ({} * INTERVAL '1 second'))",
        EPOCH_ANCHOR, seconds
    ))
}

/// Render a finite f64 as a SQL numeric literal (never exponent notation).
pub(crate) fn sql_number(value: f64) -> String {
    // f64's Display is plain decimal; `{:e}` or shortest-repr formatters are not.
    format!("{}", value)
}

// =============================================================================
// Relative Dates
// =============================================================================

/// `GETDATE()` plus `amount` of `unit`. Negative amounts subtract.
pub fn relative_date(unit: CalendarUnit, amount: i64) -> DateTimeExpression {
    now_plus_interval(REDSHIFT_NOW, unit, amount)
}

/// `now_sql` plus an interval literal of `amount` `unit`s.
///
/// Quarters are written as three months.
pub fn now_plus_interval(now_sql: &str, unit: CalendarUnit, amount: i64) -> DateTimeExpression {
    DateTimeExpression::new(format!("({} + {})", now_sql, interval_literal(unit, amount)))
}

/// `INTERVAL '<amount> <unit>'`.
pub fn interval_literal(unit: CalendarUnit, amount: i64) -> String {
    let (magnitude, unit) = match unit {
        CalendarUnit::Quarter => (i128::from(amount) * 3, CalendarUnit::Month),
        other => (i128::from(amount), other),
    };
    format!("INTERVAL '{} {}'", magnitude, unit)
}

// =============================================================================
// Current Time
// =============================================================================

/// Parse the output of [`CURRENT_TIME_QUERY`] with [`CURRENT_TIME_FORMAT`].
pub fn parse_db_time(text: &str) -> DialectResult<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_str(text, CURRENT_TIME_FORMAT).map_err(|e| {
        DialectError::invalid_input(format!("invalid database time '{}': {}", text, e))
    })
}
