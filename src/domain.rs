use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::error::GrabError;

/// Shown in place of the participant code when the row has none.
pub const UNKNOWN_PARTICIPANT: &str = "??";

pub const PHOTO_EXTENSION: &str = "jpg";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\-]").expect("valid regex"));

static DATE_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<a>\d{1,4})[/.\-](?P<b>\d{1,2})[/.\-](?P<c>\d{1,4})$").expect("valid regex")
});

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// One dataset record that survived URL filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRow {
    /// 1-based data line, header excluded.
    pub line: u64,
    pub url: String,
    pub participant: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl PhotoRow {
    /// Best-effort reference for log lines; never fails.
    pub fn display_id(&self) -> &str {
        match self.participant.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => UNKNOWN_PARTICIPANT,
        }
    }

    /// Builds `<sanitized-id>_<YYYYMMDD_HHMMSS>.jpg` for this row.
    pub fn photo_filename(&self) -> Result<String, GrabError> {
        let participant = self
            .participant
            .as_deref()
            .ok_or_else(|| GrabError::MissingField("participant".to_string()))?;
        let date = self
            .date
            .as_deref()
            .ok_or_else(|| GrabError::MissingField("date".to_string()))?;
        let time = self
            .time
            .as_deref()
            .ok_or_else(|| GrabError::MissingField("time".to_string()))?;

        let stamp = compose_timestamp(date, time)?;
        let stem = sanitize(participant);
        if stem.is_empty() {
            tracing::warn!(
                line = self.line,
                %stamp,
                "blank participant code; rows sharing this timestamp overwrite each other"
            );
        }
        Ok(photo_filename(&stem, &stamp))
    }
}

impl fmt::Display for PhotoRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({})", self.line, self.display_id())
    }
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize(text: &str) -> String {
    UNSAFE_CHARS.replace_all(text, "_").into_owned()
}

pub fn photo_filename(sanitized_id: &str, stamp: &str) -> String {
    format!("{sanitized_id}_{stamp}.{PHOTO_EXTENSION}")
}

/// Joins `date` and `time` with a space and formats the day-first reading
/// of the result as `YYYYMMDD_HHMMSS`.
pub fn compose_timestamp(date: &str, time: &str) -> Result<String, GrabError> {
    let combined = format!("{date} {time}");
    let parsed = parse_day_first(&combined).ok_or(GrabError::Timestamp { input: combined })?;
    Ok(parsed.format(TIMESTAMP_FORMAT).to_string())
}

/// Parses a `<date> [<time>]` string, reading ambiguous dates as day/month/year.
///
/// A four-digit leading component is taken as an ISO year-month-day date.
/// Two-digit years follow the `%y` convention (69 and below are 20xx).
/// A missing time means midnight.
pub fn parse_day_first(input: &str) -> Option<NaiveDateTime> {
    let trimmed = input.trim();
    let (date_part, time_part) = match trimmed.split_once(char::is_whitespace) {
        Some((date, time)) => (date, time.trim()),
        None => (trimmed, ""),
    };

    let date = parse_date(date_part)?;
    let time = if time_part.is_empty() {
        NaiveTime::from_hms_opt(0, 0, 0)?
    } else {
        parse_time(time_part)?
    };
    Some(date.and_time(time))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let caps = DATE_PARTS.captures(value)?;
    let a = &caps["a"];
    let b = &caps["b"];
    let c = &caps["c"];

    if a.len() == 4 {
        if c.len() > 2 {
            return None;
        }
        return NaiveDate::from_ymd_opt(a.parse().ok()?, b.parse().ok()?, c.parse().ok()?);
    }
    if a.len() > 2 {
        return None;
    }

    let year = match c.len() {
        4 => c.parse().ok()?,
        1 | 2 => {
            let short: i32 = c.parse().ok()?;
            if short <= 69 { 2000 + short } else { 1900 + short }
        }
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, b.parse().ok()?, a.parse().ok()?)
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}
