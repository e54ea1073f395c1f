//! §4.11 "Cron parsing": lower a fixed set of natural-language phrases to a
//! 6-field cron expression (`sec min hour dom month dow`, the form the
//! `cron` crate expects), then validate with [`cron::Schedule`].

use std::str::FromStr;

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use regex::Regex;

use crate::error::Error;
use crate::Result;

/// Lower `input` to a validated cron expression. Accepts a raw 6-field cron
/// expression as-is, or one of the recognized natural-language phrases.
pub fn parse(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let lowered = to_cron_phrase(trimmed).unwrap_or_else(|| trimmed.to_string());
    validate(&lowered)?;
    Ok(lowered)
}

/// Validate a cron expression without attempting phrase lowering.
pub fn validate(expression: &str) -> Result<()> {
    Schedule::from_str(expression)
        .map(|_| ())
        .map_err(|e| Error::validation("cron_expression", format!("invalid cron expression '{expression}': {e}")))
}

fn to_cron_phrase(phrase: &str) -> Option<String> {
    let lower = phrase.to_lowercase();

    if lower == "hourly" {
        return Some("0 0 * * * *".to_string());
    }
    if lower == "weekly" {
        return Some("0 0 0 * * 0".to_string());
    }

    if let Some(minutes) = parse_every_n_minutes(&lower) {
        return Some(format!("0 0/{minutes} * * * *"));
    }

    if let Some((hour, minute)) = parse_daily_at(&lower) {
        return Some(format!("0 {minute} {hour} * * *"));
    }

    if let Some((hour, minute)) = parse_weekdays_at(&lower) {
        return Some(format!("0 {minute} {hour} * * 1-5"));
    }

    None
}

fn parse_every_n_minutes(lower: &str) -> Option<u32> {
    let re = Regex::new(r"^every (\d+) minutes?$").ok()?;
    let caps = re.captures(lower)?;
    caps.get(1)?.as_str().parse().ok()
}

fn parse_daily_at(lower: &str) -> Option<(u32, u32)> {
    let re = Regex::new(r"^daily at (\d{1,2})(?::(\d{2}))?\s*(am|pm)?$").ok()?;
    let caps = re.captures(lower)?;
    time_from_captures(&caps)
}

fn parse_weekdays_at(lower: &str) -> Option<(u32, u32)> {
    let re = Regex::new(r"^weekdays at (\d{1,2})(?::(\d{2}))?\s*(am|pm)?$").ok()?;
    let caps = re.captures(lower)?;
    time_from_captures(&caps)
}

fn time_from_captures(caps: &regex::Captures) -> Option<(u32, u32)> {
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps
        .get(2)
        .map(|m| m.as_str().parse().unwrap_or(0))
        .unwrap_or(0);
    match caps.get(3).map(|m| m.as_str()) {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// `get_next_runs(expression, n, timezone?)`: the next `n` firing times in
/// `timezone` (`local` meaning the process timezone).
pub fn get_next_runs(expression: &str, n: usize, timezone: &str) -> Result<Vec<DateTime<Utc>>> {
    let schedule = Schedule::from_str(expression)
        .map_err(|e| Error::validation("cron_expression", format!("invalid cron expression: {e}")))?;

    if timezone.eq_ignore_ascii_case("local") {
        return Ok(schedule
            .upcoming(Local)
            .take(n)
            .map(|dt| dt.with_timezone(&Utc))
            .collect());
    }

    let tz: Tz = timezone
        .parse()
        .map_err(|_| Error::validation("timezone", format!("unknown timezone '{timezone}'")))?;
    Ok(schedule
        .upcoming(tz)
        .take(n)
        .map(|dt| dt.with_timezone(&Utc))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowers_every_n_minutes() {
        assert_eq!(parse("every 5 minutes").unwrap(), "0 0/5 * * * *");
    }

    #[test]
    fn lowers_daily_at_with_am_pm() {
        assert_eq!(parse("daily at 9am").unwrap(), "0 0 9 * * *");
        assert_eq!(parse("daily at 9pm").unwrap(), "0 0 21 * * *");
    }

    #[test]
    fn lowers_weekdays_at() {
        assert_eq!(parse("weekdays at 9am").unwrap(), "0 0 9 * * 1-5");
    }

    #[test]
    fn accepts_raw_cron_expression() {
        assert_eq!(parse("0 30 8 * * *").unwrap(), "0 30 8 * * *");
    }

    #[test]
    fn rejects_unrecognized_phrase() {
        let err = parse("sometime soonish").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn get_next_runs_returns_n_future_times() {
        let runs = get_next_runs("0 0 9 * * *", 3, "local").unwrap();
        assert_eq!(runs.len(), 3);
        assert!(runs[0] < runs[1]);
        assert!(runs[1] < runs[2]);
    }
}
