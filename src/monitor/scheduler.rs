// Run schedule - cron expressions evaluated in UTC

use crate::Result;
use crate::error::CredwatchError;
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

/// Parse a 5-field (minute precision) or 6/7-field (with seconds) cron expression.
///
/// 5-field expressions use Unix day-of-week numbering (0-7, Sunday as 0 or
/// 7). 6/7-field expressions are passed through in `cron` crate syntax
/// (1-7, Sunday as 1).
pub fn parse_schedule(expression: &str) -> Result<Schedule> {
    let trimmed = expression.trim();
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    let normalized = match fields.len() {
        5 => format!(
            "0 {} {}",
            fields[..4].join(" "),
            unix_day_of_week(fields[4])?
        ),
        6 | 7 => trimmed.to_string(),
        n => {
            return Err(CredwatchError::config(format!(
                "invalid cron expression '{}': expected 5 to 7 fields, found {}",
                expression, n
            )));
        }
    };

    Schedule::from_str(&normalized).map_err(|e| {
        CredwatchError::config(format!("invalid cron expression '{}': {}", expression, e))
    })
}

/// Rewrite a Unix day-of-week field into `cron` crate numbering
fn unix_day_of_week(field: &str) -> Result<String> {
    let invalid = || CredwatchError::config(format!("invalid day-of-week field '{}'", field));
    let day = |value: &str| match value.parse::<u8>() {
        Ok(n) if n <= 7 => Ok(n),
        _ => Err(invalid()),
    };

    let mut items = Vec::new();
    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (item, None),
        };

        // Wildcards and day names read the same in both numberings
        if !range.starts_with(|c: char| c.is_ascii_digit()) {
            items.push(item.to_string());
            continue;
        }

        let suffix = step.map(|s| format!("/{}", s)).unwrap_or_default();
        match range.split_once('-') {
            None => items.push(format!("{}{}", day(range)? % 7 + 1, suffix)),
            Some((start, end)) => {
                let (start, end) = (day(start)?, day(end)?);
                if end == 7 && start < 7 {
                    // Sunday closes the range; the crate wants it as 1
                    let every = match step {
                        Some(s) => s.parse::<u8>().map_err(|_| invalid())?,
                        None => 1,
                    };
                    if start == 6 && step.is_none() {
                        items.push("7".to_string());
                    } else {
                        items.push(format!("{}-7{}", start + 1, suffix));
                    }
                    if every > 0 && (7 - start) % every == 0 {
                        items.push("1".to_string());
                    }
                } else {
                    items.push(format!("{}-{}{}", start % 7 + 1, end % 7 + 1, suffix));
                }
            }
        }
    }

    Ok(items.join(","))
}

/// First fire time strictly after `after`
pub fn next_run_after(schedule: &Schedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&after).next()
}
