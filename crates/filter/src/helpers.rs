//! Helper function dispatch table (spec §4.1 helper table).
//!
//! Each helper receives the evaluation [`Env`] (for helpers that read
//! record-level facts not exposed as a plain `Value` argument, e.g.
//! `watchedBy`) plus its already-evaluated argument list.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::env::Env;
use crate::error::EvalError;
use crate::value::Value;

pub fn call(name: &str, args: &[Value], env: &Env<'_>) -> Result<Value, EvalError> {
    match name {
        "hasTag" => {
            let tag = string_arg(name, args, 0)?;
            Ok(Value::Bool(env.record.has_tag(tag)))
        }
        "watchedBy" => {
            let user = string_arg(name, args, 0)?;
            Ok(Value::Bool(
                env.record
                    .user_watch
                    .get(user)
                    .map(|u| u.watched)
                    .unwrap_or(false),
            ))
        }
        "watchCountBy" => {
            let user = string_arg(name, args, 0)?;
            Ok(Value::Int(
                env.record
                    .user_watch
                    .get(user)
                    .map(|u| u.watch_count as i64)
                    .unwrap_or(0),
            ))
        }
        "watchProgressBy" => {
            let user = string_arg(name, args, 0)?;
            Ok(Value::Float(
                env.record
                    .user_watch
                    .get(user)
                    .map(|u| u.max_progress)
                    .unwrap_or(0.0),
            ))
        }
        "daysSince" => {
            let ts = timestamp_arg(name, args, 0)?;
            Ok(Value::Int((env.now - ts).num_days()))
        }
        "daysAgo" => {
            let n = number_arg(name, args, 0)?;
            Ok(Value::Timestamp(env.now - Duration::days(n as i64)))
        }
        "monthsAgo" => {
            let n = number_arg(name, args, 0)?;
            Ok(Value::Timestamp(shift_months(env.now, n as i32)))
        }
        "yearsAgo" => {
            let n = number_arg(name, args, 0)?;
            Ok(Value::Timestamp(shift_months(env.now, n as i32 * 12)))
        }
        "parseDate" => {
            let s = string_arg(name, args, 0)?;
            Ok(Value::Timestamp(parse_date(s)))
        }
        "now" => {
            arity(name, args, 0)?;
            Ok(Value::Timestamp(env.now))
        }
        "contains" => {
            let s = string_arg(name, args, 0)?;
            let sub = string_arg(name, args, 1)?;
            Ok(Value::Bool(s.contains(sub)))
        }
        "startsWith" => {
            let s = string_arg(name, args, 0)?;
            let prefix = string_arg(name, args, 1)?;
            Ok(Value::Bool(s.starts_with(prefix)))
        }
        "endsWith" => {
            let s = string_arg(name, args, 0)?;
            let suffix = string_arg(name, args, 1)?;
            Ok(Value::Bool(s.ends_with(suffix)))
        }
        "lower" => Ok(Value::Str(string_arg(name, args, 0)?.to_lowercase())),
        "upper" => Ok(Value::Str(string_arg(name, args, 0)?.to_uppercase())),
        "imdbRating" => rating(env, "imdb"),
        "tmdbRating" => rating(env, "tmdb"),
        "rottenTomatoesRating" => rating(env, "rottentomatoes"),
        "metacriticRating" => rating(env, "metacritic"),
        "hasRating" => {
            let key = string_arg(name, args, 0)?;
            Ok(Value::Bool(env.record.ratings.contains_key(&key.to_lowercase())))
        }
        "getRating" => {
            let key = string_arg(name, args, 0)?.to_lowercase();
            Ok(env
                .record
                .ratings
                .get(&key)
                .copied()
                .map(Value::Float)
                .unwrap_or(Value::Null))
        }
        "requestedBy" => {
            arity(name, args, 0)?;
            Ok(Value::Str(env.record.requested_by.clone()))
        }
        "approvedBy" => {
            arity(name, args, 0)?;
            Ok(env
                .record
                .approved_by
                .clone()
                .map(Value::Str)
                .unwrap_or(Value::Null))
        }
        "requestedAfter" => {
            let ts = timestamp_arg(name, args, 0)?;
            Ok(Value::Bool(
                env.record.requested_at.map(|at| at > ts).unwrap_or(false),
            ))
        }
        "requestedBefore" => {
            let ts = timestamp_arg(name, args, 0)?;
            Ok(Value::Bool(
                env.record.requested_at.map(|at| at < ts).unwrap_or(false),
            ))
        }
        "requestStatus" => {
            let s = string_arg(name, args, 0)?;
            Ok(Value::Bool(env.record.request_status.matches_name(s)))
        }
        "isRequested" => {
            arity(name, args, 0)?;
            Ok(Value::Bool(env.record.is_requested))
        }
        "notRequested" => {
            arity(name, args, 0)?;
            Ok(Value::Bool(!env.record.is_requested))
        }
        // The requester's personal "watched" threshold is fixed at 85%,
        // deliberately distinct from the library-wide configurable
        // `min_watch_percent` used by WatchEnricher (spec §9 Open Question).
        "watchedByRequester" => requester_watched(env, 0.85),
        "notWatchedByRequester" => requester_watched(env, 0.85).map(|v| match v {
            Value::Bool(b) => Value::Bool(!b),
            other => other,
        }),
        "len" => {
            arity(name, args, 1)?;
            let list = args[0]
                .as_list()
                .ok_or_else(|| EvalError::TypeError("len() expects a sequence".into()))?;
            Ok(Value::Int(list.len() as i64))
        }
        other => Err(EvalError::UnknownHelper(other.to_string())),
    }
}

fn requester_watched(env: &Env<'_>, threshold: f64) -> Result<Value, EvalError> {
    let requester = &env.record.requested_by;
    if requester.is_empty() {
        return Ok(Value::Bool(false));
    }
    Ok(Value::Bool(
        env.record
            .user_watch
            .get(requester)
            .map(|u| u.max_progress >= threshold || u.watched)
            .unwrap_or(false),
    ))
}

fn rating(env: &Env<'_>, key: &str) -> Result<Value, EvalError> {
    Ok(env
        .record
        .ratings
        .get(key)
        .copied()
        .map(Value::Float)
        .unwrap_or(Value::Null))
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() != expected {
        return Err(EvalError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn string_arg<'a>(name: &str, args: &'a [Value], idx: usize) -> Result<&'a str, EvalError> {
    args.get(idx)
        .and_then(Value::as_str)
        .ok_or_else(|| EvalError::TypeError(format!("{name}() expects a string argument")))
}

fn number_arg(name: &str, args: &[Value], idx: usize) -> Result<f64, EvalError> {
    args.get(idx)
        .and_then(Value::as_f64)
        .ok_or_else(|| EvalError::TypeError(format!("{name}() expects a numeric argument")))
}

fn timestamp_arg(name: &str, args: &[Value], idx: usize) -> Result<chrono::DateTime<Utc>, EvalError> {
    match args.get(idx) {
        Some(Value::Timestamp(ts)) => Ok(*ts),
        Some(Value::Str(s)) => Ok(parse_date(s)),
        _ => Err(EvalError::TypeError(format!(
            "{name}() expects a date argument"
        ))),
    }
}

/// Parses an RFC3339 timestamp or a bare `YYYY-MM-DD` date. Invalid input
/// yields the zero timestamp rather than an error, so a malformed literal
/// in a filter expression fails the comparison instead of the whole
/// evaluation.
/// Shifts `dt` back by `months` calendar months, clamping the day down to
/// the last valid day of the target month (e.g. Mar 31 minus one month
/// lands on Feb 28/29, not an overflowed March date).
fn shift_months(dt: DateTime<Utc>, months: i32) -> DateTime<Utc> {
    let total = dt.year() * 12 + dt.month0() as i32 - months;
    let year = total.div_euclid(12);
    let month = (total.rem_euclid(12) + 1) as u32;
    let naive_date = (1..=dt.day())
        .rev()
        .find_map(|day| chrono::NaiveDate::from_ymd_opt(year, month, day))
        .expect("every month has at least 28 days");
    Utc.from_utc_datetime(&naive_date.and_time(dt.time()))
}

fn parse_date(s: &str) -> chrono::DateTime<Utc> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Utc.from_utc_datetime(&naive.and_hms_opt(0, 0, 0).expect("valid midnight"));
    }
    Utc.timestamp_opt(0, 0).single().expect("valid epoch")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_rfc3339_and_plain_date() {
        assert_eq!(parse_date("2020-01-01").timestamp(), 1577836800);
        assert!(parse_date("2020-01-01T00:00:00Z").timestamp() > 0);
    }

    #[test]
    fn parse_date_returns_zero_timestamp_on_invalid_input() {
        assert_eq!(parse_date("not-a-date").timestamp(), 0);
    }

    #[test]
    fn shift_months_clamps_at_month_length_boundaries() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        assert_eq!(shift_months(now, 1).format("%Y-%m-%d").to_string(), "2024-02-29");
    }

    #[test]
    fn shift_months_by_twelve_moves_back_one_year() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        assert_eq!(shift_months(now, 12).format("%Y-%m-%d").to_string(), "2023-06-15");
    }

    #[test]
    fn shift_months_crosses_year_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(shift_months(now, 2).format("%Y-%m-%d").to_string(), "2023-11-15");
    }
}
