//! Date-range expressions of conditional tags
//!
//! Grammar: `<from>[-<to>]` or the open-ended `<from>+` / `<from>-` where each side is
//! one of `yyyy MMM dd`, `yyyy MMM`, `MMM dd`, `dd.MM`, `MMM` or a weekday
//! (`Mo`/`Mon` .. `Su`/`Sun`). An open end runs to the last representable date for
//! dated sides, to Dec 31 for yearless sides and to Sunday for weekdays.
//! `PH` and `SH` tokens are ignored. Month names are case-insensitive English
//! abbreviations.
//!
//! Yearless ranges wrap around the year end (`Oct-May`), weekday ranges wrap around the
//! week (`Fr-Mo`). Dated ranges must not be reversed.

use chrono::{Datelike, Month, NaiveDate, Weekday};
use thiserror::Error;

/// Result of checking a condition against a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionState {
    True,
    False,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("empty date expression")]
    Empty,

    #[error("cannot parse '{0}' as a date")]
    Unparsable(String),

    #[error("'{from}' and '{to}' are different kinds of date")]
    MixedKinds { from: String, to: String },

    #[error("reversed date range '{0}'")]
    Reversed(String),

    #[error("invalid calendar date '{0}'")]
    InvalidDate(String),
}

/// One side of a range, as written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateSpec {
    /// `yyyy MMM dd` or `yyyy MMM` (day `None`)
    Dated { year: i32, month: u32, day: Option<u32> },
    /// `MMM dd`, `dd.MM` or `MMM` (day `None`)
    Yearless { month: u32, day: Option<u32> },
    Weekday(Weekday),
}

/// A parsed, validated date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    /// Inclusive `(month, day)` bounds; `from > to` wraps the year end
    Seasonal { from: (u32, u32), to: (u32, u32) },
    /// Inclusive weekday bounds; `from > to` wraps the week
    Weekdays { from: Weekday, to: Weekday },
    /// Inclusive calendar dates
    Absolute { from: NaiveDate, to: NaiveDate },
}

impl DateRange {
    pub fn parse(expr: &str) -> Result<DateRange, DateRangeError> {
        let cleaned = strip_holidays(expr);
        if cleaned.is_empty() {
            return Err(DateRangeError::Empty);
        }

        let (text, plus) = match cleaned.strip_suffix('+') {
            Some(text) => (text.trim_end(), true),
            None => (cleaned.as_str(), false),
        };
        let (from_text, to_text) = split_range(text);
        if plus && to_text.is_some() {
            return Err(DateRangeError::Unparsable(cleaned.clone()));
        }
        let from = parse_spec(from_text)?;
        if plus || to_text == Some("") {
            return open_ended(from, from_text);
        }
        let to = match to_text {
            Some(text) => parse_spec(text)?,
            None => from,
        };

        match (from, to) {
            (DateSpec::Weekday(from), DateSpec::Weekday(to)) => Ok(DateRange::Weekdays { from, to }),
            (
                DateSpec::Yearless { month: m1, day: d1 },
                DateSpec::Yearless { month: m2, day: d2 },
            ) => Ok(DateRange::Seasonal {
                from: (m1, d1.unwrap_or(1)),
                to: (m2, d2.unwrap_or_else(|| days_in_month(2000, m2))),
            }),
            (
                DateSpec::Dated { year: y1, month: m1, day: d1 },
                DateSpec::Dated { year: y2, month: m2, day: d2 },
            ) => {
                let from = calendar_date(y1, m1, d1.unwrap_or(1), from_text)?;
                let to = calendar_date(y2, m2, d2.unwrap_or_else(|| days_in_month(y2, m2)), to_text.unwrap_or(from_text))?;
                if from > to {
                    return Err(DateRangeError::Reversed(cleaned.clone()));
                }
                Ok(DateRange::Absolute { from, to })
            }
            _ => Err(DateRangeError::MixedKinds {
                from: from_text.to_string(),
                to: to_text.unwrap_or(from_text).to_string(),
            }),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            DateRange::Seasonal { from, to } => {
                let current = (date.month(), date.day());
                if from <= to {
                    from <= current && current <= to
                } else {
                    current >= from || current <= to
                }
            }
            DateRange::Weekdays { from, to } => {
                let (from, to) = (from.num_days_from_monday(), to.num_days_from_monday());
                let current = date.weekday().num_days_from_monday();
                if from <= to {
                    from <= current && current <= to
                } else {
                    current >= from || current <= to
                }
            }
            DateRange::Absolute { from, to } => from <= date && date <= to,
        }
    }
}

/// Range from `from` to the end of its calendar
fn open_ended(from: DateSpec, text: &str) -> Result<DateRange, DateRangeError> {
    Ok(match from {
        DateSpec::Dated { year, month, day } => DateRange::Absolute {
            from: calendar_date(year, month, day.unwrap_or(1), text)?,
            to: NaiveDate::MAX,
        },
        DateSpec::Yearless { month, day } => DateRange::Seasonal {
            from: (month, day.unwrap_or(1)),
            to: (12, 31),
        },
        DateSpec::Weekday(from) => DateRange::Weekdays { from, to: Weekday::Sun },
    })
}

/// Parse `expr` and check it against `date`
pub fn check_condition(expr: &str, date: NaiveDate) -> ConditionState {
    match DateRange::parse(expr) {
        Ok(range) if range.contains(date) => ConditionState::True,
        Ok(_) => ConditionState::False,
        Err(_) => ConditionState::Invalid,
    }
}

fn strip_holidays(expr: &str) -> String {
    expr.split_whitespace()
        .map(|t| t.trim_matches(','))
        .filter(|t| !t.eq_ignore_ascii_case("PH") && !t.eq_ignore_ascii_case("SH") && !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split on the range dash; a single side yields `None`
fn split_range(expr: &str) -> (&str, Option<&str>) {
    match expr.split_once('-') {
        Some((from, to)) => (from.trim(), Some(to.trim())),
        None => (expr.trim(), None),
    }
}

fn parse_spec(text: &str) -> Result<DateSpec, DateRangeError> {
    let unparsable = || DateRangeError::Unparsable(text.to_string());
    let tokens: Vec<&str> = text.split_whitespace().collect();

    match tokens.as_slice() {
        [single] => {
            if let Some(weekday) = parse_weekday(single) {
                return Ok(DateSpec::Weekday(weekday));
            }
            if let Some(month) = parse_month(single) {
                return Ok(DateSpec::Yearless { month, day: None });
            }
            if let Some((day, month)) = single.split_once('.') {
                let day = parse_day(day).ok_or_else(unparsable)?;
                let month: u32 = month.parse().map_err(|_| unparsable())?;
                if !(1..=12).contains(&month) || day > days_in_month(2000, month) {
                    return Err(DateRangeError::InvalidDate(text.to_string()));
                }
                return Ok(DateSpec::Yearless { month, day: Some(day) });
            }
            Err(unparsable())
        }
        [first, second] => {
            if let Some(month) = parse_month(first) {
                let day = parse_day(second).ok_or_else(unparsable)?;
                if day > days_in_month(2000, month) {
                    return Err(DateRangeError::InvalidDate(text.to_string()));
                }
                return Ok(DateSpec::Yearless { month, day: Some(day) });
            }
            let year = parse_year(first).ok_or_else(unparsable)?;
            let month = parse_month(second).ok_or_else(unparsable)?;
            Ok(DateSpec::Dated { year, month, day: None })
        }
        [year, month, day] => Ok(DateSpec::Dated {
            year: parse_year(year).ok_or_else(unparsable)?,
            month: parse_month(month).ok_or_else(unparsable)?,
            day: Some(parse_day(day).ok_or_else(unparsable)?),
        }),
        _ => Err(unparsable()),
    }
}

fn parse_month(token: &str) -> Option<u32> {
    if token.len() != 3 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    token.parse::<Month>().ok().map(|m| m.number_from_month())
}

fn parse_weekday(token: &str) -> Option<Weekday> {
    if !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    match token.len() {
        2 => match token.to_ascii_lowercase().as_str() {
            "mo" => Some(Weekday::Mon),
            "tu" => Some(Weekday::Tue),
            "we" => Some(Weekday::Wed),
            "th" => Some(Weekday::Thu),
            "fr" => Some(Weekday::Fri),
            "sa" => Some(Weekday::Sat),
            "su" => Some(Weekday::Sun),
            _ => None,
        },
        3 => token.parse::<Weekday>().ok(),
        _ => None,
    }
}

fn parse_day(token: &str) -> Option<u32> {
    let day: u32 = token.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

fn parse_year(token: &str) -> Option<i32> {
    if token.len() != 4 {
        return None;
    }
    token.parse().ok()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

fn calendar_date(year: i32, month: u32, day: u32, text: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| DateRangeError::InvalidDate(text.to_string()))
}
