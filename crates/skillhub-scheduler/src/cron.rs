//! Five-field cron expressions: parsing, validation and next-run search.
//!
//! Format: `minute hour day-of-month month day-of-week`, all in UTC.
//!
//! | Field        | Range | Notes        |
//! |--------------|-------|--------------|
//! | minute       | 0-59  |              |
//! | hour         | 0-23  |              |
//! | day-of-month | 1-31  |              |
//! | month        | 1-12  |              |
//! | day-of-week  | 0-6   | 0 = Sunday   |
//!
//! Each field is `*`, `n`, `a-b`, `*/s`, `n/s`, `a-b/s`, or a comma list of
//! those. All five fields must match an instant (day-of-month and
//! day-of-week are AND-ed, not OR-ed as in Vixie cron).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

use crate::error::CronError;

/// One year of minutes: the upper bound of the next-run search.
pub const MAX_SCAN_MINUTES: i64 = 525_600;

/// Which of the five positions a field occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
}

impl FieldKind {
    const ALL: [FieldKind; 5] = [
        FieldKind::Minute,
        FieldKind::Hour,
        FieldKind::DayOfMonth,
        FieldKind::Month,
        FieldKind::DayOfWeek,
    ];

    /// Inclusive `(min, max)` bounds.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            FieldKind::Minute => (0, 59),
            FieldKind::Hour => (0, 23),
            FieldKind::DayOfMonth => (1, 31),
            FieldKind::Month => (1, 12),
            FieldKind::DayOfWeek => (0, 6),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Minute => "minute",
            FieldKind::Hour => "hour",
            FieldKind::DayOfMonth => "day-of-month",
            FieldKind::Month => "month",
            FieldKind::DayOfWeek => "day-of-week",
        }
    }
}

/// Where a step sequence starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepBase {
    /// `*/s`: every value divisible by `s`.
    Any,
    /// `n/s`: `n`, `n+s`, `n+2s`, ... up to the field maximum.
    From(u32),
    /// `a-b/s`: `a`, `a+s`, ... while `<= b`.
    Range(u32, u32),
}

/// A single parsed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronField {
    /// `*`
    Any,
    /// `n`
    Value(u32),
    /// `a-b`, inclusive.
    Range(u32, u32),
    /// `base/step`
    Step { base: StepBase, step: u32 },
    /// `x,y,z`: matches when any component matches.
    List(Vec<CronField>),
}

impl CronField {
    /// Parse `text` against the inclusive `[min, max]` range.
    ///
    /// Precedence: list, then step, then range, then bare integer. List
    /// components are parsed recursively against the same bounds.
    pub fn parse(text: &str, min: u32, max: u32) -> Result<Self, String> {
        if text == "*" {
            return Ok(CronField::Any);
        }

        if text.contains(',') {
            let items = text
                .split(',')
                .map(|part| CronField::parse(part, min, max))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(CronField::List(items));
        }

        if let Some((base, step)) = text.split_once('/') {
            let step = parse_number(step).ok_or_else(|| format!("bad step '{step}'"))?;
            // The step is bounded by the field maximum, not by the span of the
            // base: `*/23` is accepted on the hour field.
            if step == 0 || step > max {
                return Err(format!("step {step} must be within 1-{max}"));
            }
            let base = if base == "*" {
                StepBase::Any
            } else {
                match CronField::parse(base, min, max)? {
                    CronField::Value(v) => StepBase::From(v),
                    CronField::Range(a, b) => StepBase::Range(a, b),
                    _ => return Err(format!("bad step base '{base}'")),
                }
            };
            return Ok(CronField::Step { base, step });
        }

        if let Some((start, end)) = text.split_once('-') {
            let start = parse_number(start).ok_or_else(|| format!("bad range '{text}'"))?;
            let end = parse_number(end).ok_or_else(|| format!("bad range '{text}'"))?;
            if start < min || end > max || start > end {
                return Err(format!("range {start}-{end} must satisfy {min} <= a <= b <= {max}"));
            }
            return Ok(CronField::Range(start, end));
        }

        let value = parse_number(text).ok_or_else(|| format!("bad value '{text}'"))?;
        if value < min || value > max {
            return Err(format!("value {value} out of range {min}-{max}"));
        }
        Ok(CronField::Value(value))
    }

    /// True when `value` is selected by this field.
    pub fn matches(&self, value: u32) -> bool {
        match self {
            CronField::Any => true,
            CronField::Value(v) => *v == value,
            CronField::Range(a, b) => (*a..=*b).contains(&value),
            CronField::Step { base, step } => match *base {
                StepBase::Any => value % step == 0,
                StepBase::From(a) => value >= a && (value - a) % step == 0,
                StepBase::Range(a, b) => value >= a && value <= b && (value - a) % step == 0,
            },
            CronField::List(items) => items.iter().any(|f| f.matches(value)),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, CronField::Any)
    }
}

/// Digits only: rejects signs, blanks and anything `u32::from_str` would
/// otherwise tolerate.
fn parse_number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// A fully validated cron expression. Either every field parsed or the
/// whole expression was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
    source: String,
    pub(crate) minute: CronField,
    pub(crate) hour: CronField,
    pub(crate) day_of_month: CronField,
    pub(crate) month: CronField,
    pub(crate) day_of_week: CronField,
}

impl CronExpression {
    /// Parse and validate an expression.
    ///
    /// # Examples
    ///
    /// - `0 9 * * 1-5` - 09:00 on weekdays
    /// - `*/15 * * * *` - every 15 minutes
    /// - `0 0 1 1,7 *` - midnight on January 1st and July 1st
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let invalid = |reason: String| CronError::Invalid {
            expression: expression.to_string(),
            reason,
        };

        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(invalid(format!("expected 5 fields, found {}", parts.len())));
        }

        let mut fields = Vec::with_capacity(5);
        for (kind, text) in FieldKind::ALL.into_iter().zip(parts) {
            let (min, max) = kind.bounds();
            let field = CronField::parse(text, min, max)
                .map_err(|reason| invalid(format!("{} field: {reason}", kind.name())))?;
            fields.push(field);
        }

        let [minute, hour, day_of_month, month, day_of_week] = <[CronField; 5]>::try_from(fields)
            .map_err(|_| invalid("expected 5 fields".to_string()))?;
        Ok(Self {
            source: expression.to_string(),
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
        })
    }

    /// The expression text as given to [`CronExpression::parse`].
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether all five fields match `time` (seconds are ignored).
    pub fn matches(&self, time: &DateTime<Utc>) -> bool {
        self.matches_date(time) && self.hour.matches(time.hour()) && self.minute.matches(time.minute())
    }

    fn matches_date(&self, time: &DateTime<Utc>) -> bool {
        self.month.matches(time.month())
            && self.day_of_month.matches(time.day())
            && self.day_of_week.matches(time.weekday().num_days_from_sunday())
    }

    /// Next instant strictly after `from` that matches every field.
    ///
    /// Scans minute by minute starting at `from` truncated to the minute plus
    /// one minute. Whole days and hours that cannot match are skipped, but the
    /// search never looks further than [`MAX_SCAN_MINUTES`] past its start.
    pub fn next_after(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>, CronError> {
        let start = truncate_to_minute(from) + Duration::minutes(1);
        let deadline = start + Duration::minutes(MAX_SCAN_MINUTES);

        let mut candidate = start;
        while candidate < deadline {
            if !self.matches_date(&candidate) {
                candidate = start_of_next_day(candidate);
                continue;
            }
            if !self.hour.matches(candidate.hour()) {
                candidate = start_of_next_hour(candidate);
                continue;
            }
            if self.minute.matches(candidate.minute()) {
                return Ok(candidate);
            }
            candidate += Duration::minutes(1);
        }

        Err(CronError::NoMatchFound {
            expression: self.source.clone(),
        })
    }
}

impl FromStr for CronExpression {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CronExpression::parse(s)
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// True when `expression` is a valid five-field cron expression. Never panics.
pub fn validate(expression: &str) -> bool {
    CronExpression::parse(expression).is_ok()
}

/// Parse `expression` and return its next run strictly after `from`.
pub fn next_run(expression: &str, from: DateTime<Utc>) -> Result<DateTime<Utc>, CronError> {
    CronExpression::parse(expression)?.next_after(from)
}

/// Parse `expression` and render it as prose.
pub fn describe(expression: &str) -> Result<String, CronError> {
    Ok(CronExpression::parse(expression)?.describe())
}

fn truncate_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t - Duration::seconds(i64::from(t.second())) - Duration::nanoseconds(i64::from(t.nanosecond()))
}

fn start_of_next_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t + Duration::minutes(60 - i64::from(t.minute()))
}

fn start_of_next_day(t: DateTime<Utc>) -> DateTime<Utc> {
    let minutes_into_day = i64::from(t.hour()) * 60 + i64::from(t.minute());
    t + Duration::minutes(24 * 60 - minutes_into_day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn validates_common_expressions() {
        assert!(validate("* * * * *"));
        assert!(validate("0 9 * * 1-5"));
        assert!(validate("*/15 * * * *"));
        assert!(validate("0 0 1 1 *"));
        assert!(validate("5,10,15-20,*/30 * * * *"));
        assert!(validate("0 8-18/2 * * *"));
        assert!(validate("  0   9  *  *  1-5  "));
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(!validate("60 * * * *"));
        assert!(!validate("a b c d e"));
        assert!(!validate("* * * *"));
        assert!(!validate("* * * * * *"));
        assert!(!validate(""));
        assert!(!validate("* 24 * * *"));
        assert!(!validate("* * 0 * *"));
        assert!(!validate("* * 32 * *"));
        assert!(!validate("* * * 13 *"));
        assert!(!validate("* * * * 7"));
        assert!(!validate("5-1 * * * *"));
        assert!(!validate("1,,2 * * * *"));
        assert!(!validate("+5 * * * *"));
        assert!(!validate("*/0 * * * *"));
        assert!(!validate("1-2-3 * * * *"));
    }

    #[test]
    fn one_bad_field_rejects_the_whole_expression() {
        let err = CronExpression::parse("0 9 * * 8").unwrap_err();
        match err {
            CronError::Invalid { reason, .. } => assert!(reason.contains("day-of-week")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn step_is_bounded_by_field_max_not_span() {
        // Lenient: a step larger than any useful span still validates as long
        // as it does not exceed the field maximum.
        assert!(validate("*/59 * * * *"));
        assert!(validate("0 */23 * * *"));
        assert!(validate("0 */20 * * *"));
        assert!(validate("0 0 */31 * *"));
        assert!(validate("0 0 * * */6"));
        assert!(!validate("*/60 * * * *"));
        assert!(!validate("0 */24 * * *"));
        assert!(!validate("0 */59 * * *"));
        assert!(!validate("0 0 * * */7"));
    }

    #[test]
    fn field_matching() {
        let f = CronField::parse("*/15", 0, 59).unwrap();
        assert!(f.matches(0) && f.matches(45));
        assert!(!f.matches(7));

        let f = CronField::parse("10-20/5", 0, 59).unwrap();
        assert!(f.matches(10) && f.matches(15) && f.matches(20));
        assert!(!f.matches(25) && !f.matches(5) && !f.matches(12));

        let f = CronField::parse("5/20", 0, 59).unwrap();
        assert!(f.matches(5) && f.matches(25) && f.matches(45));
        assert!(!f.matches(0));

        let f = CronField::parse("1,3,10-12", 0, 59).unwrap();
        assert!(f.matches(1) && f.matches(3) && f.matches(11));
        assert!(!f.matches(2));
    }

    #[test]
    fn weekday_expression_skips_weekend() {
        // 2026-01-09 is a Friday.
        let friday_10am = at(2026, 1, 9, 10, 0);
        let next = next_run("0 9 * * 1-5", friday_10am).unwrap();
        assert_eq!(next, at(2026, 1, 12, 9, 0));
    }

    #[test]
    fn quarter_hour_never_returns_reference_instant() {
        let expr = CronExpression::parse("*/15 * * * *").unwrap();
        assert_eq!(expr.next_after(at(2026, 3, 2, 10, 7)).unwrap(), at(2026, 3, 2, 10, 15));
        assert_eq!(expr.next_after(at(2026, 3, 2, 10, 15)).unwrap(), at(2026, 3, 2, 10, 30));
    }

    #[test]
    fn seconds_are_truncated_before_advancing() {
        let from = Utc.with_ymd_and_hms(2026, 3, 2, 10, 14, 59).unwrap();
        assert_eq!(next_run("*/15 * * * *", from).unwrap(), at(2026, 3, 2, 10, 15));
        let from = Utc.with_ymd_and_hms(2026, 3, 2, 10, 15, 1).unwrap();
        assert_eq!(next_run("*/15 * * * *", from).unwrap(), at(2026, 3, 2, 10, 30));
    }

    #[test]
    fn every_minute_advances_by_one() {
        let from = at(2026, 12, 31, 23, 59);
        assert_eq!(next_run("* * * * *", from).unwrap(), at(2027, 1, 1, 0, 0));
    }

    #[test]
    fn next_run_is_strictly_increasing_and_matches() {
        let exprs = ["0 9 * * 1-5", "*/7 * * * *", "30 2 1,15 * *", "0 0 * 2 0", "15 10-14/2 * * *"];
        let mut from = at(2026, 1, 30, 23, 58);
        for e in exprs {
            let expr = CronExpression::parse(e).unwrap();
            let first = expr.next_after(from).unwrap();
            let second = expr.next_after(first).unwrap();
            assert!(first > from, "{e}");
            assert!(second > first, "{e}");
            assert!(expr.matches(&first) && expr.matches(&second), "{e}");
            from = first;
        }
    }

    #[test]
    fn day_fields_are_combined_with_and() {
        // The 13th that is also a Friday: 2026-02-13.
        let next = next_run("0 0 13 * 5", at(2026, 1, 1, 0, 0)).unwrap();
        assert_eq!(next, at(2026, 2, 13, 0, 0));
    }

    #[test]
    fn impossible_date_reports_no_match() {
        let err = next_run("0 0 30 2 *", at(2026, 1, 1, 0, 0)).unwrap_err();
        assert_eq!(
            err,
            CronError::NoMatchFound {
                expression: "0 0 30 2 *".to_string()
            }
        );
    }

    #[test]
    fn leap_day_outside_one_year_window_is_not_found() {
        // Next Feb 29 after March 2026 is in 2028: beyond the scan bound.
        assert!(next_run("0 0 29 2 *", at(2026, 3, 1, 0, 0)).is_err());
        // Within a year of a leap day it is found.
        assert_eq!(next_run("0 0 29 2 *", at(2027, 6, 1, 0, 0)).unwrap(), at(2028, 2, 29, 0, 0));
    }

    #[test]
    fn invalid_expression_fails_next_run() {
        assert!(matches!(
            next_run("61 * * * *", at(2026, 1, 1, 0, 0)),
            Err(CronError::Invalid { .. })
        ));
    }

    #[test]
    fn from_str_and_display_keep_source() {
        let expr: CronExpression = "0 9 * * 1-5".parse().unwrap();
        assert_eq!(expr.to_string(), "0 9 * * 1-5");
        assert_eq!(expr.as_str(), "0 9 * * 1-5");
    }
}
