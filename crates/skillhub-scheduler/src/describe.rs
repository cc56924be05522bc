//! Human-readable rendering of cron expressions for the dashboard.
//!
//! Best effort only; nothing in scheduling depends on this text.

use crate::cron::{CronExpression, CronField, StepBase};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

impl CronExpression {
    /// Render the expression as prose, e.g. `"At 09:00, on Monday-Friday"`.
    ///
    /// Always returns a non-empty string.
    pub fn describe(&self) -> String {
        let mut out = time_phrase(&self.minute, &self.hour);

        if !self.day_of_month.is_any() {
            out.push_str(&format!(
                ", on day {} of the month",
                field_phrase(&self.day_of_month, &number)
            ));
        }
        if !self.month.is_any() {
            out.push_str(&format!(", in {}", field_phrase(&self.month, &month_name)));
        }
        if !self.day_of_week.is_any() {
            out.push_str(&format!(", on {}", field_phrase(&self.day_of_week, &weekday_name)));
        }

        out
    }
}

fn time_phrase(minute: &CronField, hour: &CronField) -> String {
    match (minute, hour) {
        (CronField::Value(m), CronField::Value(h)) => format!("At {h:02}:{m:02}"),
        (CronField::Any, CronField::Any) => "Every minute".to_string(),
        (CronField::Value(0), CronField::Any) => "Every hour".to_string(),
        (CronField::Value(m), CronField::Any) => format!("At minute {m} of every hour"),
        (
            CronField::Step {
                base: StepBase::Any,
                step,
            },
            CronField::Any,
        ) => {
            if *step == 1 {
                "Every minute".to_string()
            } else {
                format!("Every {step} minutes")
            }
        }
        (CronField::Any, h) => format!("Every minute during hour {}", field_phrase(h, &number)),
        (CronField::Value(m), h) => format!("At minute {m} past hour {}", field_phrase(h, &number)),
        (m, CronField::Any) => format!("At minute {} of every hour", field_phrase(m, &number)),
        (m, h) => format!(
            "At minute {} past hour {}",
            field_phrase(m, &number),
            field_phrase(h, &number)
        ),
    }
}

fn field_phrase(field: &CronField, name: &dyn Fn(u32) -> String) -> String {
    match field {
        CronField::Any => "every".to_string(),
        CronField::Value(v) => name(*v),
        CronField::Range(a, b) => format!("{}-{}", name(*a), name(*b)),
        CronField::Step { base, step } => match *base {
            StepBase::Any => format!("every {step}"),
            StepBase::From(a) => format!("every {step} from {}", name(a)),
            StepBase::Range(a, b) => format!("every {step} from {} to {}", name(a), name(b)),
        },
        CronField::List(items) => items
            .iter()
            .map(|f| field_phrase(f, name))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn number(v: u32) -> String {
    v.to_string()
}

fn month_name(v: u32) -> String {
    v.checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
        .map(|s| s.to_string())
        .unwrap_or_else(|| v.to_string())
}

fn weekday_name(v: u32) -> String {
    WEEKDAYS
        .get(v as usize)
        .map(|s| s.to_string())
        .unwrap_or_else(|| v.to_string())
}
