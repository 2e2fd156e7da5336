//! Tolerant date handling for model-extracted work history.
//!
//! Dates arrive as whatever the model transcribed from the resume —
//! `2020-01-01`, `March 2020`, `2020`, or garbage. Parsing never errors;
//! anything unrecognizable is `None` and contributes nothing to tenure.

use chrono::NaiveDate;

use crate::llm::schema::ExperienceEntry;

/// Average days per month, for fractional-month consistency across entries.
const DAYS_PER_MONTH: f64 = 30.44;

/// Parses a date string: exact `YYYY-MM-DD` first, then a small ladder of
/// common resume formats. Returns `None` for anything unparseable.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    for format in ["%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    // Month-year forms ("March 2020", "Mar 2020") resolve to the first of
    // the month.
    let with_day = format!("1 {}", trimmed);
    for format in ["%d %B %Y", "%d %b %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&with_day, format) {
            return Some(date);
        }
    }

    // "2020-03" resolves to the first of the month.
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d") {
        return Some(date);
    }

    // A bare year resolves to January 1st.
    if let Ok(year) = trimmed.parse::<i32>() {
        if (1000..=9999).contains(&year) {
            return NaiveDate::from_ymd_opt(year, 1, 1);
        }
    }

    None
}

/// Sums tenure across experience entries in fractional months and rounds to
/// whole years.
///
/// Per entry: `end` is `today` when the entry is current or has no parseable
/// end date; an unparseable start defaults to `today` (zero contribution);
/// entries whose end precedes their start contribute zero. Malformed input
/// can only shrink the estimate, never fail it.
pub fn years_of_experience(entries: &[ExperienceEntry], today: NaiveDate) -> i64 {
    let mut total_months = 0.0_f64;

    for entry in entries {
        let start = entry
            .start_date
            .as_deref()
            .and_then(parse_flexible_date)
            .unwrap_or(today);

        let end = if entry.is_current {
            today
        } else {
            entry
                .end_date
                .as_deref()
                .and_then(parse_flexible_date)
                .unwrap_or(today)
        };

        if end >= start {
            let days = (end - start).num_days() as f64;
            total_months += days / DAYS_PER_MONTH;
        }
    }

    (total_months / 12.0).round() as i64
}
