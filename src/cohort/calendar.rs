//! Calendar-offset arithmetic for label windows
//!
//! Month offsets move the month field and clamp the day to the last valid day
//! of the target month (2016-02-29 + 1y = 2017-02-28). Offsets are applied one
//! at a time, so `+5y then -6mo` can differ from a single `+54mo`.

use chrono::{Months, NaiveDate};

/// Years forward from the anchor to the label window centre
pub const LABEL_HORIZON_YEARS: i32 = 5;

/// Half-width of the label window in months
pub const LABEL_TOLERANCE_MONTHS: i32 = 6;

pub fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let magnitude = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

pub fn shift_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    shift_months(date, years.checked_mul(12)?)
}

/// Closed date interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// `[anchor + 5y − 6mo, anchor + 5y + 6mo]`
pub fn label_window(anchor: NaiveDate) -> Option<DateWindow> {
    let centre = shift_years(anchor, LABEL_HORIZON_YEARS)?;
    Some(DateWindow {
        start: shift_months(centre, -LABEL_TOLERANCE_MONTHS)?,
        end: shift_months(centre, LABEL_TOLERANCE_MONTHS)?,
    })
}

/// Start of a lookback span ending at `today` (`today − years`)
pub fn lookback_start(today: NaiveDate, years: i64) -> Option<NaiveDate> {
    let months = years.checked_mul(12).and_then(|m| i32::try_from(m).ok())?;
    shift_months(today, -months)
}
