use chrono::{NaiveDate, NaiveDateTime};

use crate::models::RawCell;

// Two-digit years first: `%Y` would read "25" as year 25.
const DAY_FIRST_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];
const ISO_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

// Serial of 9999-12-31, the last date Excel can hold.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..MAX_EXCEL_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::try_days(serial.trunc() as i64)?)
}

/// Parse a date written day-first (`31/01/2025`), ISO, or with a time suffix.
pub fn parse_date_dmy(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DAY_FIRST_FORMATS.iter().chain(ISO_FORMATS) {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// Calendar date of a raw cell; numbers are Excel serials.
pub fn cell_date(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Date(d) => Some(*d),
        RawCell::Number(n) => excel_serial_to_date(*n),
        RawCell::Text(s) => parse_date_dmy(s),
        RawCell::Empty => None,
    }
}
