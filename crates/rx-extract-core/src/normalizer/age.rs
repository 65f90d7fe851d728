//! Age derivation from date of birth and prescription date.

use chrono::{Datelike, NaiveDate};

/// Date-of-birth format (YYYY-MM-DD).
pub const DOB_FORMAT: &str = "%Y-%m-%d";

/// Prescription issue date format (DD-MM-YYYY).
pub const PRESCRIPTION_DATE_FORMAT: &str = "%d-%m-%Y";

/// Parse a date of birth in YYYY-MM-DD form.
pub fn parse_dob(dob: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(dob, DOB_FORMAT).ok()
}

/// Parse a prescription date in DD-MM-YYYY form.
pub fn parse_prescription_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, PRESCRIPTION_DATE_FORMAT).ok()
}

/// Whole years between `dob` and `on`.
///
/// One year is subtracted when the birthday has not yet come round by `on`.
/// Returns `None` when `on` precedes `dob`.
pub fn age_on(dob: NaiveDate, on: NaiveDate) -> Option<u32> {
    let mut years = on.year() - dob.year();
    if (on.month(), on.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Derive age from the raw `patient_dob` and `date` strings.
///
/// Returns `None` if either string does not parse under its format.
pub fn derive_age(dob: &str, prescription_date: &str) -> Option<u32> {
    let dob = parse_dob(dob)?;
    let on = parse_prescription_date(prescription_date)?;
    age_on(dob, on)
}
