//! Record normalizer: raw service text → [`PrescriptionRecord`].
//!
//! Steps:
//! 1. Locate the JSON payload (first `{` through last `}`)
//! 2. Parse it strictly, then decode it into the record shape
//! 3. Trim text fields; blank ones become `None`
//! 4. Derive `patient_age` from `patient_dob` and `date` when both parse
//!
//! The span search tolerates prose and code fences around the object. It does
//! not balance braces, so a stray `{` before the object or `}` after it widens
//! the span and the parse fails with [`NormalizeError::InvalidJson`].

mod age;

pub use age::*;

use serde_json::Value;
use thiserror::Error;

use crate::models::PrescriptionRecord;

/// Normalization errors. All are terminal for the request.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("No JSON object found in response")]
    NoJsonFound,

    #[error("Extracted text is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("JSON does not match the prescription schema: {0}")]
    SchemaViolation(serde_json::Error),
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Return the slice from the first `{` to the last `}`, inclusive.
pub fn locate_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse raw service text into a prescription record.
pub fn normalize_response(raw: &str) -> NormalizeResult<PrescriptionRecord> {
    let span = locate_json_span(raw).ok_or(NormalizeError::NoJsonFound)?;

    let value: Value = serde_json::from_str(span).map_err(NormalizeError::InvalidJson)?;
    let mut record: PrescriptionRecord =
        serde_json::from_value(value).map_err(NormalizeError::SchemaViolation)?;

    record.tidy();
    reconcile_age(&mut record);

    tracing::debug!(
        medications = record.medication_count(),
        missing = record.missing_fields().len(),
        "Normalized prescription record"
    );

    Ok(record)
}

/// Overwrite `patient_age` with the derived age when both dates parse.
///
/// Leaves the service-supplied age untouched otherwise.
pub fn reconcile_age(record: &mut PrescriptionRecord) {
    let (Some(dob), Some(date)) = (record.patient_dob.as_deref(), record.date.as_deref()) else {
        return;
    };

    match derive_age(dob, date) {
        Some(age) => record.patient_age = Some(age),
        None => tracing::warn!(
            supplied_age = record.patient_age.is_some(),
            "Could not derive age from patient_dob and date; keeping supplied value"
        ),
    }
}
