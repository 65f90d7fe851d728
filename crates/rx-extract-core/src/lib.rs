//! Rx-Extract Core Library
//!
//! Turns the raw text a multimodal model returns for a prescription photo into
//! a structured, validated [`PrescriptionRecord`].
//!
//! # Architecture
//!
//! ```text
//! Image → Generation service → raw text
//!                                  │
//!                    ┌─────────────▼─────────────┐
//!                    │     Record Normalizer     │
//!                    │  1. locate {...} span     │
//!                    │  2. strict JSON decode    │
//!                    │  3. trim, blanks → None   │
//!                    │  4. derive patient_age    │
//!                    └─────────────┬─────────────┘
//!                                  │
//!                   PrescriptionRecord | NormalizeError
//! ```
//!
//! # Core Principle
//!
//! **Blank over guessed.** A field the service left empty stays `None`; the
//! only value this crate ever computes is `patient_age`.
//!
//! # Modules
//!
//! - [`models`]: Domain types (PrescriptionRecord, MedicationEntry)
//! - [`normalizer`]: Response parsing and age derivation
//! - [`export`]: Indented JSON output

pub mod export;
pub mod models;
pub mod normalizer;

// Re-export commonly used types
pub use export::{to_pretty_json, write_record, ExportError, DEFAULT_OUTPUT_FILE};
pub use models::{MedicationEntry, PrescriptionRecord};
pub use normalizer::{derive_age, normalize_response, NormalizeError, NormalizeResult};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RxExtractError {
    #[error("No JSON found: {0}")]
    NoJsonFound(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<NormalizeError> for RxExtractError {
    fn from(e: NormalizeError) -> Self {
        match e {
            NormalizeError::NoJsonFound => RxExtractError::NoJsonFound(e.to_string()),
            NormalizeError::InvalidJson(_) => RxExtractError::InvalidJson(e.to_string()),
            NormalizeError::SchemaViolation(_) => RxExtractError::SchemaViolation(e.to_string()),
        }
    }
}

impl From<ExportError> for RxExtractError {
    fn from(e: ExportError) -> Self {
        RxExtractError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Functions (exported to FFI)
// =========================================================================

/// Normalize raw generation-service text into a prescription record.
#[uniffi::export]
pub fn parse_prescription_response(
    raw_text: String,
) -> Result<FfiPrescriptionRecord, RxExtractError> {
    let record = normalize_response(&raw_text)?;
    Ok(record.into())
}

/// Age in whole years from a YYYY-MM-DD birth date and a DD-MM-YYYY prescription date.
#[uniffi::export]
pub fn compute_patient_age(dob: String, prescription_date: String) -> Option<u32> {
    derive_age(&dob, &prescription_date)
}

/// Serialize a record as indented JSON.
#[uniffi::export]
pub fn prescription_to_json(record: FfiPrescriptionRecord) -> Result<String, RxExtractError> {
    Ok(to_pretty_json(&record.into())?)
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe medication entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicationEntry {
    pub drug_name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub notes: Option<String>,
}

impl From<MedicationEntry> for FfiMedicationEntry {
    fn from(entry: MedicationEntry) -> Self {
        Self {
            drug_name: entry.drug_name,
            dosage: entry.dosage,
            frequency: entry.frequency,
            duration: entry.duration,
            notes: entry.notes,
        }
    }
}

impl From<FfiMedicationEntry> for MedicationEntry {
    fn from(entry: FfiMedicationEntry) -> Self {
        MedicationEntry {
            drug_name: entry.drug_name,
            dosage: entry.dosage,
            frequency: entry.frequency,
            duration: entry.duration,
            notes: entry.notes,
        }
    }
}

/// FFI-safe prescription record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionRecord {
    pub patient_name: Option<String>,
    pub patient_age: Option<u32>,
    pub date: Option<String>,
    pub doctor_name: Option<String>,
    pub doctor_license: Option<String>,
    pub medications: Vec<FfiMedicationEntry>,
    pub refills: Option<String>,
    pub allergies: Option<String>,
    pub patient_dob: Option<String>,
    pub patient_weight: Option<String>,
}

impl From<PrescriptionRecord> for FfiPrescriptionRecord {
    fn from(record: PrescriptionRecord) -> Self {
        Self {
            patient_name: record.patient_name,
            patient_age: record.patient_age,
            date: record.date,
            doctor_name: record.doctor_name,
            doctor_license: record.doctor_license,
            medications: record.medications.into_iter().map(|m| m.into()).collect(),
            refills: record.refills,
            allergies: record.allergies,
            patient_dob: record.patient_dob,
            patient_weight: record.patient_weight,
        }
    }
}

impl From<FfiPrescriptionRecord> for PrescriptionRecord {
    fn from(record: FfiPrescriptionRecord) -> Self {
        PrescriptionRecord {
            patient_name: record.patient_name,
            patient_age: record.patient_age,
            date: record.date,
            doctor_name: record.doctor_name,
            doctor_license: record.doctor_license,
            medications: record.medications.into_iter().map(|m| m.into()).collect(),
            refills: record.refills,
            allergies: record.allergies,
            patient_dob: record.patient_dob,
            patient_weight: record.patient_weight,
        }
    }
}
