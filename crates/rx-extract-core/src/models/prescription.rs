//! Prescription record models.
//!
//! Field names mirror the JSON schema the generation service is asked to fill,
//! so a record serializes back into the same shape it was decoded from.
//!
//! Decoding is lenient about scalar types (a license number sent as `12345`
//! becomes `"12345"`) but never invents values. Strings decode exactly as
//! written, so a serialized record parses back unchanged; trimming and
//! blank-to-`None` happen in [`PrescriptionRecord::tidy`], which the
//! normalizer runs on service output.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One medication line on a prescription.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MedicationEntry {
    /// Drug name as written (brand or generic)
    #[serde(deserialize_with = "de_text")]
    pub drug_name: Option<String>,
    /// Strength, e.g. "500 mg" or "10 ml"
    #[serde(deserialize_with = "de_text")]
    pub dosage: Option<String>,
    /// e.g. "Twice daily"
    #[serde(deserialize_with = "de_text")]
    pub frequency: Option<String>,
    /// e.g. "7 days"
    #[serde(deserialize_with = "de_text")]
    pub duration: Option<String>,
    /// Special instructions, e.g. "Take after meals"
    #[serde(deserialize_with = "de_text")]
    pub notes: Option<String>,
}

/// Structured fields extracted from one prescription image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PrescriptionRecord {
    #[serde(deserialize_with = "de_text")]
    pub patient_name: Option<String>,
    /// Age in whole years. Derived from `patient_dob` and `date` when both parse.
    #[serde(deserialize_with = "de_age")]
    pub patient_age: Option<u32>,
    /// Issue date, DD-MM-YYYY
    #[serde(deserialize_with = "de_text")]
    pub date: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub doctor_name: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub doctor_license: Option<String>,
    /// Medications in the order they appear on the prescription
    #[serde(deserialize_with = "de_medications")]
    pub medications: Vec<MedicationEntry>,
    /// Free-form refill status, not necessarily numeric
    #[serde(deserialize_with = "de_text")]
    pub refills: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub allergies: Option<String>,
    /// Date of birth, YYYY-MM-DD
    #[serde(deserialize_with = "de_text")]
    pub patient_dob: Option<String>,
    /// Weight with its unit, e.g. "70 kg"
    #[serde(deserialize_with = "de_text")]
    pub patient_weight: Option<String>,
}

impl MedicationEntry {
    /// Trim every field and turn blank ones into `None`.
    pub fn tidy(&mut self) {
        for field in [
            &mut self.drug_name,
            &mut self.dosage,
            &mut self.frequency,
            &mut self.duration,
            &mut self.notes,
        ] {
            tidy_text(field);
        }
    }
}

impl PrescriptionRecord {
    /// Top-level keys of the wire schema, in schema order.
    pub const FIELD_NAMES: [&'static str; 10] = [
        "patient_name",
        "patient_age",
        "date",
        "doctor_name",
        "doctor_license",
        "medications",
        "refills",
        "allergies",
        "patient_dob",
        "patient_weight",
    ];

    /// Trim text fields and turn blank ones into `None`, medications included.
    pub fn tidy(&mut self) {
        for field in [
            &mut self.patient_name,
            &mut self.date,
            &mut self.doctor_name,
            &mut self.doctor_license,
            &mut self.refills,
            &mut self.allergies,
            &mut self.patient_dob,
            &mut self.patient_weight,
        ] {
            tidy_text(field);
        }
        self.medications.iter_mut().for_each(MedicationEntry::tidy);
    }

    /// Number of medication entries.
    pub fn medication_count(&self) -> usize {
        self.medications.len()
    }

    /// Top-level fields the service left blank. An empty medication list counts as blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.patient_name.is_some(),
            self.patient_age.is_some(),
            self.date.is_some(),
            self.doctor_name.is_some(),
            self.doctor_license.is_some(),
            !self.medications.is_empty(),
            self.refills.is_some(),
            self.allergies.is_some(),
            self.patient_dob.is_some(),
            self.patient_weight.is_some(),
        ];

        Self::FIELD_NAMES
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect()
    }
}

fn de_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) => text_from_value(&value).map_err(serde::de::Error::custom),
    }
}

fn de_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) => age_from_value(&value).map_err(serde::de::Error::custom),
    }
}

fn de_medications<'de, D>(deserializer: D) -> Result<Vec<MedicationEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<MedicationEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Convert a scalar JSON value to text. Lists of scalars are joined with ", ".
fn text_from_value(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                if item.is_array() || item.is_object() {
                    return Err("expected a list of strings, found a nested value".into());
                }
                if let Some(part) = text_from_value(item)?.as_deref().and_then(non_blank) {
                    parts.push(part);
                }
            }
            Ok(if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            })
        }
        Value::Object(_) => Err("expected a string, found an object".into()),
    }
}

/// Service-supplied ages are kept only when they are plain whole numbers.
///
/// Other scalars decode to `None`. Lists and objects are rejected, as they are
/// for text fields.
fn age_from_value(value: &Value) -> Result<Option<u32>, String> {
    match value {
        Value::Number(n) => Ok(n.as_u64().and_then(|n| u32::try_from(n).ok())),
        Value::String(s) => Ok(s.trim().parse().ok()),
        Value::Null | Value::Bool(_) => Ok(None),
        Value::Array(_) => Err("expected an age, found a list".into()),
        Value::Object(_) => Err("expected an age, found an object".into()),
    }
}

fn tidy_text(field: &mut Option<String>) {
    *field = field.as_deref().and_then(non_blank);
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_decode_as_null() {
        let record: PrescriptionRecord = serde_json::from_str(r#"{"patient_name":"A"}"#).unwrap();
        assert_eq!(record.patient_name, Some("A".to_string()));
        assert_eq!(record.patient_age, None);
        assert!(record.medications.is_empty());
        assert_eq!(record.missing_fields().len(), 9);
    }

    #[test]
    fn test_strings_decode_verbatim() {
        let record: PrescriptionRecord =
            serde_json::from_str(r#"{"patient_name":" Jane ","refills":"","allergies":null}"#).unwrap();
        assert_eq!(record.patient_name, Some(" Jane ".to_string()));
        assert_eq!(record.refills, Some(String::new()));
        assert_eq!(record.allergies, None);
    }

    #[test]
    fn test_tidy_trims_and_drops_blanks() {
        let mut record: PrescriptionRecord = serde_json::from_str(
            r#"{"patient_name":" Jane ","doctor_name":"","refills":"   ",
                "medications":[{"drug_name":" Amoxicillin\n","notes":"  "}]}"#,
        )
        .unwrap();
        record.tidy();

        assert_eq!(record.patient_name, Some("Jane".to_string()));
        assert_eq!(record.doctor_name, None);
        assert_eq!(record.refills, None);
        assert_eq!(record.medications[0].drug_name, Some("Amoxicillin".to_string()));
        assert_eq!(record.medications[0].notes, None);
    }

    #[test]
    fn test_padded_record_round_trips() {
        let record = PrescriptionRecord {
            patient_name: Some(" Jane ".into()),
            refills: Some(String::new()),
            medications: vec![MedicationEntry {
                notes: Some("  ".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: PrescriptionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_numbers_become_text() {
        let record: PrescriptionRecord =
            serde_json::from_str(r#"{"doctor_license":12345,"refills":1}"#).unwrap();
        assert_eq!(record.doctor_license, Some("12345".to_string()));
        assert_eq!(record.refills, Some("1".to_string()));
    }

    #[test]
    fn test_allergy_list_is_joined() {
        let record: PrescriptionRecord =
            serde_json::from_str(r#"{"allergies":["Penicillin","", "Sulfa"]}"#).unwrap();
        assert_eq!(record.allergies, Some("Penicillin, Sulfa".to_string()));
    }

    #[test]
    fn test_object_in_text_field_is_rejected() {
        let result: Result<PrescriptionRecord, _> =
            serde_json::from_str(r#"{"patient_name":{"first":"A"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_service_age_forms() {
        let cases = [
            (r#"{"patient_age":42}"#, Some(42)),
            (r#"{"patient_age":"42"}"#, Some(42)),
            (r#"{"patient_age":"42 years"}"#, None),
            (r#"{"patient_age":-3}"#, None),
            (r#"{"patient_age":null}"#, None),
            (r#"{"patient_age":true}"#, None),
        ];
        for (json, expected) in cases {
            let record: PrescriptionRecord = serde_json::from_str(json).unwrap();
            assert_eq!(record.patient_age, expected, "input: {json}");
        }
    }

    #[test]
    fn test_structured_age_is_rejected() {
        assert!(serde_json::from_str::<PrescriptionRecord>(r#"{"patient_age":[42]}"#).is_err());
        assert!(serde_json::from_str::<PrescriptionRecord>(r#"{"patient_age":{"years":42}}"#).is_err());
    }

    #[test]
    fn test_null_medications_is_empty_list() {
        let record: PrescriptionRecord = serde_json::from_str(r#"{"medications":null}"#).unwrap();
        assert_eq!(record.medication_count(), 0);
    }

    #[test]
    fn test_medications_must_be_a_list_of_objects() {
        assert!(serde_json::from_str::<PrescriptionRecord>(r#"{"medications":"Amoxicillin"}"#).is_err());
        assert!(serde_json::from_str::<PrescriptionRecord>(r#"{"medications":["Amoxicillin"]}"#).is_err());
    }

    #[test]
    fn test_serializes_absent_fields_as_null() {
        let json = serde_json::to_value(PrescriptionRecord::default()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), PrescriptionRecord::FIELD_NAMES.len());
        assert!(object["patient_name"].is_null());
        assert!(object["patient_age"].is_null());
        assert_eq!(object["medications"], serde_json::json!([]));
    }

    #[test]
    fn test_missing_fields_reports_empty_medications() {
        let record = PrescriptionRecord {
            patient_name: Some("A".into()),
            patient_age: Some(30),
            date: Some("10-05-2020".into()),
            doctor_name: Some("Dr. B".into()),
            doctor_license: Some("1".into()),
            medications: vec![],
            refills: Some("0".into()),
            allergies: Some("None".into()),
            patient_dob: Some("1990-05-10".into()),
            patient_weight: Some("70 kg".into()),
        };
        assert_eq!(record.missing_fields(), vec!["medications"]);
    }
}
