//! Property tests: any record survives export and parse unchanged.

use proptest::collection::vec;
use proptest::option;
use proptest::prelude::*;
use rx_extract_core::{normalize_response, to_pretty_json, MedicationEntry, PrescriptionRecord};

/// Free text including blanks, padding, quotes and non-ASCII.
fn arb_text() -> impl Strategy<Value = Option<String>> {
    option::of(prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        "[ \\t]{0,2}[A-Za-z0-9 .,:/'\"\\\\-]{0,20}[ \\t\\n]{0,2}",
        "\\PC{0,12}",
    ])
}

fn arb_medication() -> impl Strategy<Value = MedicationEntry> {
    (arb_text(), arb_text(), arb_text(), arb_text(), arb_text()).prop_map(
        |(drug_name, dosage, frequency, duration, notes)| MedicationEntry {
            drug_name,
            dosage,
            frequency,
            duration,
            notes,
        },
    )
}

fn arb_record() -> impl Strategy<Value = PrescriptionRecord> {
    (
        (arb_text(), option::of(any::<u32>()), arb_text(), arb_text(), arb_text()),
        vec(arb_medication(), 0..4),
        (arb_text(), arb_text(), arb_text(), arb_text()),
    )
        .prop_map(
            |(
                (patient_name, patient_age, date, doctor_name, doctor_license),
                medications,
                (refills, allergies, patient_dob, patient_weight),
            )| PrescriptionRecord {
                patient_name,
                patient_age,
                date,
                doctor_name,
                doctor_license,
                medications,
                refills,
                allergies,
                patient_dob,
                patient_weight,
            },
        )
}

proptest! {
    #[test]
    fn exported_record_parses_back_unchanged(record in arb_record()) {
        let json = to_pretty_json(&record).unwrap();
        let parsed: PrescriptionRecord = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, record);
    }

    #[test]
    fn tidy_is_idempotent(record in arb_record()) {
        let mut once = record;
        once.tidy();
        let mut twice = once.clone();
        twice.tidy();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn normalized_record_round_trips(record in arb_record()) {
        let normalized = normalize_response(&to_pretty_json(&record).unwrap()).unwrap();
        let reparsed = normalize_response(&to_pretty_json(&normalized).unwrap()).unwrap();
        prop_assert_eq!(reparsed, normalized);
    }
}
