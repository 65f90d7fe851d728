//! Prompts for prescription extraction.
//!
//! The instruction is one string. The record schema it documents must stay in
//! step with `rx_extract_core::PrescriptionRecord`.

/// Example object embedded in the instruction to pin down the output shape.
pub const SCHEMA_EXAMPLE: &str = r#"{
    "patient_name": "John Doe",
    "patient_age": null,
    "date": "DD-MM-YYYY",
    "doctor_name": "Dr. Jane Smith",
    "doctor_license": "12345",
    "medications": [
        {
            "drug_name": "Amoxicillin",
            "dosage": "500 mg",
            "frequency": "Twice daily",
            "duration": "7 days",
            "notes": "Take after meals"
        }
    ],
    "refills": "1",
    "allergies": "Penicillin",
    "patient_dob": "1990-05-10",
    "patient_weight": "70 kg"
}"#;

/// System instruction sent with every extraction request.
pub const SYSTEM_INSTRUCTION: &str = r#"You are assisting a pharmacy in extracting structured information from handwritten or printed prescriptions.
Analyze the provided image and accurately extract key details, including the patient's full name, age, and the date of the prescription.
Identify the prescribing doctor's name and license number if available.
Extract all medication details, including the drug name, dosage (such as 500mg or 10ml), frequency (such as once daily or twice a day), and duration (such as 7 days or 2 weeks).
Additionally, capture any relevant notes, such as special instructions like 'Take after meals', refill status if mentioned, and any allergy warnings.
Ensure the extracted details are presented in a structured JSON format, focusing only on relevant prescription information while ignoring unrelated text.
Maintain accuracy in parsing the text, preserving medical terminology, and ensuring the structured data is complete and reliable for pharmacy use.
If something is not defined, leave that field blank, don't make assumptions.
Write the prescription date as DD-MM-YYYY and the date of birth as YYYY-MM-DD.
List medications in the order they appear on the prescription.

The JSON format should be:
"#;

/// User turn that accompanies the image.
pub const USER_PROMPT: &str =
    "Extract structured details from this prescription and return only JSON";

/// Closing line appended after the schema example.
const RETURN_ONLY: &str = "\n\nReturn **only** this JSON object.";

/// Build the complete system instruction, schema example included.
pub fn build_system_instruction() -> String {
    let mut instruction =
        String::with_capacity(SYSTEM_INSTRUCTION.len() + SCHEMA_EXAMPLE.len() + RETURN_ONLY.len());
    instruction.push_str(SYSTEM_INSTRUCTION);
    instruction.push_str(SCHEMA_EXAMPLE);
    instruction.push_str(RETURN_ONLY);
    instruction
}
