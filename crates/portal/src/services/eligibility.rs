//! Loan eligibility from an identity document pair.

use chrono::NaiveDate;
use serde::Serialize;

use branchline_core::{DateOfBirth, PersonName};

use crate::models::DocumentExtraction;

pub const MIN_AGE: i32 = 21;
pub const MAX_AGE: i32 = 60;

/// Eligibility verdict with the reasons behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub reasons: Vec<String>,
    pub missing_documents: Vec<String>,
}

/// Assess a PAN/Aadhaar pair on `today`.
///
/// Missing documents end the assessment early. Otherwise both names must
/// match and the PAN date of birth must put the applicant between
/// [`MIN_AGE`] and [`MAX_AGE`]. An unreadable date of birth is noted but
/// does not make the applicant ineligible.
#[must_use]
pub fn assess(
    pan: Option<&DocumentExtraction>,
    aadhaar: Option<&DocumentExtraction>,
    today: NaiveDate,
) -> Eligibility {
    let mut result = Eligibility {
        eligible: true,
        reasons: Vec::new(),
        missing_documents: Vec::new(),
    };

    if pan.is_none() {
        result.missing_documents.push("PAN Card".to_string());
    }
    if aadhaar.is_none() {
        result.missing_documents.push("Aadhaar Card".to_string());
    }
    let (Some(pan), Some(aadhaar)) = (pan, aadhaar) else {
        result.eligible = false;
        result.reasons.push("Missing required documents".to_string());
        return result;
    };

    if let (Some(pan_name), Some(aadhaar_name)) = (pan.full_name(), aadhaar.full_name())
        && !PersonName::new(pan_name).matches(&PersonName::new(aadhaar_name))
    {
        result.eligible = false;
        result
            .reasons
            .push("Name mismatch between PAN and Aadhaar".to_string());
    }

    if let Some(raw) = pan.date_of_birth() {
        match DateOfBirth::parse(raw) {
            Ok(dob) => {
                let age = dob.age_on(today);
                if age < MIN_AGE {
                    result.eligible = false;
                    result.reasons.push(format!(
                        "Applicant age ({age}) is below minimum required age ({MIN_AGE})"
                    ));
                } else if age > MAX_AGE {
                    result.eligible = false;
                    result.reasons.push(format!(
                        "Applicant age ({age}) is above maximum allowed age ({MAX_AGE})"
                    ));
                }
            }
            Err(e) => result.reasons.push(format!("Could not verify age: {e}")),
        }
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use branchline_core::DocumentKind;

    use super::*;

    fn doc(kind: DocumentKind, name: &str, dob: &str) -> DocumentExtraction {
        DocumentExtraction {
            kind,
            fields: BTreeMap::from([
                ("full_name".to_string(), Some(name.to_string())),
                ("date_of_birth".to_string(), Some(dob.to_string())),
            ]),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn test_eligible_applicant() {
        let pan = doc(DocumentKind::Pan, "Asha Rao", "07/03/1990");
        let aadhaar = doc(DocumentKind::Aadhaar, "Asha Kumari Rao", "07/03/1990");
        let result = assess(Some(&pan), Some(&aadhaar), today());

        assert!(result.eligible);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_missing_documents() {
        let pan = doc(DocumentKind::Pan, "Asha Rao", "07/03/1990");
        let result = assess(Some(&pan), None, today());

        assert!(!result.eligible);
        assert_eq!(result.missing_documents, vec!["Aadhaar Card"]);
        assert_eq!(result.reasons, vec!["Missing required documents"]);

        let none = assess(None, None, today());
        assert_eq!(none.missing_documents, vec!["PAN Card", "Aadhaar Card"]);
    }

    #[test]
    fn test_name_mismatch() {
        let pan = doc(DocumentKind::Pan, "Asha Rao", "07/03/1990");
        let aadhaar = doc(DocumentKind::Aadhaar, "Ravi Kumar", "07/03/1990");
        let result = assess(Some(&pan), Some(&aadhaar), today());

        assert!(!result.eligible);
        assert_eq!(result.reasons, vec!["Name mismatch between PAN and Aadhaar"]);
    }

    #[test]
    fn test_age_bounds() {
        let aadhaar = doc(DocumentKind::Aadhaar, "Asha Rao", "");

        let young = doc(DocumentKind::Pan, "Asha Rao", "18/10/2005");
        let result = assess(Some(&young), Some(&aadhaar), today());
        assert!(!result.eligible);
        assert_eq!(
            result.reasons,
            vec!["Applicant age (20) is below minimum required age (21)"]
        );

        let old = doc(DocumentKind::Pan, "Asha Rao", "1965-10-16");
        let result = assess(Some(&old), Some(&aadhaar), today());
        assert!(!result.eligible);
        assert_eq!(
            result.reasons,
            vec!["Applicant age (61) is above maximum allowed age (60)"]
        );
    }

    #[test]
    fn test_unreadable_date_is_noted_but_eligible() {
        let pan = doc(DocumentKind::Pan, "Asha Rao", "March 1990");
        let aadhaar = doc(DocumentKind::Aadhaar, "Asha Rao", "07/03/1990");
        let result = assess(Some(&pan), Some(&aadhaar), today());

        assert!(result.eligible);
        assert_eq!(result.reasons.len(), 1);
        assert!(result.reasons[0].starts_with("Could not verify age"));
    }
}
