//! Loan application wizard.
//!
//! Three linear steps (`type`, `details`, `documents`) with back/next only.
//! Payloads are checked for shape, not content.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use branchline_core::DocumentKind;

use super::FlowError;
use super::eligibility::{self, Eligibility};
use crate::models::document::DocumentState;
use crate::models::loan::{
    Employment, LoanApplication, LoanDetails, LoanStep, LoanType, LoanTypeSelection, UploadSlot,
};
use crate::models::session::SessionUser;

/// Where the browser goes once an application is submitted.
pub const SUBMIT_REDIRECT: &str = "/dashboard/chat?approved";

/// Record the current step's payload and move forward one step.
///
/// # Errors
///
/// Returns `FlowError::InvalidPayload` if the payload does not fit the step,
/// or `FlowError::NoNextStep` at the last step.
pub fn advance(application: &mut LoanApplication, payload: Value) -> Result<(), FlowError> {
    match application.step {
        LoanStep::Type => {
            let selection: LoanTypeSelection = parse_step("type", payload)?;
            application.loan_type = Some(selection.loan_type);
        }
        LoanStep::Details => {
            let details: LoanDetails = parse_step("details", payload)?;
            application.details = Some(details);
        }
        LoanStep::Documents => return Err(FlowError::NoNextStep),
    }

    if let Some(next) = application.step.next() {
        application.step = next;
    }
    Ok(())
}

/// Move back one step. Nothing happens at the first step.
pub fn back(application: &mut LoanApplication) {
    if let Some(previous) = application.step.previous() {
        application.step = previous;
    }
}

/// Acknowledge a supporting document upload.
///
/// # Errors
///
/// Returns `FlowError::NotAtDocumentsStep` before the documents step.
pub fn record_upload(application: &mut LoanApplication, slot: UploadSlot) -> Result<(), FlowError> {
    if application.step != LoanStep::Documents {
        return Err(FlowError::NotAtDocumentsStep);
    }
    application.documents.mark(slot);
    Ok(())
}

fn parse_step<T: DeserializeOwned>(step: &'static str, payload: Value) -> Result<T, FlowError> {
    serde_json::from_value(payload).map_err(|e| FlowError::InvalidPayload {
        step,
        reason: e.to_string(),
    })
}

// =============================================================================
// Application Form
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalDetails {
    pub full_name: Option<String>,
    pub father_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub pan_number: Option<String>,
    pub aadhaar_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDetails {
    pub address: Option<String>,
    pub email: String,
    pub mobile_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanSummary {
    pub loan_type: Option<LoanType>,
    pub loan_amount: Option<Decimal>,
    pub tenure_months: Option<u32>,
    pub monthly_income: Option<Decimal>,
    pub employment: Option<Employment>,
    pub purpose: Option<String>,
}

/// Generated loan application form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationForm {
    pub application_date: DateTime<Utc>,
    pub personal_details: PersonalDetails,
    pub contact_details: ContactDetails,
    pub loan_details: LoanSummary,
    pub eligibility_status: Eligibility,
}

/// Build the application form from the wizard and the user's documents.
///
/// # Errors
///
/// Returns `FlowError::NotAtDocumentsStep` before the documents step.
pub fn submit(
    application: &LoanApplication,
    documents: &DocumentState,
    user: &SessionUser,
    now: DateTime<Utc>,
) -> Result<ApplicationForm, FlowError> {
    if application.step != LoanStep::Documents {
        return Err(FlowError::NotAtDocumentsStep);
    }

    let pan = documents.document(DocumentKind::Pan);
    let aadhaar = documents.document(DocumentKind::Aadhaar);
    let today: NaiveDate = now.date_naive();
    let eligibility_status = eligibility::assess(pan, aadhaar, today);

    let from_pan = |key: &str| pan.and_then(|d| d.field(key)).map(String::from);
    let from_aadhaar = |key: &str| aadhaar.and_then(|d| d.field(key)).map(String::from);
    let details = application.details.as_ref();

    let form = ApplicationForm {
        application_date: now,
        personal_details: PersonalDetails {
            full_name: from_pan("full_name").or_else(|| Some(user.name.clone())),
            father_name: from_pan("father_name"),
            date_of_birth: from_pan("date_of_birth"),
            gender: from_aadhaar("gender"),
            pan_number: from_pan("pan_number"),
            aadhaar_number: from_aadhaar("aadhaar_number"),
        },
        contact_details: ContactDetails {
            address: from_aadhaar("address"),
            email: user.email.to_string(),
            mobile_number: None,
        },
        loan_details: LoanSummary {
            loan_type: application.loan_type,
            loan_amount: details.map(|d| d.amount),
            tenure_months: details.map(|d| d.tenure),
            monthly_income: details.map(|d| d.income),
            employment: details.map(|d| d.employment),
            purpose: details.map(|d| d.purpose.clone()).filter(|p| !p.is_empty()),
        },
        eligibility_status,
    };

    tracing::info!(
        user_id = %user.id,
        eligible = form.eligibility_status.eligible,
        "loan application submitted"
    );
    Ok(form)
}
