//! Loan application wizard state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStep {
    #[default]
    Type,
    Details,
    Documents,
}

impl LoanStep {
    /// Progress indicator value in percent.
    #[must_use]
    pub const fn progress(self) -> u8 {
        match self {
            Self::Type => 25,
            Self::Details => 50,
            Self::Documents => 100,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Type => Some(Self::Details),
            Self::Details => Some(Self::Documents),
            Self::Documents => None,
        }
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Type => None,
            Self::Details => Some(Self::Type),
            Self::Documents => Some(Self::Details),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    Personal,
    Home,
    Business,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Employment {
    Salaried,
    #[serde(alias = "self-employed")]
    SelfEmployed,
    #[serde(alias = "business")]
    BusinessOwner,
}

/// Payload of the `type` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTypeSelection {
    pub loan_type: LoanType,
}

/// Payload of the `details` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDetails {
    /// Requested amount.
    pub amount: Decimal,
    /// Tenure in months.
    pub tenure: u32,
    /// Monthly income.
    pub income: Decimal,
    pub employment: Employment,
    #[serde(default)]
    pub purpose: String,
}

/// Supporting document slots in the `documents` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadSlot {
    Identity,
    Income,
    Address,
}

/// Which slots have been acknowledged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocuments {
    pub identity: bool,
    pub income: bool,
    pub address: bool,
}

impl UploadedDocuments {
    pub const fn mark(&mut self, slot: UploadSlot) {
        match slot {
            UploadSlot::Identity => self.identity = true,
            UploadSlot::Income => self.income = true,
            UploadSlot::Address => self.address = true,
        }
    }
}

/// A loan application in progress, stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub step: LoanStep,
    #[serde(default)]
    pub loan_type: Option<LoanType>,
    #[serde(default)]
    pub details: Option<LoanDetails>,
    #[serde(default)]
    pub documents: UploadedDocuments,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_values() {
        assert_eq!(LoanStep::Type.progress(), 25);
        assert_eq!(LoanStep::Details.progress(), 50);
        assert_eq!(LoanStep::Documents.progress(), 100);
    }

    #[test]
    fn test_step_order() {
        assert_eq!(LoanStep::Type.next(), Some(LoanStep::Details));
        assert_eq!(LoanStep::Documents.next(), None);
        assert_eq!(LoanStep::Type.previous(), None);
        assert_eq!(LoanStep::Documents.previous(), Some(LoanStep::Details));
    }

    #[test]
    fn test_details_accept_string_or_number_amounts() {
        let details: LoanDetails = serde_json::from_str(
            r#"{"amount":"500000","tenure":36,"income":85000.5,"employment":"self-employed"}"#,
        )
        .unwrap_or_else(|e| panic!("details should parse: {e}"));
        assert_eq!(details.amount, Decimal::new(500_000, 0));
        assert_eq!(details.employment, Employment::SelfEmployed);
        assert!(details.purpose.is_empty());
    }
}
