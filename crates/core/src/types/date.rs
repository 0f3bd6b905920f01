//! Dates of birth read off identity documents.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Formats seen on Aadhaar and PAN cards, tried in order.
const FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%Y/%m/%d"];

/// Error returned when no known format fits.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised date of birth: {0}")]
pub struct DateOfBirthError(pub String);

/// A calendar date of birth.
///
/// ```
/// use branchline_core::DateOfBirth;
///
/// let a = DateOfBirth::parse("07/03/1990").unwrap();
/// let b = DateOfBirth::parse("1990-03-07").unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateOfBirth(NaiveDate);

impl DateOfBirth {
    /// Parse a date in any of the document formats.
    ///
    /// # Errors
    ///
    /// Returns [`DateOfBirthError`] if none of the formats fit.
    pub fn parse(raw: &str) -> Result<Self, DateOfBirthError> {
        let trimmed = raw.trim();
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
            .map(Self)
            .ok_or_else(|| DateOfBirthError(trimmed.to_owned()))
    }

    /// Wrap an already-known date.
    #[must_use]
    pub const fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The underlying date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    /// Age in whole years on `today`.
    #[must_use]
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        let born = self.0;
        let mut age = today.year() - born.year();
        if (today.month(), today.day()) < (born.month(), born.day()) {
            age -= 1;
        }
        age
    }
}

impl fmt::Display for DateOfBirth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d/%m/%Y"))
    }
}

/// Compare two raw dates of birth.
///
/// When both sides parse, calendar dates are compared. Otherwise the
/// whitespace-collapsed, lowercased strings must be equal. A missing value on
/// either side never matches.
#[must_use]
pub fn dates_of_birth_match(a: Option<&str>, b: Option<&str>) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };

    match (DateOfBirth::parse(a), DateOfBirth::parse(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => {
            let a = normalise(a);
            !a.is_empty() && a == normalise(b)
        }
    }
}

fn normalise(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_all_formats() {
        let expected = DateOfBirth::from_date(date(1988, 11, 2));
        for raw in ["02/11/1988", "02-11-1988", "1988-11-02", "1988/11/02", " 02/11/1988 "] {
            assert_eq!(DateOfBirth::parse(raw).unwrap(), expected, "format {raw}");
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DateOfBirth::parse("sometime in 1988").is_err());
        assert!(DateOfBirth::parse("31/02/1988").is_err());
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let dob = DateOfBirth::from_date(date(2000, 6, 15));
        assert_eq!(dob.age_on(date(2021, 6, 14)), 20);
        assert_eq!(dob.age_on(date(2021, 6, 15)), 21);
    }

    #[test]
    fn test_dates_match_across_formats() {
        assert!(dates_of_birth_match(Some("15/06/2000"), Some("2000-06-15")));
        assert!(!dates_of_birth_match(Some("15/06/2000"), Some("16/06/2000")));
    }

    #[test]
    fn test_unparseable_dates_compare_as_text() {
        assert!(dates_of_birth_match(Some("Year of Birth 1990"), Some("year of  birth 1990")));
        assert!(!dates_of_birth_match(Some("1990"), Some("1991")));
    }

    #[test]
    fn test_missing_dates_never_match() {
        assert!(!dates_of_birth_match(None, Some("15/06/2000")));
        assert!(!dates_of_birth_match(Some("15/06/2000"), None));
        assert!(!dates_of_birth_match(Some("  "), Some("  ")));
    }

    #[test]
    fn test_display_uses_day_first() {
        let dob = DateOfBirth::from_date(date(1990, 3, 7));
        assert_eq!(dob.to_string(), "07/03/1990");
    }
}
