//! Per-field format checks producing human-readable error strings. Empty
//! values never fail validation; whether a field is required is the caller's
//! concern.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateRule {
    Email,
    Date,
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

// Accepted date shapes: YYYY-MM-DD and YYYY/MM/DD, 1-2 digit month/day.
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})([-/])(\d{1,2})([-/])(\d{1,2})$").unwrap());

/// Checks one value against a rule, returning an error message on failure.
/// Pure, no side effects.
pub fn validate(value: &str, rule: ValidateRule) -> Option<String> {
    if value.trim().is_empty() {
        return None;
    }

    match rule {
        ValidateRule::Email => {
            if EMAIL_RE.is_match(value) {
                None
            } else {
                Some("invalid email format".to_string())
            }
        }
        ValidateRule::Date => {
            if is_valid_date(value) {
                None
            } else {
                Some("invalid date format (expected YYYY-MM-DD or YYYY/MM/DD)".to_string())
            }
        }
    }
}

fn is_valid_date(value: &str) -> bool {
    let Some(caps) = DATE_RE.captures(value.trim()) else {
        return false;
    };
    // Mixed separators (2024-01/02) are not a recognized shape.
    if caps[2] != caps[4] {
        return false;
    }
    let (Ok(year), Ok(month), Ok(day)) = (
        caps[1].parse::<i32>(),
        caps[3].parse::<u32>(),
        caps[5].parse::<u32>(),
    ) else {
        return false;
    };
    chrono::NaiveDate::from_ymd_opt(year, month, day).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_emails() {
        for email in ["a@x.com", "jon.smith+tag@sub.example.co", "A_B%c@ex.io"] {
            assert_eq!(validate(email, ValidateRule::Email), None, "{email}");
        }
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["not-an-email", "a@b", "@x.com", "a@x.", "a b@x.com"] {
            assert!(validate(email, ValidateRule::Email).is_some(), "{email}");
        }
    }

    #[test]
    fn accepts_canonical_date_shapes() {
        for date in ["2024-03-07", "2024/3/7", "1999-12-31", "2024/03/07"] {
            assert_eq!(validate(date, ValidateRule::Date), None, "{date}");
        }
    }

    #[test]
    fn rejects_other_date_shapes_and_impossible_dates() {
        for date in [
            "03/07/2024", // MM/DD/YYYY is not in the canonical set
            "2024-1/02",  // mixed separators
            "2023-02-30", // not a real calendar date
            "2024-13-01",
            "20240307",
            "yesterday",
        ] {
            assert!(validate(date, ValidateRule::Date).is_some(), "{date}");
        }
    }

    #[test]
    fn empty_values_never_fail() {
        assert_eq!(validate("", ValidateRule::Email), None);
        assert_eq!(validate("   ", ValidateRule::Email), None);
        assert_eq!(validate("", ValidateRule::Date), None);
    }
}
