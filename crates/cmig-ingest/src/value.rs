//! Scalar parsing for legacy export values.
//!
//! The exports come out of a spreadsheet round-trip: numeric ids carry
//! decimal tails, absent values appear as `nan`, and impossible sentinel
//! dates stand in for "unknown". Everything here recovers locally; a bad
//! value becomes a normalized unknown, never an error for the caller.

use chrono::NaiveDate;
use tracing::warn;

/// Markers the legacy export uses for an absent value.
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == "nan"
}

/// Sentinel strings that mean "date unknown" rather than "date invalid".
pub fn is_unknown_date(value: &str) -> bool {
    matches!(
        value.trim(),
        "" | "nan" | "0000-00-00" | "0000-11-30" | "False" | "None"
    )
}

/// Canonicalize a legacy id: empty → `None`; numeric-looking (decimal
/// comma tolerated) → bare integer string; anything else passes through
/// trimmed.
pub fn clean_legacy_id(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace(',', ".");
    if let Ok(parsed) = normalized.parse::<f64>()
        && parsed.is_finite()
    {
        return Some(format!("{}", parsed as i64));
    }
    Some(trimmed.to_string())
}

/// Strict `YYYY-MM-DD` parse. Unknown-markers yield `None` silently;
/// anything else that fails to parse yields `None` with a warning.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if is_unknown_date(trimmed) {
        return None;
    }
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(value = trimmed, "unreadable legacy date");
            None
        }
    }
}

/// Parse a monetary or quantity value, tolerating a decimal comma.
/// Unparseable input defaults to 0.0.
pub fn parse_amount(value: &str) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.replace(',', ".").parse::<f64>().unwrap_or(0.0)
}

/// Legacy boolean flags ("uitbetaald", "verkocht", ...).
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "ja" | "yes" | "true" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_ids_are_canonicalized() {
        assert_eq!(clean_legacy_id(""), None);
        assert_eq!(clean_legacy_id("  "), None);
        assert_eq!(clean_legacy_id("123"), Some("123".to_string()));
        assert_eq!(clean_legacy_id("123,0"), Some("123".to_string()));
        assert_eq!(clean_legacy_id("123.0"), Some("123".to_string()));
        assert_eq!(clean_legacy_id(" AB-12 "), Some("AB-12".to_string()));
    }

    #[test]
    fn sentinel_dates_are_unknown_not_errors() {
        assert_eq!(parse_date("0000-00-00"), None);
        assert_eq!(parse_date("0000-11-30"), None);
        assert_eq!(parse_date("nan"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn invalid_dates_warn_and_yield_unknown() {
        assert_eq!(parse_date("2022-13-40"), None);
        assert_eq!(parse_date("05/01/2022"), None);
    }

    #[test]
    fn valid_date_parses() {
        assert_eq!(
            parse_date("2022-01-05"),
            NaiveDate::from_ymd_opt(2022, 1, 5)
        );
    }

    #[test]
    fn amounts_tolerate_decimal_comma() {
        assert_eq!(parse_amount("12,50"), 12.5);
        assert_eq!(parse_amount("12.50"), 12.5);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
    }

    #[test]
    fn flags_accept_legacy_spellings() {
        assert!(parse_flag("ja"));
        assert!(parse_flag("Ja "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("nee"));
        assert!(!parse_flag(""));
    }
}
