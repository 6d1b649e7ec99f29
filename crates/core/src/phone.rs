//! E.164 phone normalization.
//!
//! The provider reports sender numbers as bare international digits
//! (`919800000001`) while stored identities carry a leading `+`. Both are
//! normalized to `+<digits>` before any comparison.

/// Minimum number of digits accepted after the `+`.
pub const MIN_E164_DIGITS: usize = 8;

/// Maximum number of digits allowed by E.164.
pub const MAX_E164_DIGITS: usize = 15;

/// Normalize a phone number to E.164, or `None` if it cannot be one.
///
/// Spaces, dashes, dots and parentheses are stripped. A leading `00`
/// international prefix is treated like `+`. Numbers without either prefix
/// are assumed to already include their country code.
pub fn normalize_e164(raw: &str) -> Option<String> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let digits = if let Some(rest) = compact.strip_prefix('+') {
        rest
    } else if let Some(rest) = compact.strip_prefix("00") {
        rest
    } else {
        compact.as_str()
    };

    if digits.len() < MIN_E164_DIGITS || digits.len() > MAX_E164_DIGITS {
        return None;
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) || digits.starts_with('0') {
        return None;
    }

    Some(format!("+{digits}"))
}
