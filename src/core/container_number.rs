//! ISO 6346 container numbers.
//!
//! A container number is a three-letter owner code, a category letter
//! (`U`, `J` or `Z`), a six-digit serial and a check digit, e.g. `CSQU3054383`.

use crate::errors::{Error, Result};

/// Letter values skip multiples of 11.
const fn letter_value(letter: u8) -> Option<u32> {
    let value = match letter {
        b'A' => 10,
        b'B'..=b'K' => (letter - b'B') as u32 + 12,
        b'L'..=b'U' => (letter - b'L') as u32 + 23,
        b'V'..=b'Z' => (letter - b'V') as u32 + 34,
        _ => return None,
    };
    Some(value)
}

/// Upper-cases and strips spaces and hyphens, so `csqu 305438-3` becomes
/// `CSQU3054383`.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Computes the check digit for the first ten characters of a number.
///
/// Returns `None` if the prefix is not four letters followed by six digits.
#[must_use]
pub fn check_digit(prefix: &str) -> Option<u32> {
    let bytes = prefix.as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let mut sum = 0_u32;
    for (position, &byte) in bytes.iter().enumerate() {
        let value = if position < 4 {
            letter_value(byte)?
        } else if byte.is_ascii_digit() {
            u32::from(byte - b'0')
        } else {
            return None;
        };
        sum += value << position;
    }
    Some(sum % 11 % 10)
}

/// Validates a container number and returns its normalized form.
///
/// # Errors
/// Returns a validation error describing the first problem found.
pub fn validate(raw: &str) -> Result<String> {
    let number = normalize(raw);
    if number.len() != 11 || !number.is_ascii() {
        return Err(Error::validation(format!(
            "Container number must be 11 characters: {raw}"
        )));
    }
    if !matches!(number.as_bytes()[3], b'U' | b'J' | b'Z') {
        return Err(Error::validation(format!(
            "Container number category must be U, J or Z: {raw}"
        )));
    }
    let (prefix, last) = number.split_at(10);
    let expected = check_digit(prefix).ok_or_else(|| {
        Error::validation(format!(
            "Container number must be four letters and seven digits: {raw}"
        ))
    })?;
    let actual = last.parse::<u32>().map_err(|_| {
        Error::validation(format!("Container number check digit must be a digit: {raw}"))
    })?;
    if actual != expected {
        return Err(Error::validation(format!(
            "Container number {number} fails its check digit (expected {expected})"
        )));
    }
    Ok(number)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_check_digit() {
        assert_eq!(check_digit("CSQU305438"), Some(3));
        assert_eq!(check_digit("MSKU123456"), Some(5));
        assert_eq!(check_digit("CSQU30543"), None);
        assert_eq!(check_digit("CSQ1305438"), None);
    }

    #[test]
    fn test_validate_accepts_and_normalizes() {
        assert_eq!(validate("CSQU3054383").unwrap(), "CSQU3054383");
        assert_eq!(validate(" csqu 305438-3 ").unwrap(), "CSQU3054383");
        assert_eq!(validate("MSKU1234565").unwrap(), "MSKU1234565");
    }

    #[test]
    fn test_validate_rejects() {
        assert!(validate("CSQU3054384").is_err());
        assert!(validate("CSQX3054383").is_err());
        assert!(validate("CSQU305438").is_err());
        assert!(validate("").is_err());
        assert!(matches!(
            validate("ÄSQU3054383").unwrap_err(),
            Error::Validation { .. }
        ));
    }

    #[test]
    fn test_letter_values_skip_multiples_of_eleven() {
        assert_eq!(letter_value(b'A'), Some(10));
        assert_eq!(letter_value(b'B'), Some(12));
        assert_eq!(letter_value(b'K'), Some(21));
        assert_eq!(letter_value(b'L'), Some(23));
        assert_eq!(letter_value(b'U'), Some(32));
        assert_eq!(letter_value(b'V'), Some(34));
        assert_eq!(letter_value(b'Z'), Some(38));
        assert_eq!(letter_value(b'1'), None);
    }
}
