//! Object code (label) normalization.
//!
//! Postal object codes look like `SS123456785BR`: a two-letter service prefix,
//! an 8-digit serial, a mod-11 check digit and a two-letter country suffix.
//! The service expects codes with the check digit present.

use crate::error::TrackingError;

const WEIGHTS: [u32; 8] = [8, 6, 4, 2, 3, 5, 9, 7];

/// Compute the check digit for an 8-digit serial
pub fn check_digit(serial: &str) -> Option<u8> {
    if serial.len() != 8 || !serial.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let sum: u32 = serial
        .bytes()
        .zip(WEIGHTS)
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();

    let digit = match sum % 11 {
        0 => 5,
        1 => 0,
        r => 11 - r,
    };
    Some(digit as u8)
}

/// Return `code` in its 13-character check-digit form.
///
/// Accepts either the 12-character form (digit is inserted) or the 13-character
/// form (digit is verified).
pub fn with_check_digit(code: &str) -> Result<String, TrackingError> {
    let code = code.trim().to_ascii_uppercase();
    let invalid = || TrackingError::validation(format!("invalid object code '{}'", code));

    if !code.is_ascii() || (code.len() != 12 && code.len() != 13) {
        return Err(invalid());
    }

    let prefix = &code[..2];
    let serial = &code[2..10];
    let suffix = &code[code.len() - 2..];
    if !prefix.bytes().all(|b| b.is_ascii_alphabetic())
        || !suffix.bytes().all(|b| b.is_ascii_alphabetic())
    {
        return Err(invalid());
    }

    let digit = check_digit(serial).ok_or_else(invalid)?;

    if code.len() == 13 {
        let given = code.as_bytes()[10];
        if given != b'0' + digit {
            return Err(TrackingError::validation(format!(
                "check digit mismatch for '{}': expected {}",
                code, digit
            )));
        }
        return Ok(code);
    }

    Ok(format!("{}{}{}{}", prefix, serial, digit, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_digit() {
        assert_eq!(check_digit("12345678"), Some(5));
        assert_eq!(check_digit("98765432"), Some(6));
        // sum % 11 == 0
        assert_eq!(check_digit("00000000"), Some(5));
        assert_eq!(check_digit("1234567"), None);
        assert_eq!(check_digit("1234567a"), None);
    }

    #[test]
    fn test_with_check_digit() {
        assert_eq!(with_check_digit("ss12345678br").unwrap(), "SS123456785BR");
        assert_eq!(with_check_digit("SS123456785BR").unwrap(), "SS123456785BR");
        assert_eq!(with_check_digit(" PN98765432BR ").unwrap(), "PN987654326BR");
    }

    #[test]
    fn test_rejects_malformed_codes() {
        for bad in ["", "SS1234BR", "1S12345678BR", "SS123456784BR", "SS12345678B1"] {
            assert!(
                matches!(with_check_digit(bad), Err(TrackingError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }
}
