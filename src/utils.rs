//! Small helpers: input validation and booking-number generation.

use crate::constants::{BOOKING_NUMBER_PREFIX, BOOKING_NUMBER_SUFFIX_LEN};
use crate::error::{BookingError, Result};
use chrono::Utc;
use rand::Rng;

/// Validate an email address.
///
/// A deliberately light check: one `@` with a dotted domain. Deliverability
/// is proven by the confirmation email, not by parsing.
///
/// # Examples
///
/// ```
/// use trailbook::utils::validate_email;
///
/// assert!(validate_email("ana@example.com").is_ok());
/// assert!(validate_email("not-an-email").is_err());
/// assert!(validate_email("a@b").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<()> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || email.contains(' ') {
        return Err(BookingError::Validation(format!(
            "invalid email address: {email}"
        )));
    }

    Ok(())
}

/// Generate a human-readable booking number: `TB-YYYYMMDD-XXXXXX`.
///
/// The random suffix uses an unambiguous uppercase alphabet (no `0`/`O`,
/// `1`/`I`). Uniqueness is ultimately enforced by the store's unique
/// constraint; the suffix only makes collisions negligible.
///
/// # Examples
///
/// ```
/// use trailbook::utils::generate_booking_number;
///
/// let number = generate_booking_number();
/// assert!(number.starts_with("TB-"));
/// assert_eq!(number.len(), "TB-20260825-XXXXXX".len());
/// ```
#[must_use]
pub fn generate_booking_number() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    let mut rng = rand::thread_rng();
    let suffix: String = (0..BOOKING_NUMBER_SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!(
        "{BOOKING_NUMBER_PREFIX}-{}-{suffix}",
        Utc::now().format("%Y%m%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_accepts_common_forms() {
        assert!(validate_email("jo@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.co").is_ok());
    }

    #[test]
    fn test_validate_email_rejects_malformed() {
        assert!(validate_email("").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jo@").is_err());
        assert!(validate_email("jo@nodot").is_err());
        assert!(validate_email("jo smith@example.com").is_err());
    }

    #[test]
    fn test_booking_number_shape() {
        let number = generate_booking_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], BOOKING_NUMBER_PREFIX);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), BOOKING_NUMBER_SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_booking_numbers_are_distinct() {
        let a = generate_booking_number();
        let b = generate_booking_number();
        // Same-day collisions require matching 6-char suffixes.
        assert_ne!(a, b);
    }
}
