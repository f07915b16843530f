//! One-time password codes for e-mail verification and password reset.

use chrono::Duration;
use rand::Rng;

use crate::types::Timestamp;

/// Number of decimal digits in a code.
pub const OTP_LENGTH: usize = 6;

/// Default lifetime of a code, in minutes.
pub const DEFAULT_OTP_EXPIRY_MINS: i64 = 10;

/// Lifetime of the short-lived token issued after a reset code is verified.
pub const PASSWORD_RESET_TOKEN_MINS: i64 = 15;

/// Wrong guesses after which a code stops being accepted.
pub const MAX_OTP_ATTEMPTS: i32 = 5;

/// Code sent while registering a new account.
pub const PURPOSE_REGISTRATION: &str = "registration";

/// Code sent for a forgotten password. Also the JWT `purpose` claim of the
/// short-lived reset token issued once the code is verified.
pub const PURPOSE_PASSWORD_RESET: &str = "password_reset";

/// Generate a random numeric code of [`OTP_LENGTH`] digits.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Expiry instant for a code issued at `issued_at`.
pub fn expires_at(issued_at: Timestamp, expiry_mins: i64) -> Timestamp {
    issued_at + Duration::minutes(expiry_mins)
}

/// Whether `code` has the shape of a valid OTP (exact length, digits only).
pub fn is_well_formed(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert!(is_well_formed(&code), "bad code {code}");
        }
    }

    #[test]
    fn malformed_codes_are_detected() {
        assert!(!is_well_formed("12345"));
        assert!(!is_well_formed("1234567"));
        assert!(!is_well_formed("12a456"));
        assert!(is_well_formed("000123"));
    }

    #[test]
    fn expiry_is_offset_from_issue_time() {
        let now = Utc::now();
        let exp = expires_at(now, DEFAULT_OTP_EXPIRY_MINS);
        assert_eq!((exp - now).num_minutes(), 10);
    }
}
