//! Password-reset verification rules.

use chrono::NaiveDate;

use crate::error::{Result, StoreError};

/// Validates a date-of-birth-verified password reset against the stored
/// profile. Returns the new password on success; the caller hashes it and
/// revokes the user's existing sessions.
pub fn verify_password_reset<'a>(
    stored_dob: NaiveDate,
    submitted_dob: &str,
    new_password: &'a str,
    confirm_password: &str,
) -> Result<&'a str> {
    let dob = submitted_dob
        .trim()
        .parse::<NaiveDate>()
        .map_err(|_| StoreError::Validation("date of birth must be YYYY-MM-DD".to_string()))?;
    if dob != stored_dob {
        return Err(StoreError::InvalidState("incorrect date of birth".to_string()));
    }
    if new_password != confirm_password {
        return Err(StoreError::InvalidState("passwords do not match".to_string()));
    }
    if new_password.is_empty() {
        return Err(StoreError::Validation("password must not be empty".to_string()));
    }
    Ok(new_password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dob() -> NaiveDate {
        NaiveDate::from_ymd_opt(1994, 3, 12).unwrap()
    }

    #[test]
    fn accepts_matching_dob_and_passwords() {
        assert_eq!(verify_password_reset(dob(), "1994-03-12", "s3cret", "s3cret").unwrap(), "s3cret");
    }

    #[test]
    fn rejects_wrong_dob() {
        let err = verify_password_reset(dob(), "1994-03-13", "x", "x").unwrap_err();
        assert!(matches!(err, StoreError::InvalidState(ref m) if m == "incorrect date of birth"));
    }

    #[test]
    fn rejects_mismatched_passwords() {
        let err = verify_password_reset(dob(), "1994-03-12", "a", "b").unwrap_err();
        assert!(matches!(err, StoreError::InvalidState(ref m) if m == "passwords do not match"));
    }

    #[test]
    fn rejects_unparseable_dob() {
        assert!(matches!(
            verify_password_reset(dob(), "12/03/1994", "x", "x"),
            Err(StoreError::Validation(_))
        ));
    }
}
