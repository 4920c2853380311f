use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Shape checks shared by register and login. Returns the normalized email.
pub(crate) fn validate_credentials(email: &str, password: &str) -> Result<String, AppError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("ab.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn credentials_are_normalized() {
        let email = validate_credentials("  Alice@Example.COM ", "Abcdef1!").unwrap();
        assert_eq!(email, "alice@example.com");
    }

    #[test]
    fn short_password_rejected() {
        let err = validate_credentials("a@b.com", "short").unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("at least 8")));
    }

    #[test]
    fn bad_email_rejected() {
        let err = validate_credentials("nope", "Abcdef1!").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
