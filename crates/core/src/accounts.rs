//! Account rules: email normalization and profile field limits.

use crate::error::CoreError;

/// Minimum accepted password length for signup and password change.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted display-name length (in characters).
pub const MAX_NAME_LENGTH: usize = 100;

/// Normalize an email address for storage and lookup.
///
/// Emails are compared case-insensitively, so the canonical form is the
/// trimmed, lower-cased string. Uniqueness is enforced on this form.
///
/// ```
/// use civic_core::accounts::normalize_email;
///
/// assert_eq!(normalize_email("  Rahim@Example.COM "), "rahim@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate and trim a display name.
pub fn normalize_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation("Name must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters long"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("User@Mail.com"), "user@mail.com");
        assert_eq!(normalize_email("\tuser@mail.com\n"), "user@mail.com");
    }

    #[test]
    fn name_is_trimmed() {
        assert_eq!(normalize_name("  Karim  ").unwrap(), "Karim");
    }

    #[test]
    fn blank_name_rejected() {
        assert_matches!(normalize_name("   "), Err(CoreError::Validation(_)));
    }

    #[test]
    fn overlong_name_rejected() {
        let name = "a".repeat(MAX_NAME_LENGTH + 1);
        assert_matches!(normalize_name(&name), Err(CoreError::Validation(_)));
        assert!(normalize_name(&"a".repeat(MAX_NAME_LENGTH)).is_ok());
    }
}
