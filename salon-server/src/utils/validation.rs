//! Input validation helpers

use shared::error::AppError;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(
            AppError::validation(format!("{field} must not be empty")).with_detail("field", field),
        );
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field)
        .with_detail("max_len", max_len));
    }
    Ok(())
}

/// Passwords are taken verbatim: only the empty string counts as missing.
pub fn validate_password(value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(
            AppError::validation("password must not be empty").with_detail("field", "password"),
        );
    }
    if value.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password is too long ({} chars, max {MAX_PASSWORD_LEN})",
            value.len()
        ))
        .with_detail("field", "password")
        .with_detail("max_len", MAX_PASSWORD_LEN));
    }
    Ok(())
}

/// Shape check only: one `@`, non-empty local part, dotted domain, no spaces.
pub fn validate_email(value: &str) -> Result<(), AppError> {
    validate_required_text(value, "email", MAX_EMAIL_LEN)?;

    let malformed =
        || AppError::validation("email is not a valid address").with_detail("field", "email");
    if value.chars().any(char::is_whitespace) {
        return Err(malformed());
    }
    let (local, domain) = value.split_once('@').ok_or_else(malformed)?;
    if local.is_empty() || domain.contains('@') {
        return Err(malformed());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(malformed());
    }
    Ok(())
}
