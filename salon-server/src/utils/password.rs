//! Password verification

/// Check a plaintext password against a stored hash
///
/// Accounts carry bcrypt hashes (`$2a$`, `$2b$`, `$2y$`); argon2 PHC strings
/// are accepted as well. Anything unparseable never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    if hash.starts_with("$2") {
        return bcrypt::verify(password, hash).unwrap_or(false);
    }

    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
