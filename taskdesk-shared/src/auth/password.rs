/// Argon2id password hashing
///
/// Parameters: 64 MiB memory, 3 passes, 4 lanes, 32-byte output, random
/// 16-byte salt. Hashes are stored as PHC strings, which embed the
/// parameters, so verification keeps working if they change later.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Launch#2025")?;
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(verify_password("Launch#2025", &hash)?);
/// assert!(!verify_password("launch#2025", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// A rule a candidate password failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WeakPassword {
    #[error("Password must be at least 8 characters long")]
    TooShort,

    #[error("Password must contain at least one uppercase letter")]
    NoUppercase,

    #[error("Password must contain at least one lowercase letter")]
    NoLowercase,

    #[error("Password must contain at least one digit")]
    NoDigit,

    #[error("Password must contain at least one special character")]
    NoSpecial,
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes `password` into a PHC string
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))
}

/// Checks `password` against a stored PHC hash in constant time
///
/// # Returns
///
/// `Ok(false)` on a mismatch; errors are reserved for unusable hashes.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Requires length ≥ 8 with upper, lower, digit and special characters
///
/// Reports the first rule that fails.
pub fn validate_password_strength(password: &str) -> Result<(), WeakPassword> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(WeakPassword::TooShort);
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(WeakPassword::NoUppercase);
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(WeakPassword::NoLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(WeakPassword::NoDigit);
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(WeakPassword::NoSpecial);
    }

    Ok(())
}
