/// Password storage and policy
///
/// Passwords are stored as Argon2id PHC strings
/// (`$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`), so the salt and cost
/// parameters travel with each hash. Verification reads them back from the
/// stored string; raising the cost later does not invalidate old hashes.
///
/// ```
/// use taskhub_shared::auth::password::{hash_password, meets_requirements, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// assert!(meets_requirements("Pass123!"));
///
/// let hash = hash_password("Pass123!")?;
/// assert!(verify_password("Pass123!", &hash)?);
/// assert!(!verify_password("Pass124!", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

/// Minimum password length (characters)
pub const MIN_PASSWORD_LENGTH: usize = 6;

const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),

    /// The stored string is not a PHC hash
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(argon2::password_hash::Error),
}

/// A rule of the password policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    MinLength,
    Digit,
    Symbol,
}

impl PasswordRule {
    pub fn describe(self) -> &'static str {
        match self {
            PasswordRule::MinLength => "at least 6 characters",
            PasswordRule::Digit => "at least one digit",
            PasswordRule::Symbol => "at least one symbol",
        }
    }
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(|e| PasswordError::Hash(e.into()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::Hash)
}

/// Checks `password` against a stored PHC hash
///
/// A mismatch is `Ok(false)`; only an unreadable hash is an error.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored).map_err(PasswordError::MalformedHash)?;

    // A PHC prefix without salt or output would otherwise read as a mismatch
    if parsed.salt.is_none() || parsed.hash.is_none() {
        return Err(PasswordError::MalformedHash(
            argon2::password_hash::Error::PhcStringField,
        ));
    }

    match hasher()?.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::MalformedHash(e)),
    }
}

/// Rules the password breaks, in policy order
pub fn unmet_requirements(password: &str) -> Vec<PasswordRule> {
    let mut unmet = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        unmet.push(PasswordRule::MinLength);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        unmet.push(PasswordRule::Digit);
    }
    if password.chars().all(char::is_alphanumeric) {
        unmet.push(PasswordRule::Symbol);
    }

    unmet
}

/// True when the password satisfies every policy rule
pub fn meets_requirements(password: &str) -> bool {
    unmet_requirements(password).is_empty()
}
