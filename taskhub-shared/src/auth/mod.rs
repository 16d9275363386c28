/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password policy
/// - [`session_token`]: Opaque session token generation and hashing
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id, salted, PHC string storage
/// - **Session Tokens**: Random base62, only the SHA-256 hash is stored
/// - **Constant-time Comparison**: Password verification happens inside argon2

pub mod password;
pub mod session_token;
