/// Session token utilities
///
/// Session tokens are opaque, unguessable strings handed to the client in the
/// session cookie. Only their SHA-256 hash is ever written to the store, so a
/// leaked store snapshot cannot be replayed as live sessions.
///
/// # Token Format
///
/// 48 base62 characters (`[A-Za-z0-9]`), about 285 bits of entropy.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::session_token::{
///     generate_session_token, hash_session_token, validate_session_token_format,
/// };
///
/// let (token, hash) = generate_session_token();
/// assert_eq!(token.len(), 48);
/// assert!(validate_session_token_format(&token));
/// assert_eq!(hash, hash_session_token(&token));
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a session token (characters)
pub const SESSION_TOKEN_LENGTH: usize = 48;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a new session token
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hex_hash)
pub fn generate_session_token() -> (String, String) {
    let mut rng = rand::thread_rng();

    let token: String = (0..SESSION_TOKEN_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    let hash = hash_session_token(&token);

    (token, hash)
}

/// Hashes a session token using SHA-256
///
/// # Returns
///
/// Hex-encoded SHA-256 hash (64 characters)
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks that a token has the shape produced by [`generate_session_token`]
///
/// Lets the auth layer reject garbage cookies without a store round trip.
pub fn validate_session_token_format(token: &str) -> bool {
    token.len() == SESSION_TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}
