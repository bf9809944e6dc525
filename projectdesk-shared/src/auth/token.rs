/// Opaque bearer token utilities
///
/// This module provides generation, parsing and verification of the
/// personal access tokens issued at login. Database operations live in
/// `models::access_token`.
///
/// # Token Format
///
/// Tokens look like `42|Xk3...` (row id, a pipe, then the secret):
/// - Id: the `personal_access_tokens.id` of the row
/// - Secret: 40 random alphanumeric chars (base62: [A-Za-z0-9])
///
/// Only the SHA-256 hex digest of the secret is stored.
///
/// # Example
///
/// ```
/// use projectdesk_shared::auth::token::{generate_secret, hash_secret, parse_token, verify_secret};
///
/// let secret = generate_secret();
/// let hash = hash_secret(&secret);
///
/// let presented = format!("7|{}", secret);
/// let (id, parsed_secret) = parse_token(&presented).unwrap();
/// assert_eq!(id, 7);
/// assert!(verify_secret(parsed_secret, &hash));
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of the random part of a token (characters)
pub const SECRET_LENGTH: usize = 40;

/// Separator between token id and secret
const SEPARATOR: char = '|';

/// Error type for malformed tokens
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Token has no `id|secret` structure
    #[error("Malformed token")]
    Malformed,

    /// Id part is not a positive integer
    #[error("Invalid token id")]
    InvalidId,
}

/// Generates a new random token secret
pub fn generate_secret() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..SECRET_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hashes a token secret with SHA-256
///
/// # Returns
///
/// Hex-encoded digest (64 characters)
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Builds the plaintext token handed to the client
pub fn format_token(id: i64, secret: &str) -> String {
    format!("{}{}{}", id, SEPARATOR, secret)
}

/// Splits a presented token into its row id and secret
///
/// # Errors
///
/// - `TokenError::Malformed` if there is no separator or the secret is empty
/// - `TokenError::InvalidId` if the id is not a positive integer
pub fn parse_token(token: &str) -> Result<(i64, &str), TokenError> {
    let (id, secret) = token.split_once(SEPARATOR).ok_or(TokenError::Malformed)?;

    if secret.is_empty() {
        return Err(TokenError::Malformed);
    }

    let id = id.parse::<i64>().map_err(|_| TokenError::InvalidId)?;
    if id <= 0 {
        return Err(TokenError::InvalidId);
    }

    Ok((id, secret))
}

/// Checks a presented secret against a stored hash in constant time
pub fn verify_secret(secret: &str, stored_hash: &str) -> bool {
    constant_time_compare(&hash_secret(secret), stored_hash)
}

/// Constant-time string comparison
///
/// Always walks the full length of both inputs so the comparison time
/// doesn't depend on where they differ.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();

    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= (x ^ y) as usize;
    }

    diff == 0
}
