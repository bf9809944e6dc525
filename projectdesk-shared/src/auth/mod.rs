/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: opaque `id|secret` bearer token generation and checks
/// - [`middleware`]: bearer token authentication for Axum
/// - [`authorization`]: cached role to permission mapping
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::auth::password::{hash_password, verify_password};
/// use projectdesk_shared::auth::token::{generate_secret, hash_secret};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let secret = generate_secret();
/// let stored = hash_secret(&secret);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod token;
