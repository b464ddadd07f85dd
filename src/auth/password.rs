//! Argon2id hashing for passwords and team access keys, plus session token minting.
//!
//! Hashes are stored in PHC string format so that the algorithm parameters and
//! salt travel with the hash.

use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use uuid::Uuid;

/// Hash a plaintext secret using Argon2id with a random salt.
pub fn hash_secret(secret: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a plaintext secret against a stored PHC hash.
///
/// A malformed stored hash never verifies.
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        tracing::warn!("Stored hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

/// Mint a fresh opaque session token.
pub fn mint_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}
