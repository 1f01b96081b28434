//! Credential hashing and verification
//!
//! bcrypt is deliberately slow, so both directions run on the blocking pool
//! instead of stalling the async executor.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Password worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Hash a plaintext password with the given work factor
pub async fn hash_password(plain: &str, cost: u32) -> Result<String, PasswordError> {
    let plain = plain.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
    Ok(hashed)
}

/// Compare a plaintext password against a stored hash
///
/// A malformed stored hash counts as a mismatch; callers only ever learn
/// match or no-match.
pub async fn verify_password(plain: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let plain = plain.to_string();
    let stored_hash = stored_hash.to_string();
    let matched = tokio::task::spawn_blocking(move || {
        bcrypt::verify(plain, &stored_hash).unwrap_or_else(|e| {
            tracing::warn!("Stored credential could not be parsed: {}", e);
            false
        })
    })
    .await?;
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash_password("password123", 4).await.unwrap();
        assert_ne!(hashed, "password123");
        assert!(verify_password("password123", &hashed).await.unwrap());
        assert!(!verify_password("password124", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash").await.unwrap());
    }
}
