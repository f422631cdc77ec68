/// Password hashing and verification
use crate::error::{AuthError, AuthResult};

/// bcrypt cost factor; each hash call draws a fresh salt
const BCRYPT_COST: u32 = 10;

/// Hash a plaintext password. Two calls with the same input yield
/// different hashes.
pub fn hash_password(plaintext: &str) -> AuthResult<String> {
    bcrypt::hash(plaintext, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored hash.
///
/// Any malformed stored hash verifies false rather than erroring — the
/// empty hash of an external-identity-only account can never match a
/// password.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashes_differ_but_both_verify() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first));
        assert!(verify_password("hunter2", &second));
    }

    #[test]
    fn test_wrong_password_fails() {
        let hash = hash_password("hunter2").unwrap();
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_malformed_hash_fails_closed() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
        assert!(!verify_password("", ""));
    }
}
