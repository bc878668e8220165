/// Password hashing and verification.
///
/// bcrypt with a configurable work factor. Strength policy lives in
/// `validators`; a well-formed password never fails to hash.
use crate::error::AppError;

/// Hash a password with a fresh random salt.
///
/// Two calls with the same input produce different digests.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored digest.
///
/// A malformed digest and a mismatch are indistinguishable: both return
/// `false`, so callers cannot leak which case occurred.
pub fn verify_password(password: &str, digest: &str) -> bool {
    bcrypt::verify(password, digest).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the test suite fast; production uses the configured 12.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_then_verify_round_trips() {
        let digest = hash_password("Passw0rd", TEST_COST).expect("Failed to hash password");

        assert_ne!(digest, "Passw0rd");
        assert!(digest.starts_with("$2"));
        assert!(verify_password("Passw0rd", &digest));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let digest = hash_password("Passw0rd", TEST_COST).expect("Failed to hash password");
        assert!(!verify_password("Passw1rd", &digest));
    }

    #[test]
    fn same_input_yields_different_digests() {
        let a = hash_password("Passw0rd", TEST_COST).expect("Failed to hash password");
        let b = hash_password("Passw0rd", TEST_COST).expect("Failed to hash password");
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_digest_verifies_false_instead_of_erroring() {
        assert!(!verify_password("Passw0rd", "not-a-bcrypt-digest"));
        assert!(!verify_password("Passw0rd", ""));
    }
}
