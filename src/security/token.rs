/// Opaque token issuance.
///
/// Verification and reset tokens are unguessable lookup keys with no decodable
/// structure. Collisions are left to the storage uniqueness constraint.
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

/// Generate a new opaque token: 32 bytes from the OS CSPRNG, hex encoded.
pub fn new_opaque_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Absolute expiry for a token issued now.
pub fn expiry_from_now(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}
