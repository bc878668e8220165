//! Credential and token primitives.

mod password;
mod token;

pub use password::hash_password;
pub use password::verify_password;
pub use token::expiry_from_now;
pub use token::new_opaque_token;
