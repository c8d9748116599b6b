//! Password hashing and access-token handling.

pub mod jwt;
pub mod password;

pub use jwt::{create_access_token, decode_access_token, Claims, JwtConfig, Token};
pub use password::{hash_password, verify_dummy_password, verify_password};
