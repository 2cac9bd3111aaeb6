pub mod jwt;
pub mod password;

pub use jwt::{Claims, TokenIssuer, TokenPair};
pub use password::{hash_password, verify_password};
