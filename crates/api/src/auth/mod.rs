//! Authentication primitives: JWT issuing/verification, password hashing,
//! and the cookies that carry tokens to browsers.

pub mod cookies;
pub mod jwt;
pub mod password;
