//! Domain building blocks shared by the civic complaint portal crates.
//!
//! Everything here is pure: no database, storage, or HTTP access.

pub mod accounts;
pub mod error;
pub mod expiry;
pub mod images;
pub mod types;
