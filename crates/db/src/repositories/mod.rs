//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod complaint_image_repo;
pub mod complaint_repo;
pub mod user_repo;

pub use complaint_image_repo::ComplaintImageRepo;
pub use complaint_repo::ComplaintRepo;
pub use user_repo::UserRepo;
