pub mod auth;
pub mod complaint_image;
pub mod users;
