pub mod admin;
pub mod auth;
pub mod error;
pub mod health;
pub mod profile;
pub mod screening;

pub use error::ErrorResponse;
pub use health::health_check;
