// GlucoScreen Domain
// This crate contains the business logic for the GlucoScreen application

// Error taxonomy shared by every service
pub mod errors;

// Environment-driven application settings
pub mod config;

// Services that implement business logic
pub mod services;

// Risk classifier contract and model loader
pub mod classifier;

// CSV export of result sets
pub mod export;

// Authentication, sessions and role checks
pub mod auth;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Re-export the database module from the data crate for convenience
pub use gluco_screen_data::database;

pub use errors::ScreeningError;

// Testing utilities - only available with mock feature
#[cfg(any(test, feature = "mock"))]
pub mod testing;
