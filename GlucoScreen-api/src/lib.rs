// GlucoScreen-api lib.rs
//
// HTTP surface of the GlucoScreen screening service: router, handlers,
// public request types and OpenAPI documentation.

pub mod api;
pub mod entities;
pub mod openapi;

pub use api::routes::{create_app, AppState};
