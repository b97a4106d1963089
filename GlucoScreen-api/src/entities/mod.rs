// Public request and response types of the GlucoScreen API.
// Responses mostly reuse the domain entities, which already carry schemas.

pub mod admin;
pub mod auth;
pub mod screening;
