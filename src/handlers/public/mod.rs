// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, the service banner and the health check.
pub mod auth;
pub mod health;

pub use health::{health, root};
