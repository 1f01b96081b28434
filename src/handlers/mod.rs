// handlers/mod.rs - two handler tiers
//
// Public (no auth) -> Protected (bearer JWT, AuthUser in request extensions)
pub mod protected;
pub mod public;
