// handlers/protected/mod.rs - Protected handlers (bearer JWT required)
//
// Every route here sits behind jwt_auth_middleware, so handlers read the
// requester from `Extension<AuthUser>` and never from the request body.
pub mod auth;
pub mod tickets;
pub mod users;
