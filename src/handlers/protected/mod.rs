// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind jwt_auth_middleware, which injects
// CurrentUser. Role checks happen per handler.

pub mod nodes;
pub mod users;
