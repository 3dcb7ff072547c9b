// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: access token required
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware inserts `AuthUser` into request extensions.
// Every query here is scoped to that user; rows owned by someone else read
// as 404.

pub mod auth; // whoami, /users/me
pub mod badges; // /api/badges
pub mod exercise; // /api/exercise
pub mod media; // /api/media/soundcloud
pub mod meditation; // /api/meditation
pub mod programs; // /api/programs/:id/subscribe, /api/user-programs
pub mod sleep; // /api/sleep
pub mod world; // /api/world/overview
