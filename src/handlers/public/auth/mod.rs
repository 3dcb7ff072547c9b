// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition endpoints that do not require authentication.

pub mod login; // POST /auth/login - authenticate and get a token pair
pub mod refresh; // POST /auth/refresh - rotate tokens
pub mod register; // POST /auth/register - create a new account

pub use login::login_post;
pub use refresh::refresh_post;
pub use register::register_post;
