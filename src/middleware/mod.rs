pub mod auth;
pub mod extract;
pub mod locale;
pub mod response;

pub use auth::{jwt_auth_middleware, require_admin_middleware, require_coach_middleware, AuthUser};
pub use extract::{ValidJson, ValidPath, ValidQuery};
pub use locale::RequestLocale;
pub use response::{ApiResponse, ApiResult};
