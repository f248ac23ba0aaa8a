pub mod auth;
pub mod locale;
pub mod response;

pub use auth::{jwt_auth_middleware, CurrentUser};
pub use locale::{locale_middleware, vary_middleware};
pub use response::{ApiResponse, ApiResult, Page};
