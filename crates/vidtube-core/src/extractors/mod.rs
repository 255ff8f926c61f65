pub mod auth_user;
pub mod json;
pub mod pagination;

pub use auth_user::{AuthUser, MaybeAuthUser};
pub use json::Json;
pub use pagination::Pagination;
