pub mod cookies;
pub mod jwt;
pub mod password;
pub mod session;
pub mod store;

pub use cookies::{clear_session_cookies, set_session_cookies};
pub use jwt::{create_token, validate_token, Claims, TokenError};
pub use password::{hash_password, verify_password};
pub use session::{CredentialPair, IssuedSession, SessionError, SessionManager};
pub use store::{PrincipalStore, SeaPrincipalStore};
