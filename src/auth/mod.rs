mod claims;
pub mod cookie;
pub mod extractors;
pub mod jwt;
pub mod ownership;
pub mod password;

pub use cookie::{attach_session_cookie, CookiePolicy};
pub use extractors::AuthUser;
pub use jwt::JwtKeys;
pub use ownership::{owned_or_not_found, Owned};
