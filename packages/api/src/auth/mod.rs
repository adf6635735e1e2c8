//! Authentication: session tokens, credentials and third-party OAuth.

mod oauth;
mod password;
mod session;

pub use oauth::{OAuthClient, OAuthProfile};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use session::{clear_cookie, decode_token, issue_token, session_cookie, Claims, Session};
