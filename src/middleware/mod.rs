mod auth;

pub use auth::{attach_user, issue_token, CurrentUser};
