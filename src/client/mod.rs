//! Client side of the admin login: the login-page state machine and its HTTP transport.

pub mod http;
pub mod login_flow;

pub use http::HttpAuthApi;
pub use login_flow::{
    AuthApi, AuthStatus, ClientError, LoginAttemptCounter, LoginFlow, LoginOutcome, LoginReply,
    Navigation, StatusUser, sanitize_redirect,
};
