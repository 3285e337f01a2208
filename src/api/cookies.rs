//! `Set-Cookie` / `Cookie` handling for the session token.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};

use crate::constants::auth::SESSION_COOKIE;

/// `HttpOnly` session cookie; `Secure` only when the site is served over HTTPS.
pub fn session_cookie(
    token: &str,
    max_age_seconds: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("admin_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("admin_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

/// Raw value of the session cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == SESSION_COOKIE).then(|| value.trim().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc.def.ghi", 86_400, false).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "admin_token=abc.def.ghi; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400"
        );

        let secure = session_cookie("t", 60, true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cleared = clear_session_cookie(false);
        let value = cleared.to_str().unwrap();
        assert!(value.starts_with("admin_token=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(clear_session_cookie(true).to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn test_session_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; admin_token=xyz; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));

        headers.insert(COOKIE, HeaderValue::from_static("admin_token="));
        assert_eq!(session_token(&headers).as_deref(), Some(""));

        headers.insert(COOKIE, HeaderValue::from_static("not_admin_token=abc"));
        assert_eq!(session_token(&headers), None);
    }
}
