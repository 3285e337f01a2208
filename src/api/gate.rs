//! Path-based access control in front of every request.
//!
//! Classification order matters: the decoy prefix is checked first, so anything that merely
//! looks like an admin path answers 404 without revealing whether it exists.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::AppState;
use super::auth::current_session;
use crate::config::AuthConfig;
use crate::constants::auth::REDIRECT_PARAM;
use crate::services::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Hidden,
    LoginPage,
    Protected,
}

#[derive(Debug, Clone)]
pub struct GatePolicy {
    protected_prefix: String,
    login_path: String,
    decoy_prefix: String,
}

impl GatePolicy {
    #[must_use]
    pub fn new(protected_prefix: &str, login_path: &str, decoy_prefix: &str) -> Self {
        Self {
            protected_prefix: normalize(protected_prefix),
            login_path: normalize(login_path),
            decoy_prefix: normalize(decoy_prefix),
        }
    }

    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.protected_prefix,
            &config.login_path,
            &config.decoy_prefix,
        )
    }

    /// `true` for the prefix itself and anything below it, segment-wise.
    fn is_protected_area(&self, path: &str) -> bool {
        path.strip_prefix(&self.protected_prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Paths that are not in canonical form are Hidden, so a spelling such as
    /// `//adminpanelR` can never reach a handler that trims slashes itself.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if !is_canonical(path) {
            return RouteClass::Hidden;
        }

        let protected = self.is_protected_area(path);

        if path.starts_with(&self.decoy_prefix) && !protected {
            return RouteClass::Hidden;
        }

        if path.strip_suffix('/').unwrap_or(path) == self.login_path {
            return RouteClass::LoginPage;
        }

        if protected {
            return RouteClass::Protected;
        }

        RouteClass::Public
    }

    /// Login page URL that returns to `path` afterwards. The query string is not carried.
    #[must_use]
    pub fn login_redirect(&self, path: &str) -> String {
        format!(
            "{}?{REDIRECT_PARAM}={}",
            self.login_path,
            urlencoding::encode(path)
        )
    }
}

/// `true` when `path` is absolute with no empty, `.` or `..` segments.
/// A single trailing slash is allowed.
#[must_use]
pub fn is_canonical(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }

    rest.strip_suffix('/')
        .unwrap_or(rest)
        .split('/')
        .all(|segment| !matches!(segment, "" | "." | ".."))
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

pub async fn route_gate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match state.gate.classify(&path) {
        RouteClass::Hidden => {
            debug!(path = %path, "Decoy path requested");
            metrics::counter!("vitrine_gate_decisions_total", "decision" => "hidden").increment(1);
            StatusCode::NOT_FOUND.into_response()
        }
        RouteClass::Public | RouteClass::LoginPage => next.run(request).await,
        RouteClass::Protected => match current_session(&state, request.headers()) {
            Session::Authenticated(identity) => {
                tracing::Span::current().record("user_id", identity.username.as_str());
                request.extensions_mut().insert(identity);
                next.run(request).await
            }
            Session::Anonymous(reason) => {
                debug!(path = %path, reason = reason.as_str(), "Redirecting to login");
                metrics::counter!("vitrine_gate_decisions_total", "decision" => "redirect")
                    .increment(1);
                Redirect::temporary(&state.gate.login_redirect(&path)).into_response()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> GatePolicy {
        GatePolicy::from_config(&AuthConfig::default())
    }

    #[test]
    fn test_decoy_paths_are_hidden() {
        let gate = policy();
        for path in [
            "/admin",
            "/admin/",
            "/admin/login",
            "/administrator",
            "/adminpanel",
            "/adminpanelRx",
        ] {
            assert_eq!(gate.classify(path), RouteClass::Hidden, "{path}");
        }
    }

    #[test]
    fn test_login_page_is_open() {
        let gate = policy();
        assert_eq!(gate.classify("/adminpanelR/login"), RouteClass::LoginPage);
        assert_eq!(gate.classify("/adminpanelR/login/"), RouteClass::LoginPage);
        assert_eq!(gate.classify("/adminpanelR/login/extra"), RouteClass::Protected);
        assert_eq!(gate.classify("/adminpanelR/loginx"), RouteClass::Protected);
    }

    #[test]
    fn test_protected_area() {
        let gate = policy();
        for path in ["/adminpanelR", "/adminpanelR/", "/adminpanelR/blog", "/adminpanelR/a/b"] {
            assert_eq!(gate.classify(path), RouteClass::Protected, "{path}");
        }
    }

    #[test]
    fn test_everything_else_is_public() {
        let gate = policy();
        for path in [
            "/",
            "/blog",
            "/blog/hello",
            "/api/auth/login",
            "/api/admin/blog",
            "/sitemap.xml",
            "/Admin",
        ] {
            assert_eq!(gate.classify(path), RouteClass::Public, "{path}");
        }
    }

    #[test]
    fn test_non_canonical_paths_are_hidden() {
        let gate = policy();
        for path in [
            "//adminpanelR",
            "//adminpanelR/",
            "/blog//adminpanelR",
            "/./adminpanelR",
            "/blog/../adminpanelR",
            "/adminpanelR/.",
            "",
        ] {
            assert_eq!(gate.classify(path), RouteClass::Hidden, "{path:?}");
        }
    }

    #[test]
    fn test_is_canonical() {
        assert!(is_canonical("/"));
        assert!(is_canonical("/blog/"));
        assert!(is_canonical("/blog/my-post.v2"));
        assert!(!is_canonical("//"));
        assert!(!is_canonical("/blog//"));
        assert!(!is_canonical("/.."));
        assert!(!is_canonical("blog"));
    }

    #[test]
    fn test_custom_prefixes() {
        let gate = GatePolicy::new("/backoffice/", "/backoffice/signin", "/wp-admin");
        assert_eq!(gate.classify("/backoffice"), RouteClass::Protected);
        assert_eq!(gate.classify("/backoffice/signin"), RouteClass::LoginPage);
        assert_eq!(gate.classify("/wp-admin/setup.php"), RouteClass::Hidden);
        assert_eq!(gate.classify("/admin"), RouteClass::Public);
    }

    #[test]
    fn test_login_redirect_encodes_path() {
        let gate = policy();
        assert_eq!(
            gate.login_redirect("/adminpanelR/blog posts"),
            "/adminpanelR/login?redirect=%2FadminpanelR%2Fblog%20posts"
        );
        assert_eq!(
            gate.login_redirect("/adminpanelR"),
            "/adminpanelR/login?redirect=%2FadminpanelR"
        );
    }
}
