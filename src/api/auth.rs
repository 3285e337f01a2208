use axum::{
    Extension, Json,
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::cookies::{clear_session_cookie, session_cookie, session_token};
use super::{
    ApiError, ApiResponse, AppState, AuthStatusResponse, LoginRequest, LoginResponse,
    MessageResponse, SessionUserDto, StatusUserDto,
};
use crate::services::{AdminInfo, AuthError, Identity, Session, ThrottleDecision};

/// Socket peer address, when the server was started with connect info.
pub struct ClientAddr(pub Option<IpAddr>);

impl<S: Send + Sync> FromRequestParts<S> for ClientAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip()),
        ))
    }
}

/// Resolves the session cookie on `headers` against the current time.
pub fn current_session(state: &AppState, headers: &HeaderMap) -> Session {
    let token = session_token(headers);
    state.sessions().resolve(token.as_deref(), Utc::now())
}

// ============================================================================
// Middleware
// ============================================================================

/// Guards the admin JSON API. Answers 401 instead of redirecting.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match current_session(&state, request.headers()) {
        Session::Authenticated(identity) => {
            tracing::Span::current().record("user_id", identity.username.as_str());
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Session::Anonymous(reason) => {
            tracing::debug!(reason = reason.as_str(), "Admin API request without session");
            Err(ApiError::unauthorized())
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Verify credentials and set the session cookie
pub async fn login(
    State(state): State<Arc<AppState>>,
    ClientAddr(peer): ClientAddr,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let username = payload
        .username
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Username is required"))?;
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("Password is required"))?;

    let throttle = &state.shared.login_throttle;
    let client = throttle.client_key(peer, &headers);

    if let ThrottleDecision::Locked { retry_after } = throttle.check(&client, Instant::now()) {
        metrics::counter!("vitrine_login_attempts_total", "outcome" => "throttled").increment(1);
        return Err(ApiError::TooManyRequests {
            retry_after_secs: retry_after.as_secs().max(1),
        });
    }

    let success = match state
        .auth_service()
        .login(&username, &password)
        .await
    {
        Ok(success) => success,
        Err(AuthError::InvalidCredentials) => {
            throttle.record_failure(&client, Instant::now());
            metrics::counter!("vitrine_login_attempts_total", "outcome" => "rejected")
                .increment(1);
            warn!(client = %client, "Failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    throttle.record_success(&client);
    metrics::counter!("vitrine_login_attempts_total", "outcome" => "success").increment(1);

    let config = state.config();
    let cookie = session_cookie(
        &success.token,
        config.auth.token_ttl_seconds,
        config.server.secure_cookies,
    )
    .map_err(|e| ApiError::internal(format!("Failed to build session cookie: {e}")))?;

    info!(user_id = success.identity.id, client = %client, "Login succeeded");

    let body = ApiResponse::success(LoginResponse {
        user: SessionUserDto {
            id: success.identity.id,
            username: success.identity.username,
            role: success.identity.role,
        },
        expires_at: success.expires_at,
    });

    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /auth/logout
/// Tell the browser to drop the session cookie. Tokens are not revoked server-side.
pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cookie = clear_session_cookie(state.config().server.secure_cookies);

    (
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(ApiResponse::success(MessageResponse {
            message: "Logged out".to_string(),
        })),
    )
}

/// GET /auth/status
pub async fn status(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let response = match current_session(&state, &headers) {
        Session::Authenticated(identity) => AuthStatusResponse {
            authenticated: true,
            user: Some(StatusUserDto {
                username: identity.username,
                role: identity.role,
            }),
        },
        Session::Anonymous(_) => AuthStatusResponse {
            authenticated: false,
            user: None,
        },
    };

    Json(response)
}

/// GET /auth/me
/// Account details of the logged-in administrator
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<AdminInfo>>, ApiError> {
    let info = state
        .auth_service()
        .admin_info(identity.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(Json(ApiResponse::success(info)))
}
