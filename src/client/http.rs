use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::login_flow::{AuthApi, AuthStatus, ClientError, LoginReply};
use crate::constants::auth::INVALID_CREDENTIALS_MESSAGE;

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Talks to a running server's `/api/auth/*` endpoints, keeping the session cookie in
/// an in-memory jar.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: Url,
}

impl HttpAuthApi {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder()
            .cookie_store(true)
            .user_agent("Vitrine/1.0")
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    /// Fetches `/api/auth/me` with the session cookie obtained by a successful login.
    pub async fn me(&self) -> Result<serde_json::Value, ClientError> {
        let response = self
            .client
            .get(self.endpoint("/api/auth/me")?)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn status(&self) -> Result<AuthStatus, ClientError> {
        let response = self
            .client
            .get(self.endpoint("/api/auth/status")?)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginReply, ClientError> {
        let response = self
            .client
            .post(self.endpoint("/api/auth/login")?)
            .json(&Credentials { username, password })
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), "Login response received");

        match status {
            StatusCode::OK => Ok(LoginReply::Accepted),
            StatusCode::TOO_MANY_REQUESTS => Ok(LoginReply::Throttled),
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => {
                let message = response
                    .json::<ErrorBody>()
                    .await
                    .ok()
                    .and_then(|b| b.error)
                    .unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string());
                Ok(LoginReply::Rejected { message })
            }
            other => Err(ClientError::UnexpectedStatus(other.as_u16())),
        }
    }
}
