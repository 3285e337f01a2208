use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{ContactRequestChanges, NewContactRequest};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Auth
// ============================================================================

/// Absent and `null` fields are both `None`; the handler rejects them with 400.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionUserDto {
    pub id: i32,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: SessionUserDto,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StatusUserDto {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<StatusUserDto>,
}

// ============================================================================
// Contact requests
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl From<ContactSubmission> for NewContactRequest {
    fn from(body: ContactSubmission) -> Self {
        Self {
            name: body.name,
            email: body.email,
            phone: body.phone,
            message: body.message,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub status: Option<String>,
}

impl From<ContactUpdateRequest> for ContactRequestChanges {
    fn from(body: ContactUpdateRequest) -> Self {
        Self {
            name: body.name,
            email: body.email,
            phone: body.phone,
            message: body.message,
            status: body.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}
