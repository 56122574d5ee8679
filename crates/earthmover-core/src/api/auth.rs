//! Role-scoped login.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, ApiResult};
use crate::session::{Role, Session};
use crate::util::looks_like_email;

/// Login payload: a phone number or email plus the password.
///
/// Validation happens at construction so a malformed request never reaches
/// the network.
#[derive(Clone, Serialize)]
pub struct Credentials {
    identifier: String,
    password: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> ApiResult<Self> {
        let identifier = identifier.into().trim().to_string();
        let password = password.into();
        if identifier.is_empty() {
            return Err(ApiError::InvalidInput(
                "identifier (phone or email) is required".to_string(),
            ));
        }
        if identifier.contains('@') && !looks_like_email(&identifier) {
            return Err(ApiError::InvalidInput(format!(
                "'{identifier}' is not a valid email address"
            )));
        }
        if password.trim().is_empty() {
            return Err(ApiError::InvalidInput("password is required".to_string()));
        }
        Ok(Self {
            identifier,
            password,
        })
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    id: i64,
    name: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    email: Option<String>,
}

impl ApiClient {
    /// Sign in against the role-specific login route.
    ///
    /// The backend keeps separate credential tables per role, so a valid
    /// account submitted to the wrong role's route comes back as a clean
    /// rejection rather than a match.
    pub async fn login(&self, role: Role, credentials: &Credentials) -> ApiResult<Session> {
        let path = format!("v1/{}/login", role.path_segment());
        let payload: LoginPayload = self.post_data(&path, credentials).await?;
        Ok(Session {
            user_id: payload.id,
            name: payload.name,
            phone: payload.phone,
            email: crate::util::normalize_text_option(payload.email),
            role,
        })
    }
}
