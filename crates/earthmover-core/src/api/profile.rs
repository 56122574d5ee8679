//! Profile read/update.

use serde::Serialize;

use super::{ApiClient, ApiError, ApiResult};
use crate::media::ProfilePhoto;
use crate::models::AccountProfile;
use crate::session::Session;
use crate::util::{looks_like_email, normalize_text_option};

/// Profile update payload. Omitted fields keep their server-side value;
/// the photo travels as a base64 JPEG string via [`ProfilePhoto`]'s serde
/// impl.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<ProfilePhoto>,
}

impl ProfileUpdate {
    /// Trim text fields, drop empties, and check the email shape.
    pub fn normalized(self) -> ApiResult<Self> {
        let email = normalize_text_option(self.email);
        if let Some(email) = &email {
            if !looks_like_email(email) {
                return Err(ApiError::InvalidInput(format!(
                    "'{email}' is not a valid email address"
                )));
            }
        }
        Ok(Self {
            name: normalize_text_option(self.name),
            phone: normalize_text_option(self.phone),
            email,
            address: normalize_text_option(self.address),
            photo: self.photo,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.photo.is_none()
    }
}

impl ApiClient {
    /// Fetch the signed-in account's profile.
    pub async fn profile(&self, session: &Session) -> ApiResult<AccountProfile> {
        self.get_data(&format!(
            "v1/{}/{}/profile",
            session.role.path_segment(),
            session.user_id
        ))
        .await
    }

    /// Update the signed-in account's profile.
    pub async fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> ApiResult<String> {
        if update.is_empty() {
            return Err(ApiError::InvalidInput(
                "nothing to update; provide at least one field".to_string(),
            ));
        }
        self.post_ack(
            &format!(
                "v1/{}/{}/profile",
                session.role.path_segment(),
                session.user_id
            ),
            update,
        )
        .await
    }
}
