//! People: operator references and account profiles.

use serde::{Deserialize, Deserializer, Serialize};

use crate::media::ProfilePhoto;
use crate::util::normalize_text_option;

/// The operator assigned to a machine, as returned by operator resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRef {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// A customer's or operator's account profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Wire form is a base64 JPEG string. An empty or undecodable payload
    /// degrades to no photo instead of failing the whole profile fetch.
    #[serde(default, deserialize_with = "deserialize_lenient_photo")]
    pub photo: Option<ProfilePhoto>,
}

fn deserialize_lenient_photo<'de, D>(deserializer: D) -> Result<Option<ProfilePhoto>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(encoded) = normalize_text_option(raw) else {
        return Ok(None);
    };
    Ok(ProfilePhoto::from_base64(&encoded).ok())
}
