//! Machine catalog records.

use serde::{Deserialize, Deserializer, Serialize};

/// One rentable machine as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: i64,
    pub model_name: String,
    #[serde(default)]
    pub category_id: i64,
    pub price_per_hour: f64,
    /// Reference only; the client never fetches the image itself.
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub specs: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub equipment_type: String,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    pub available: bool,
    #[serde(default)]
    pub address: Option<String>,
}

/// The backend emits availability as `true`/`false`, `1`/`0`, or `"1"`/`"0"`
/// depending on the endpoint. Fold them all into a plain bool.
fn deserialize_flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(value) => Ok(value),
        Raw::Int(value) => Ok(value != 0),
        Raw::Text(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "available" => Ok(true),
            "0" | "false" | "no" | "unavailable" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "unrecognized availability value '{other}'"
            ))),
        },
    }
}
