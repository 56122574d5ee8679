use std::env;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use earthmover_core::api::ApiClient;
use earthmover_core::config::{resolve_api_url, API_URL_ENV, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use earthmover_core::media::ProfilePhoto;
use earthmover_core::models::{Booking, Machine};
use earthmover_core::Session;
use serde::Serialize;

use crate::error::CliError;
use crate::session_store;

/// Everything a networked command needs: the configured client and the
/// session file location.
pub struct CliContext {
    pub api: ApiClient,
    pub session_path: PathBuf,
}

impl CliContext {
    pub fn new(api_url_flag: Option<&str>) -> Result<Self, CliError> {
        let config_path = default_config_path()?;
        let env_value = env::var(API_URL_ENV).ok();
        let (api_url, origin) = resolve_api_url(api_url_flag, env_value.as_deref(), &config_path)?;
        tracing::debug!(%api_url, %origin, "Resolved backend");
        Ok(Self {
            api: ApiClient::new(&api_url)?,
            session_path: session_store::default_session_path()?,
        })
    }

    pub fn restore_session(&self) -> Result<Session, CliError> {
        session_store::load(&self.session_path)?.ok_or(CliError::NotSignedIn)
    }

    pub fn require_operator(&self) -> Result<Session, CliError> {
        let session = self.restore_session()?;
        if session.is_operator() {
            Ok(session)
        } else {
            Err(CliError::OperatorOnly(session.role.to_string()))
        }
    }
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    let dir = dirs::config_dir().ok_or(CliError::NoConfigDir)?;
    Ok(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// The booking list the signed-in account is entitled to see.
pub async fn bookings_for(api: &ApiClient, session: &Session) -> Result<Vec<Booking>, CliError> {
    let list = if session.is_operator() {
        api.operator_bookings(session.user_id).await?
    } else {
        api.user_bookings(session.user_id).await?
    };
    Ok(list)
}

pub async fn find_booking(
    api: &ApiClient,
    session: &Session,
    booking_id: i64,
) -> Result<Booking, CliError> {
    let bookings = bookings_for(api, session).await?;
    bookings
        .into_iter()
        .find(|booking| booking.id == booking_id)
        .ok_or(CliError::BookingNotFound(booking_id))
}

pub fn parse_time(text: &str) -> Result<NaiveTime, CliError> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .map_err(|_| CliError::InvalidTime(text.to_string()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn format_machine_lines(machines: &[Machine]) -> Vec<String> {
    machines
        .iter()
        .map(|machine| {
            let availability = if machine.available {
                "available"
            } else {
                "unavailable"
            };
            format!(
                "{:<5} {:<24} {:<12} {:>8.2}/h  {availability}",
                machine.id, machine.model_name, machine.equipment_type, machine.price_per_hour
            )
        })
        .collect()
}

pub fn format_booking_lines(bookings: &[Booking]) -> Vec<String> {
    bookings
        .iter()
        .map(|booking| {
            format!(
                "{:<5} {:<12} {:<20} {} {}  {:>5.1}h {:>10.2}",
                booking.id,
                booking.status.as_str(),
                booking.machine_model,
                booking.scheduled_date,
                booking.scheduled_time.format("%H:%M"),
                booking.total_hours,
                booking.total_amount
            )
        })
        .collect()
}

pub fn load_photo(path: &Path) -> Result<ProfilePhoto, CliError> {
    let bytes = std::fs::read(path)?;
    ProfilePhoto::from_bytes(bytes).map_err(|source| CliError::Photo {
        path: path.to_path_buf(),
        source,
    })
}
