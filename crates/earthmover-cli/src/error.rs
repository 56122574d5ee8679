use std::io;
use std::path::PathBuf;

use earthmover_core::api::ApiError;
use earthmover_core::config::ConfigError;
use earthmover_core::flow::FlowError;
use earthmover_core::media::PhotoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Photo at {path}: {source}")]
    Photo { path: PathBuf, source: PhotoError },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Not signed in. Run 'earthmover auth login' first.")]
    NotSignedIn,
    #[error("This command needs an operator session; you are signed in as {0}")]
    OperatorOnly(String),
    #[error("Could not determine the config directory for this platform")]
    NoConfigDir,
    #[error("Invalid time '{0}'; expected HH:MM")]
    InvalidTime(String),
    #[error("Booking {0} was not found in your list")]
    BookingNotFound(i64),
}
