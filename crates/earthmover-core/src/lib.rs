//! earthmover-core - Core library for Earthmover
//!
//! This crate contains the session and booking models, the REST client for
//! the rental backend, the booking flow, and the polling coordinator used by
//! every Earthmover client surface.

pub mod api;
pub mod config;
pub mod error;
pub mod flow;
pub mod media;
pub mod models;
pub mod poller;
pub mod session;
pub mod util;

pub use api::{ApiClient, ApiError};
pub use error::{Error, Result};
pub use models::{Booking, BookingStatus, Machine};
pub use poller::{Poller, PollerConfig, Subscription};
pub use session::{Role, Session, SessionHandle};
