//! Data models for Earthmover

mod account;
mod booking;
mod machine;
mod summary;

pub use account::{AccountProfile, OperatorRef};
pub use booking::{Booking, BookingStatus, ParseStatusError};
pub use machine::Machine;
pub use summary::{DashboardSummary, EarningsSummary};
