//! Summaries derived from booking lists.
//!
//! The backend exposes no dashboard or earnings endpoint; both views are
//! computed client-side from the booking lists the poller already fetches.

use serde::Serialize;

use super::{Booking, BookingStatus};

/// Customer-facing dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_bookings: usize,
    pub pending: usize,
    /// Accepted or in progress.
    pub active: usize,
    pub completed: usize,
    /// Cancelled, rejected, or declined.
    pub cancelled_or_declined: usize,
    /// Sum of `total_amount` over completed bookings.
    pub total_spent: f64,
}

impl DashboardSummary {
    #[must_use]
    pub fn from_bookings(bookings: &[Booking]) -> Self {
        let mut pending = 0;
        let mut active = 0;
        let mut completed = 0;
        let mut cancelled_or_declined = 0;
        let mut total_spent = 0.0;

        for booking in bookings {
            match booking.status {
                BookingStatus::Pending => pending += 1,
                BookingStatus::Accepted | BookingStatus::InProgress => active += 1,
                BookingStatus::Completed => {
                    completed += 1;
                    total_spent += booking.total_amount;
                }
                BookingStatus::Cancelled | BookingStatus::Rejected | BookingStatus::Declined => {
                    cancelled_or_declined += 1;
                }
            }
        }

        Self {
            total_bookings: bookings.len(),
            pending,
            active,
            completed,
            cancelled_or_declined,
            total_spent,
        }
    }
}

/// Operator-facing earnings counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EarningsSummary {
    pub completed_jobs: usize,
    /// Sum of `total_amount` over completed jobs.
    pub total_earned: f64,
    /// Accepted or in-progress jobs still open.
    pub open_jobs: usize,
    /// Amount tied up in open jobs.
    pub outstanding_amount: f64,
}

impl EarningsSummary {
    #[must_use]
    pub fn from_bookings(bookings: &[Booking]) -> Self {
        let mut summary = Self::default();
        for booking in bookings {
            match booking.status {
                BookingStatus::Completed => {
                    summary.completed_jobs += 1;
                    summary.total_earned += booking.total_amount;
                }
                BookingStatus::Accepted | BookingStatus::InProgress => {
                    summary.open_jobs += 1;
                    summary.outstanding_amount += booking.total_amount;
                }
                BookingStatus::Pending
                | BookingStatus::Cancelled
                | BookingStatus::Rejected
                | BookingStatus::Declined => {}
            }
        }
        summary
    }
}
