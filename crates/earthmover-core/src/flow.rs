//! The customer booking flow and operator decision actions.
//!
//! Estimate, resolve the machine's operator, submit, and later drive the
//! accept/decline/complete/cancel transitions. Every mutation checks the
//! status state machine first and runs behind an in-flight guard, so a
//! double-tap cannot produce a duplicate request.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::api::{ApiClient, ApiError, ApiResult, BookingRequest};
use crate::models::{Booking, BookingStatus, Machine, OperatorRef};
use crate::session::{Role, Session};
use crate::util::normalize_text_option;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Could not parse duration '{0}'; expected text like '2 Hours 30 Min'")]
    InvalidDuration(String),
    #[error("Duration must be greater than zero")]
    ZeroDuration,
    #[error("Location is required")]
    EmptyLocation,
    #[error("No operator is available for machine {machine_id}")]
    NoOperatorAvailable { machine_id: i64 },
    #[error("Booking {booking_id} cannot move from {from} to {to}")]
    InvalidTransition {
        booking_id: i64,
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("Only operators can {0} bookings")]
    OperatorActionOnly(&'static str),
    #[error("An action for booking {0} is already in flight")]
    BookingInFlight(i64),
    #[error("A booking request for machine {0} is already in flight")]
    SubmissionInFlight(i64),
}

pub type FlowResult<T> = Result<T, FlowError>;

/// Parse duration text like `2 Hours 30 Min` into total minutes.
///
/// Hour and minute parts are each optional (at least one must be present),
/// case and unit spellings are flexible, and a bare number is taken as
/// minutes.
pub fn parse_duration_minutes(text: &str) -> FlowResult<u32> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FlowError::InvalidDuration(text.to_string()));
    }

    if let Ok(minutes) = trimmed.parse::<u32>() {
        if minutes == 0 {
            return Err(FlowError::ZeroDuration);
        }
        return Ok(minutes);
    }

    let pattern = Regex::new(r"(?i)^(?:(\d+)\s*h(?:(?:ou)?rs?)?)?\s*(?:(\d+)\s*m(?:in(?:ute)?s?)?)?$")
        .expect("Invalid regex");
    let captures = pattern
        .captures(trimmed)
        .ok_or_else(|| FlowError::InvalidDuration(trimmed.to_string()))?;
    if captures.get(1).is_none() && captures.get(2).is_none() {
        return Err(FlowError::InvalidDuration(trimmed.to_string()));
    }

    let part = |index: usize| -> FlowResult<u32> {
        captures.get(index).map_or(Ok(0), |digits| {
            digits
                .as_str()
                .parse()
                .map_err(|_| FlowError::InvalidDuration(trimmed.to_string()))
        })
    };
    let hours = part(1)?;
    let minutes = part(2)?;
    let total = hours
        .checked_mul(60)
        .and_then(|scaled| scaled.checked_add(minutes))
        .ok_or_else(|| FlowError::InvalidDuration(trimmed.to_string()))?;
    if total == 0 {
        return Err(FlowError::ZeroDuration);
    }
    Ok(total)
}

/// Estimated cost: per-minute rate times total minutes, rounded to the
/// nearest whole currency unit.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn estimate_cost(price_per_hour: f64, total_minutes: u32) -> i64 {
    ((price_per_hour / 60.0) * f64::from(total_minutes)).round() as i64
}

/// A price preview for one machine and duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub machine_id: i64,
    pub model_name: String,
    pub price_per_hour: f64,
    pub duration_minutes: u32,
    pub total_hours: f64,
    pub estimated_amount: i64,
}

impl CostEstimate {
    fn from_machine(machine: &Machine, minutes: u32) -> Self {
        Self {
            machine_id: machine.id,
            model_name: machine.model_name.clone(),
            price_per_hour: machine.price_per_hour,
            duration_minutes: minutes,
            total_hours: f64::from(minutes) / 60.0,
            estimated_amount: estimate_cost(machine.price_per_hour, minutes),
        }
    }
}

/// Inputs the customer supplies when requesting a booking.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub machine_id: i64,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_text: String,
    pub location: String,
}

/// The backend operations the flow depends on; [`ApiClient`] is the real
/// implementation, tests substitute counting stubs.
pub trait BookingBackend: Send + Sync {
    fn fetch_machine(&self, machine_id: i64) -> impl Future<Output = ApiResult<Machine>> + Send;
    fn fetch_machine_operator(
        &self,
        machine_id: i64,
    ) -> impl Future<Output = ApiResult<OperatorRef>> + Send;
    fn submit_booking(
        &self,
        request: &BookingRequest,
    ) -> impl Future<Output = ApiResult<Booking>> + Send;
    fn send_accept(
        &self,
        booking_id: i64,
        operator_id: i64,
        request_token: Uuid,
    ) -> impl Future<Output = ApiResult<String>> + Send;
    fn send_decline(
        &self,
        booking_id: i64,
        request_token: Uuid,
    ) -> impl Future<Output = ApiResult<String>> + Send;
    fn send_complete(
        &self,
        booking_id: i64,
        request_token: Uuid,
    ) -> impl Future<Output = ApiResult<String>> + Send;
    fn send_cancel(
        &self,
        booking_id: i64,
        request_token: Uuid,
    ) -> impl Future<Output = ApiResult<String>> + Send;
}

impl BookingBackend for ApiClient {
    async fn fetch_machine(&self, machine_id: i64) -> ApiResult<Machine> {
        self.machine(machine_id).await
    }

    async fn fetch_machine_operator(&self, machine_id: i64) -> ApiResult<OperatorRef> {
        self.machine_operator(machine_id).await
    }

    async fn submit_booking(&self, request: &BookingRequest) -> ApiResult<Booking> {
        self.create_booking(request).await
    }

    async fn send_accept(
        &self,
        booking_id: i64,
        operator_id: i64,
        request_token: Uuid,
    ) -> ApiResult<String> {
        self.accept_booking(booking_id, operator_id, request_token)
            .await
    }

    async fn send_decline(&self, booking_id: i64, request_token: Uuid) -> ApiResult<String> {
        self.decline_booking(booking_id, request_token).await
    }

    async fn send_complete(&self, booking_id: i64, request_token: Uuid) -> ApiResult<String> {
        self.complete_booking(booking_id, request_token).await
    }

    async fn send_cancel(&self, booking_id: i64, request_token: Uuid) -> ApiResult<String> {
        self.cancel_booking(booking_id, request_token).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum InflightKey {
    Booking(i64),
    Submission(i64),
}

/// Drives the booking lifecycle against a [`BookingBackend`].
pub struct BookingFlow<B = ApiClient> {
    backend: B,
    inflight: Mutex<HashSet<InflightKey>>,
}

impl<B: BookingBackend> BookingFlow<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            inflight: Mutex::new(HashSet::new()),
        }
    }

    /// Price preview for a machine and duration text.
    pub async fn prepare_estimate(
        &self,
        machine_id: i64,
        duration_text: &str,
    ) -> FlowResult<CostEstimate> {
        let minutes = parse_duration_minutes(duration_text)?;
        let machine = self.backend.fetch_machine(machine_id).await?;
        Ok(CostEstimate::from_machine(&machine, minutes))
    }

    /// Look up the operator assigned to a machine. A machine without one
    /// terminates the flow with [`FlowError::NoOperatorAvailable`].
    pub async fn resolve_operator(&self, machine_id: i64) -> FlowResult<OperatorRef> {
        match self.backend.fetch_machine_operator(machine_id).await {
            Err(ApiError::NoOperatorAssigned { machine_id }) => {
                Err(FlowError::NoOperatorAvailable { machine_id })
            }
            result => Ok(result?),
        }
    }

    /// Run the full submission: validate, price, resolve the operator, and
    /// post the pending booking. No request is submitted when operator
    /// resolution fails.
    #[allow(clippy::cast_precision_loss)]
    pub async fn submit(&self, session: &Session, draft: &BookingDraft) -> FlowResult<Booking> {
        let minutes = parse_duration_minutes(&draft.duration_text)?;
        let location = normalize_text_option(Some(draft.location.clone()))
            .ok_or(FlowError::EmptyLocation)?;

        let machine = self.backend.fetch_machine(draft.machine_id).await?;
        let operator = self.resolve_operator(machine.id).await?;

        let _guard = self.begin(InflightKey::Submission(machine.id))?;
        let request = BookingRequest {
            user_id: session.user_id,
            operator_id: operator.id,
            machine_id: machine.id,
            scheduled_date: draft.scheduled_date,
            scheduled_time: draft.scheduled_time,
            duration_minutes: minutes,
            total_hours: f64::from(minutes) / 60.0,
            total_amount: estimate_cost(machine.price_per_hour, minutes) as f64,
            location,
            status: BookingStatus::Pending,
            request_token: Uuid::now_v7(),
        };
        Ok(self.backend.submit_booking(&request).await?)
    }

    /// Operator accepts a pending booking.
    pub async fn accept(&self, session: &Session, booking: &Booking) -> FlowResult<String> {
        if session.role != Role::Operator {
            return Err(FlowError::OperatorActionOnly("accept"));
        }
        self.check_transition(booking, BookingStatus::Accepted)?;
        let _guard = self.begin(InflightKey::Booking(booking.id))?;
        Ok(self
            .backend
            .send_accept(booking.id, session.user_id, Uuid::now_v7())
            .await?)
    }

    /// Operator declines a pending booking.
    pub async fn decline(&self, session: &Session, booking: &Booking) -> FlowResult<String> {
        if session.role != Role::Operator {
            return Err(FlowError::OperatorActionOnly("decline"));
        }
        self.check_transition(booking, BookingStatus::Declined)?;
        let _guard = self.begin(InflightKey::Booking(booking.id))?;
        Ok(self
            .backend
            .send_decline(booking.id, Uuid::now_v7())
            .await?)
    }

    /// Mark an accepted or in-progress booking as completed.
    pub async fn complete(&self, booking: &Booking) -> FlowResult<String> {
        self.check_transition(booking, BookingStatus::Completed)?;
        let _guard = self.begin(InflightKey::Booking(booking.id))?;
        Ok(self
            .backend
            .send_complete(booking.id, Uuid::now_v7())
            .await?)
    }

    /// Cancel an accepted or in-progress booking.
    pub async fn cancel(&self, booking: &Booking) -> FlowResult<String> {
        self.check_transition(booking, BookingStatus::Cancelled)?;
        let _guard = self.begin(InflightKey::Booking(booking.id))?;
        Ok(self.backend.send_cancel(booking.id, Uuid::now_v7()).await?)
    }

    fn check_transition(&self, booking: &Booking, target: BookingStatus) -> FlowResult<()> {
        if booking.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(FlowError::InvalidTransition {
                booking_id: booking.id,
                from: booking.status,
                to: target,
            })
        }
    }

    fn begin(&self, key: InflightKey) -> FlowResult<InflightGuard<'_, B>> {
        let mut inflight = self
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !inflight.insert(key) {
            return Err(match key {
                InflightKey::Booking(id) => FlowError::BookingInFlight(id),
                InflightKey::Submission(id) => FlowError::SubmissionInFlight(id),
            });
        }
        Ok(InflightGuard { flow: self, key })
    }
}

/// Releases the in-flight slot when the request finishes, success or not,
/// so a failed action can always be retried.
struct InflightGuard<'a, B> {
    flow: &'a BookingFlow<B>,
    key: InflightKey,
}

impl<B> Drop for InflightGuard<'_, B> {
    fn drop(&mut self) {
        let mut inflight = self
            .flow
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        inflight.remove(&self.key);
    }
}
