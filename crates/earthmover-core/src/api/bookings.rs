//! Booking retrieval and mutation.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use super::{ApiClient, ApiResult};
use crate::models::{Booking, BookingStatus};

/// Payload for creating a booking. Always submitted as `Pending`; the
/// `request_token` lets the backend drop accidental duplicates.
#[derive(Debug, Clone, Serialize)]
pub struct BookingRequest {
    pub user_id: i64,
    pub operator_id: i64,
    pub machine_id: i64,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: u32,
    pub total_hours: f64,
    pub total_amount: f64,
    pub location: String,
    pub status: BookingStatus,
    pub request_token: Uuid,
}

#[derive(Debug, Clone, Serialize)]
struct AcceptPayload {
    operator_id: i64,
    request_token: Uuid,
}

#[derive(Debug, Clone, Serialize)]
struct ActionPayload {
    request_token: Uuid,
}

impl ApiClient {
    /// Bookings requested by a customer.
    pub async fn user_bookings(&self, user_id: i64) -> ApiResult<Vec<Booking>> {
        self.get_data(&format!("v1/users/{user_id}/bookings")).await
    }

    /// Bookings assigned to an operator.
    pub async fn operator_bookings(&self, operator_id: i64) -> ApiResult<Vec<Booking>> {
        self.get_data(&format!("v1/operators/{operator_id}/bookings"))
            .await
    }

    /// Submit a new booking; returns the created record.
    pub async fn create_booking(&self, request: &BookingRequest) -> ApiResult<Booking> {
        self.post_data("v1/bookings", request).await
    }

    pub async fn accept_booking(
        &self,
        booking_id: i64,
        operator_id: i64,
        request_token: Uuid,
    ) -> ApiResult<String> {
        let payload = AcceptPayload {
            operator_id,
            request_token,
        };
        self.post_ack(&format!("v1/bookings/{booking_id}/accept"), &payload)
            .await
    }

    pub async fn decline_booking(&self, booking_id: i64, request_token: Uuid) -> ApiResult<String> {
        self.post_ack(
            &format!("v1/bookings/{booking_id}/decline"),
            &ActionPayload { request_token },
        )
        .await
    }

    pub async fn complete_booking(&self, booking_id: i64, request_token: Uuid) -> ApiResult<String> {
        self.post_ack(
            &format!("v1/bookings/{booking_id}/complete"),
            &ActionPayload { request_token },
        )
        .await
    }

    pub async fn cancel_booking(&self, booking_id: i64, request_token: Uuid) -> ApiResult<String> {
        self.post_ack(
            &format!("v1/bookings/{booking_id}/cancel"),
            &ActionPayload { request_token },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    use super::*;
    use crate::api::decode_envelope;

    #[test]
    fn booking_request_serializes_pending_with_token() {
        let request = BookingRequest {
            user_id: 7,
            operator_id: 12,
            machine_id: 3,
            scheduled_date: NaiveDate::from_ymd_opt(2024, 7, 14).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            duration_minutes: 150,
            total_hours: 2.5,
            total_amount: 1500.0,
            location: "Baner Road".to_string(),
            status: BookingStatus::Pending,
            request_token: Uuid::now_v7(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["scheduled_date"], "2024-07-14");
        assert!(value["request_token"].is_string());
    }

    #[test]
    fn booking_list_decodes_from_the_envelope() {
        let body = r#"{
            "success": true,
            "data": [{
                "id": 41,
                "user_id": 7,
                "operator_id": 12,
                "machine_id": 3,
                "machine_type": "Excavator",
                "machine_model": "JCB 3DX",
                "location": "Baner Road",
                "scheduled_date": "2024-07-14",
                "scheduled_time": "09:00:00",
                "duration_minutes": 150,
                "total_hours": 2.5,
                "total_amount": 1500.0,
                "status": "PENDING"
            }]
        }"#;
        let bookings: Vec<Booking> = decode_envelope(StatusCode::OK, body).unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].status, BookingStatus::Pending);
    }
}
