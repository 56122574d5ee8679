//! Booking record and its status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Raised when the backend sends a status string outside the known set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown booking status '{0}'")]
pub struct ParseStatusError(String);

/// Lifecycle status of a booking.
///
/// The backend is inconsistent about casing and spells the active state
/// several ways, so all inbound text goes through the single case-insensitive
/// parse in [`FromStr`]. Unknown values are an error, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
    Declined,
}

impl BookingStatus {
    /// All statuses, in lifecycle order. Handy for table-driven checks.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Accepted,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
        Self::Rejected,
        Self::Declined,
    ];

    /// Canonical wire spelling (lowercase snake form).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
            Self::Declined => "declined",
        }
    }

    /// A terminal booking never transitions again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Rejected | Self::Declined
        )
    }

    /// True while the rental is awaiting or performing work.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !self.is_terminal()
    }

    /// The booking state machine.
    ///
    /// Pending bookings wait on the operator's accept/decline (or an admin
    /// rejection); accepted and in-progress bookings can only finish or be
    /// cancelled. Terminal statuses admit no transition at all.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Accepted | Self::Declined | Self::Rejected),
            Self::Accepted => {
                matches!(next, Self::InProgress | Self::Completed | Self::Cancelled)
            }
            Self::InProgress => matches!(next, Self::Completed | Self::Cancelled),
            Self::Completed | Self::Cancelled | Self::Rejected | Self::Declined => false,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ParseStatusError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "in_progress" | "inprogress" | "active" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "rejected" => Ok(Self::Rejected),
            "declined" => Ok(Self::Declined),
            _ => Err(ParseStatusError(raw.trim().to_string())),
        }
    }
}

impl Serialize for BookingStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BookingStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One rental engagement between a customer and an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    /// Requesting customer.
    pub user_id: i64,
    /// Assigned operator; set once at matching time. The backend encodes
    /// "unassigned" as zero or a negative id, normalized to `None` here.
    #[serde(default, deserialize_with = "deserialize_operator_id")]
    pub operator_id: Option<i64>,
    pub machine_id: i64,
    #[serde(default)]
    pub machine_type: String,
    #[serde(default)]
    pub machine_model: String,
    #[serde(default)]
    pub location: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default)]
    pub total_amount: f64,
    pub status: BookingStatus,
}

impl Booking {
    #[must_use]
    pub fn operator_assigned(&self) -> bool {
        self.operator_id.is_some()
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

fn deserialize_operator_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.filter(|id| *id > 0))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn booking_json(status: &str, operator_id: i64) -> String {
        format!(
            r#"{{
                "id": 41,
                "user_id": 7,
                "operator_id": {operator_id},
                "machine_id": 3,
                "machine_type": "Excavator",
                "machine_model": "JCB 3DX",
                "location": "Baner Road",
                "scheduled_date": "2024-07-14",
                "scheduled_time": "09:00:00",
                "duration_minutes": 150,
                "total_hours": 2.5,
                "total_amount": 1500.0,
                "status": "{status}"
            }}"#
        )
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!("PENDING".parse(), Ok(BookingStatus::Pending));
        assert_eq!("Pending".parse(), Ok(BookingStatus::Pending));
        assert_eq!(" accepted ".parse(), Ok(BookingStatus::Accepted));
        assert_eq!("COMPLETED".parse(), Ok(BookingStatus::Completed));
    }

    #[test]
    fn status_parse_folds_active_spellings() {
        assert_eq!("active".parse(), Ok(BookingStatus::InProgress));
        assert_eq!("ACTIVE".parse(), Ok(BookingStatus::InProgress));
        assert_eq!("in_progress".parse(), Ok(BookingStatus::InProgress));
        assert_eq!("In Progress".parse(), Ok(BookingStatus::InProgress));
        assert_eq!("InProgress".parse(), Ok(BookingStatus::InProgress));
    }

    #[test]
    fn status_parse_accepts_both_cancelled_spellings() {
        assert_eq!("cancelled".parse(), Ok(BookingStatus::Cancelled));
        assert_eq!("canceled".parse(), Ok(BookingStatus::Cancelled));
    }

    #[test]
    fn status_parse_rejects_unknown_values() {
        let error = "on_hold".parse::<BookingStatus>().unwrap_err();
        assert_eq!(error.to_string(), "Unknown booking status 'on_hold'");
        assert!("".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn terminal_statuses_admit_no_transition() {
        for status in BookingStatus::ALL {
            if !status.is_terminal() {
                continue;
            }
            for next in BookingStatus::ALL {
                assert!(
                    !status.can_transition_to(next),
                    "{status} must not transition to {next}"
                );
            }
        }
    }

    #[test]
    fn pending_transitions_only_to_operator_decisions() {
        let pending = BookingStatus::Pending;
        assert!(pending.can_transition_to(BookingStatus::Accepted));
        assert!(pending.can_transition_to(BookingStatus::Declined));
        assert!(pending.can_transition_to(BookingStatus::Rejected));
        assert!(!pending.can_transition_to(BookingStatus::Completed));
        assert!(!pending.can_transition_to(BookingStatus::Cancelled));
        assert!(!pending.can_transition_to(BookingStatus::Pending));
    }

    #[test]
    fn open_bookings_can_finish_or_cancel() {
        for status in [BookingStatus::Accepted, BookingStatus::InProgress] {
            assert!(status.can_transition_to(BookingStatus::Completed));
            assert!(status.can_transition_to(BookingStatus::Cancelled));
            assert!(!status.can_transition_to(BookingStatus::Pending));
        }
        assert!(BookingStatus::Accepted.can_transition_to(BookingStatus::InProgress));
        assert!(!BookingStatus::InProgress.can_transition_to(BookingStatus::Accepted));
    }

    #[test]
    fn status_serializes_to_canonical_form() {
        let raw = serde_json::to_string(&BookingStatus::InProgress).unwrap();
        assert_eq!(raw, r#""in_progress""#);
    }

    #[test]
    fn booking_decodes_with_mixed_case_status() {
        let booking: Booking = serde_json::from_str(&booking_json("ACTIVE", 12)).unwrap();
        assert_eq!(booking.status, BookingStatus::InProgress);
        assert_eq!(booking.operator_id, Some(12));
        assert_eq!(booking.scheduled_date.to_string(), "2024-07-14");
    }

    #[test]
    fn zero_or_negative_operator_id_reads_as_unassigned() {
        let unassigned: Booking = serde_json::from_str(&booking_json("pending", 0)).unwrap();
        assert_eq!(unassigned.operator_id, None);
        assert!(!unassigned.operator_assigned());

        let negative: Booking = serde_json::from_str(&booking_json("pending", -1)).unwrap();
        assert_eq!(negative.operator_id, None);
    }

    #[test]
    fn unknown_status_fails_the_decode() {
        let result = serde_json::from_str::<Booking>(&booking_json("weird", 12));
        assert!(result.is_err());
    }
}
