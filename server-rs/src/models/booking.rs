use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::field::{hhmm, FieldSlot, NewFieldSlot};

pub const STATUS_CANCELLED: &str = "cancelled";

/// Half-open time-of-day interval `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

impl TimeRange {
    pub fn new(from: NaiveTime, to: NaiveTime) -> Self {
        Self { from, to }
    }

    pub fn is_valid(&self) -> bool {
        self.from < self.to
    }

    /// Standard half-open intersection test; touching ends do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.from < other.to && self.to > other.from
    }
}

pub fn is_cancelled(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case(STATUS_CANCELLED)
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i32,
    pub player_id: i32,
    pub team_id: Option<i32>,
    pub date: NaiveDate,
    pub status: String,
    pub field_slot_id: i32,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub player_id: i32,
    pub team_id: Option<i32>,
    pub date: NaiveDate,
    pub status: String,
    pub price: f64,
}

/// Append-only audit row for a booking's status history.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusChange {
    pub id: i32,
    pub booking_id: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub cancelled_reason: Option<String>,
}

/// A booking together with the interval its slot occupies.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookedInterval {
    pub booking_id: i32,
    pub field_id: i32,
    pub date: NaiveDate,
    pub status: String,
    #[serde(with = "hhmm")]
    pub from_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub to_time: NaiveTime,
}

impl BookedInterval {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.from_time, self.to_time)
    }
}

/// Which slot a booking is committed against.
#[derive(Debug, Clone)]
pub enum SlotChoice {
    Existing(FieldSlot),
    New(NewFieldSlot),
}

impl SlotChoice {
    pub fn field_id(&self) -> i32 {
        match self {
            SlotChoice::Existing(slot) => slot.field_id,
            SlotChoice::New(slot) => slot.field_id,
        }
    }

    pub fn range(&self) -> TimeRange {
        match self {
            SlotChoice::Existing(slot) => slot.range(),
            SlotChoice::New(slot) => TimeRange::new(slot.from_time, slot.to_time),
        }
    }
}

#[derive(Debug, Clone)]
pub enum BookingCommit {
    Committed { slot: FieldSlot, booking: Booking },
    Conflict,
}

#[derive(Debug, Clone)]
pub enum StatusUpdate {
    Updated(Booking),
    NotFound,
    /// Reviving a cancelled booking would overlap a live one.
    Conflict,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub field_id: Option<i32>,
    pub team_id: Option<i32>,
    pub status: Option<String>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking, field_id: i32) -> bool {
        if let Some(from) = self.from_date {
            if booking.date < from {
                return false;
            }
        }
        if let Some(to) = self.to_date {
            if booking.date > to {
                return false;
            }
        }
        if let Some(fid) = self.field_id {
            if field_id != fid {
                return false;
            }
        }
        if let Some(tid) = self.team_id {
            if booking.team_id != Some(tid) {
                return false;
            }
        }
        if let Some(ref status) = self.status {
            if !booking.status.eq_ignore_ascii_case(status) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFieldRequest {
    pub week_day_id: i32,
    #[serde(with = "hhmm")]
    pub from: NaiveTime,
    #[serde(with = "hhmm")]
    pub to: NaiveTime,
    pub price: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamBookingRequest {
    pub team_id: Option<i32>,
    pub field_slot_id: Option<i32>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingHistoryQuery {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub field_id: Option<i32>,
    pub team_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub from: NaiveTime,
    #[serde(with = "hhmm")]
    pub to: NaiveTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub field_id: i32,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub from: NaiveTime,
    #[serde(with = "hhmm")]
    pub to: NaiveTime,
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewBookingRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}
