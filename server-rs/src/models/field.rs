use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::booking::TimeRange;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: i32,
    pub name: String,
    pub images: String,
    pub players_capacity: i32,
    pub location_address: String,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewField {
    pub name: String,
    pub images: String,
    pub players_capacity: i32,
    pub location_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeekDay {
    pub id: i32,
    pub name: String,
}

pub const SLOT_OVERLAP_MESSAGE: &str =
    "Slot times would overlap another booking on the same field";

/// Bookable time window template for a field on one week day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FieldSlot {
    pub id: i32,
    pub field_id: i32,
    pub week_day_id: i32,
    #[serde(with = "hhmm")]
    pub from_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub to_time: NaiveTime,
    pub price: f64,
}

impl FieldSlot {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.from_time, self.to_time)
    }
}

#[derive(Debug, Clone)]
pub struct NewFieldSlot {
    pub field_id: i32,
    pub week_day_id: i32,
    pub from_time: NaiveTime,
    pub to_time: NaiveTime,
    pub price: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBrowseQuery {
    pub location: Option<String>,
    pub min_players: Option<i32>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFieldRequest {
    pub name: Option<String>,
    pub images: Option<String>,
    pub players_capacity: Option<i32>,
    pub location_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldRequest {
    pub name: Option<String>,
    pub images: Option<String>,
    pub players_capacity: Option<i32>,
    pub location_address: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStatusRequest {
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub field_id: Option<i32>,
    pub week_day_id: Option<i32>,
    pub from_time: Option<String>,
    pub to_time: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSlotRequest {
    pub from_time: Option<String>,
    pub to_time: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldWithSlots {
    pub field: Field,
    pub available_time_slots: Vec<FieldSlot>,
}

/// `HH:mm` wire format for times of day.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}
