//! # Domain Models
//!
//! These structs represent the core entities of Seeya.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// A travel plan owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub participants: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One leg/stop of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripLocation {
    pub id: Uuid,
    pub trip_id: Uuid,
    /// Destination as entered by the user (e.g., "Lisbon")
    pub name: String,
    /// Display order within the trip, unique per trip
    pub order_index: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TripLocation {
    /// Both ends of the stay, if the leg is fully dated.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start_date?, self.end_date?))
    }
}

/// Closed set of tripbit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripbitCategory {
    Flight,
    Stay,
    Activity,
    Reservation,
    Transportation,
    Document,
    Money,
    Photos,
    Other,
}

impl TripbitCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripbitCategory::Flight => "flight",
            TripbitCategory::Stay => "stay",
            TripbitCategory::Activity => "activity",
            TripbitCategory::Reservation => "reservation",
            TripbitCategory::Transportation => "transportation",
            TripbitCategory::Document => "document",
            TripbitCategory::Money => "money",
            TripbitCategory::Photos => "photos",
            TripbitCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightDetails {
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub confirmation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StayDetails {
    pub property_name: Option<String>,
    pub address: Option<String>,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub confirmation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityDetails {
    pub venue: Option<String>,
    pub address: Option<String>,
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationDetails {
    pub venue: Option<String>,
    pub reservation_time: Option<String>,
    pub party_size: Option<u32>,
    pub confirmation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportationDetails {
    /// train, bus, ferry, car rental...
    pub mode: Option<String>,
    pub provider: Option<String>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub departure_time: Option<String>,
    pub confirmation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentDetails {
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub expires_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneyDetails {
    /// Payment app or split service (e.g., "Splitwise")
    pub provider: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotosDetails {
    pub service: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherDetails {
    pub notes: Option<String>,
}

/// Category-specific fields of a tripbit.
///
/// The variant *is* the category, so a flight can never carry hotel fields.
/// Serialized with an inline tag: `{"category": "flight", "airline": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum TripbitDetails {
    Flight(FlightDetails),
    Stay(StayDetails),
    Activity(ActivityDetails),
    Reservation(ReservationDetails),
    Transportation(TransportationDetails),
    Document(DocumentDetails),
    Money(MoneyDetails),
    Photos(PhotosDetails),
    Other(OtherDetails),
}

impl TripbitDetails {
    pub fn category(&self) -> TripbitCategory {
        match self {
            TripbitDetails::Flight(_) => TripbitCategory::Flight,
            TripbitDetails::Stay(_) => TripbitCategory::Stay,
            TripbitDetails::Activity(_) => TripbitCategory::Activity,
            TripbitDetails::Reservation(_) => TripbitCategory::Reservation,
            TripbitDetails::Transportation(_) => TripbitCategory::Transportation,
            TripbitDetails::Document(_) => TripbitCategory::Document,
            TripbitDetails::Money(_) => TripbitCategory::Money,
            TripbitDetails::Photos(_) => TripbitCategory::Photos,
            TripbitDetails::Other(_) => TripbitCategory::Other,
        }
    }
}

/// A file uploaded alongside a tripbit. Only the object storage path is kept here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub path: String,
    pub file_name: String,
    pub content_type: Option<String>,
}

/// An itinerary item: flight, stay, activity, reservation...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tripbit {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// `None` means the item applies to the entire trip
    pub location_id: Option<Uuid>,
    #[serde(flatten)]
    pub details: TripbitDetails,
    #[serde(default)]
    pub participants: Vec<Uuid>,
    pub position: Option<i32>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl Tripbit {
    pub fn category(&self) -> TripbitCategory {
        self.details.category()
    }
}

/// A tripbit as filled in by the add dialog, before a location has been decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripbitDraft {
    pub trip_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub details: TripbitDetails,
    #[serde(default)]
    pub participants: Vec<Uuid>,
    pub position: Option<i32>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl TripbitDraft {
    /// Finalizes the draft under `id` with the decided location.
    pub fn into_tripbit(self, id: Uuid, location_id: Option<Uuid>) -> Tripbit {
        Tripbit {
            id,
            trip_id: self.trip_id,
            created_by: self.created_by,
            title: self.title,
            url: self.url,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            location_id,
            details: self.details,
            participants: self.participants,
            position: self.position,
            attachments: self.attachments,
            created_at: Utc::now(),
        }
    }
}

/// Dated ranges are closed intervals, so a start after the end is rejected.
pub fn ensure_date_order(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(AppError::ValidationError(format!(
            "start date {start} is after end date {end}"
        ))),
        _ => Ok(()),
    }
}
