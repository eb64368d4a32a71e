//! seeya/crates/sy-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Seeya:
//! trip/location/tripbit models, storage ports, the date-range matcher
//! and the location disambiguation flow.

pub mod disambiguation;
pub mod error;
pub mod matcher;
pub mod models;
pub mod planner;
pub mod traits;

// Re-exporting for easier access in other crates
pub use disambiguation::*;
pub use error::*;
pub use matcher::*;
pub use models::*;
pub use planner::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    #[test]
    fn test_draft_finalization_v7() {
        let trip_id = Uuid::now_v7();
        let draft = TripbitDraft {
            trip_id,
            created_by: Uuid::now_v7(),
            title: "Dinner at Ramiro".to_string(),
            url: Some("https://example.com/ramiro".to_string()),
            description: None,
            start_date: None,
            end_date: None,
            details: TripbitDetails::Reservation(ReservationDetails {
                party_size: Some(4),
                ..Default::default()
            }),
            participants: vec![],
            position: Some(2),
            attachments: vec![],
        };
        let location_id = Uuid::now_v7();
        let tripbit = draft.into_tripbit(Uuid::now_v7(), Some(location_id));
        assert_eq!(tripbit.trip_id, trip_id);
        assert_eq!(tripbit.location_id, Some(location_id));
        assert_eq!(tripbit.category(), TripbitCategory::Reservation);
        assert_eq!(tripbit.id.get_version_num(), 7);
    }

    #[test]
    fn test_tripbit_json_carries_inline_category() {
        let tripbit = TripbitDraft {
            trip_id: Uuid::nil(),
            created_by: Uuid::nil(),
            title: "Lisbon to Porto".to_string(),
            url: None,
            description: None,
            start_date: None,
            end_date: None,
            details: TripbitDetails::Transportation(TransportationDetails {
                mode: Some("train".to_string()),
                ..Default::default()
            }),
            participants: vec![],
            position: None,
            attachments: vec![],
        }
        .into_tripbit(Uuid::now_v7(), None);

        let json = serde_json::to_value(&tripbit).unwrap();
        assert_eq!(json["category"], "transportation");
        assert_eq!(json["mode"], "train");
        assert!(json["location_id"].is_null());

        let back: Tripbit = serde_json::from_value(json).unwrap();
        assert_eq!(back, tripbit);
    }

    #[test]
    fn test_backwards_range_is_rejected() {
        let d = |day| chrono::NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
        assert!(ensure_date_order(Some(d(2)), Some(d(1))).is_err());
        assert!(ensure_date_order(Some(d(1)), Some(d(1))).is_ok());
        assert!(ensure_date_order(None, Some(d(1))).is_ok());
    }
}
