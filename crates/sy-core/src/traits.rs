//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the binary.
//! They are handed to the planner and the disambiguation flow explicitly,
//! so both can be tested against mocks without a live backend.

use crate::models::{Trip, TripLocation, Tripbit};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// Data persistence contract for trips and their locations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TripRepo: Send + Sync {
    // Trip Operations
    async fn create_trip(&self, trip: Trip) -> anyhow::Result<()>;
    async fn get_trip(&self, id: Uuid) -> anyhow::Result<Option<Trip>>;

    // Location Operations
    /// Locations in storage order; callers sort them for display.
    async fn list_locations(&self, trip_id: Uuid) -> anyhow::Result<Vec<TripLocation>>;
    async fn create_location(&self, location: TripLocation) -> anyhow::Result<()>;
    async fn update_location_dates(
        &self,
        id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> anyhow::Result<()>;
    /// Rewrites `order_index` for every `(location_id, order_index)` pair atomically.
    async fn update_location_order(&self, trip_id: Uuid, order: Vec<(Uuid, i32)>) -> anyhow::Result<()>;
    /// Removes the location together with every tripbit scoped to it.
    async fn delete_location(&self, id: Uuid) -> anyhow::Result<()>;
}

/// Data persistence contract for itinerary items.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TripbitRepo: Send + Sync {
    async fn create_tripbit(&self, tripbit: Tripbit) -> anyhow::Result<()>;
    async fn get_tripbit(&self, id: Uuid) -> anyhow::Result<Option<Tripbit>>;
    async fn list_tripbits(&self, trip_id: Uuid) -> anyhow::Result<Vec<Tripbit>>;
    async fn update_tripbit(&self, tripbit: Tripbit) -> anyhow::Result<()>;
    async fn delete_tripbit(&self, id: Uuid) -> anyhow::Result<()>;
}
