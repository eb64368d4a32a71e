//! # Trip Planner
//!
//! Orchestrates trips, their stops and their tripbits on top of the ports,
//! enforcing the invariants the storage layer does not know about.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::info;
use uuid::Uuid;

use crate::disambiguation::{validate_draft, LocationChoice, LocationDisambiguator};
use crate::error::{AppError, Result};
use crate::matcher::sort_chronologically;
use crate::models::{ensure_date_order, Trip, TripLocation, Tripbit, TripbitDraft};
use crate::traits::{TripRepo, TripbitRepo};

pub struct TripPlanner {
    trips: Arc<dyn TripRepo>,
    tripbits: Arc<dyn TripbitRepo>,
}

impl TripPlanner {
    pub fn new(trips: Arc<dyn TripRepo>, tripbits: Arc<dyn TripbitRepo>) -> Self {
        Self { trips, tripbits }
    }

    pub async fn create_trip(&self, owner_id: Uuid, name: &str, description: Option<String>) -> Result<Trip> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("trip name must not be empty".to_string()));
        }
        let trip = Trip {
            id: Uuid::now_v7(),
            owner_id,
            name: name.to_string(),
            description,
            participants: vec![],
            created_at: Utc::now(),
        };
        self.trips.create_trip(trip.clone()).await.map_err(AppError::Persistence)?;
        info!("trip {} created by {}", trip.id, owner_id);
        Ok(trip)
    }

    pub async fn trip(&self, trip_id: Uuid) -> Result<Trip> {
        self.trips
            .get_trip(trip_id)
            .await
            .map_err(AppError::Persistence)?
            .ok_or_else(|| AppError::NotFound("Trip".to_string(), trip_id.to_string()))
    }

    /// The trip's stops in timeline order, ready to feed the matcher.
    pub async fn locations(&self, trip_id: Uuid) -> Result<Vec<TripLocation>> {
        self.trip(trip_id).await?;
        let mut locations = self.trips.list_locations(trip_id).await.map_err(AppError::Persistence)?;
        sort_chronologically(&mut locations);
        Ok(locations)
    }

    /// Appends a stop after the existing ones.
    pub async fn add_location(
        &self,
        trip_id: Uuid,
        name: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<TripLocation> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("destination must not be empty".to_string()));
        }
        ensure_date_order(start_date, end_date)?;
        self.trip(trip_id).await?;

        let existing = self.trips.list_locations(trip_id).await.map_err(AppError::Persistence)?;
        let order_index = existing.iter().map(|l| l.order_index + 1).max().unwrap_or(0);

        let location = TripLocation {
            id: Uuid::now_v7(),
            trip_id,
            name: name.to_string(),
            order_index,
            start_date,
            end_date,
        };
        self.trips.create_location(location.clone()).await.map_err(AppError::Persistence)?;
        Ok(location)
    }

    pub async fn update_location_dates(
        &self,
        trip_id: Uuid,
        location_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<TripLocation> {
        ensure_date_order(start_date, end_date)?;
        let mut location = self.location(trip_id, location_id).await?;

        self.trips
            .update_location_dates(location_id, start_date, end_date)
            .await
            .map_err(AppError::Persistence)?;
        location.start_date = start_date;
        location.end_date = end_date;
        Ok(location)
    }

    /// Drag-and-drop reorder: moves the stop at display position `from` to `to`
    /// and rewrites every order index. Returns the stops in their new order.
    pub async fn move_location(&self, trip_id: Uuid, from: usize, to: usize) -> Result<Vec<TripLocation>> {
        self.trip(trip_id).await?;
        let mut locations = self.trips.list_locations(trip_id).await.map_err(AppError::Persistence)?;
        locations.sort_by_key(|l| l.order_index);

        let reordered = apply_move(locations, from, to)?;
        let order = reordered.iter().map(|l| (l.id, l.order_index)).collect();
        self.trips
            .update_location_order(trip_id, order)
            .await
            .map_err(AppError::Persistence)?;
        Ok(reordered)
    }

    /// Deletes a stop; tripbits scoped to it go with it.
    pub async fn remove_location(&self, trip_id: Uuid, location_id: Uuid) -> Result<()> {
        self.location(trip_id, location_id).await?;
        self.trips.delete_location(location_id).await.map_err(AppError::Persistence)?;
        info!("location {location_id} removed from trip {trip_id}");
        Ok(())
    }

    /// A fresh creation flow bound to this planner's tripbit storage.
    pub fn disambiguator(&self) -> LocationDisambiguator {
        LocationDisambiguator::new(Arc::clone(&self.tripbits))
    }

    /// Resolves a pending flow for `trip_id`. A chosen stop that was removed
    /// while the choice was pending is withdrawn from the offer and rejected,
    /// leaving the flow pending so another stop can be picked.
    pub async fn choose_location(
        &self,
        trip_id: Uuid,
        flow: &mut LocationDisambiguator,
        choice: LocationChoice,
    ) -> Result<Tripbit> {
        if let LocationChoice::Location(location_id) = choice {
            if flow.candidates().iter().any(|c| c.id == location_id) {
                if let Err(AppError::NotFound(..)) = self.location(trip_id, location_id).await {
                    flow.forget_candidate(location_id);
                    info!("stop {location_id} vanished while a choice was pending on trip {trip_id}");
                    return Err(AppError::ValidationError(format!(
                        "location {location_id} was removed from the trip; pick another stop"
                    )));
                }
            }
        }
        flow.choose(choice).await
    }

    /// Itinerary order: explicit position first, then date, then creation time.
    pub async fn tripbits(&self, trip_id: Uuid) -> Result<Vec<Tripbit>> {
        self.trip(trip_id).await?;
        let mut tripbits = self.tripbits.list_tripbits(trip_id).await.map_err(AppError::Persistence)?;
        tripbits.sort_by(|a, b| {
            let pos = |t: &Tripbit| (t.position.is_none(), t.position);
            let date = |t: &Tripbit| (t.start_date.is_none(), t.start_date);
            pos(a)
                .cmp(&pos(b))
                .then_with(|| date(a).cmp(&date(b)))
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(tripbits)
    }

    /// Saves an edited tripbit. The owning trip, creator and creation time
    /// are kept from the stored copy.
    pub async fn update_tripbit(&self, trip_id: Uuid, mut tripbit: Tripbit) -> Result<Tripbit> {
        let stored = self.stored_tripbit(trip_id, tripbit.id).await?;
        tripbit.trip_id = stored.trip_id;
        tripbit.created_by = stored.created_by;
        tripbit.created_at = stored.created_at;

        if tripbit.title.trim().is_empty() {
            return Err(AppError::ValidationError("title must not be empty".to_string()));
        }
        ensure_date_order(tripbit.start_date, tripbit.end_date)?;
        if let Some(location_id) = tripbit.location_id {
            match self.location(trip_id, location_id).await {
                Err(AppError::NotFound(..)) => {
                    return Err(AppError::ValidationError(format!(
                        "location {location_id} does not belong to trip {trip_id}"
                    )));
                }
                other => {
                    other?;
                }
            }
        }

        self.tripbits
            .update_tripbit(tripbit.clone())
            .await
            .map_err(AppError::Persistence)?;
        Ok(tripbit)
    }

    /// Only the creator of a tripbit may delete it.
    pub async fn delete_tripbit(&self, trip_id: Uuid, tripbit_id: Uuid, actor: Uuid) -> Result<()> {
        let stored = self.stored_tripbit(trip_id, tripbit_id).await?;
        if stored.created_by != actor {
            return Err(AppError::Unauthorized(format!(
                "tripbit {tripbit_id} can only be deleted by its creator"
            )));
        }
        self.tripbits.delete_tripbit(tripbit_id).await.map_err(AppError::Persistence)?;
        Ok(())
    }

    /// Checks a draft belongs to an existing trip before it enters a creation flow.
    pub async fn check_draft(&self, draft: &TripbitDraft) -> Result<()> {
        validate_draft(draft)?;
        self.trip(draft.trip_id).await.map(|_| ())
    }

    async fn location(&self, trip_id: Uuid, location_id: Uuid) -> Result<TripLocation> {
        self.trips
            .list_locations(trip_id)
            .await
            .map_err(AppError::Persistence)?
            .into_iter()
            .find(|l| l.id == location_id)
            .ok_or_else(|| AppError::NotFound("Location".to_string(), location_id.to_string()))
    }

    async fn stored_tripbit(&self, trip_id: Uuid, tripbit_id: Uuid) -> Result<Tripbit> {
        self.tripbits
            .get_tripbit(tripbit_id)
            .await
            .map_err(AppError::Persistence)?
            .filter(|t| t.trip_id == trip_id)
            .ok_or_else(|| AppError::NotFound("Tripbit".to_string(), tripbit_id.to_string()))
    }
}

/// Moves one entry of an ordered stop list and renumbers `order_index` as `0..n`.
pub fn apply_move(mut locations: Vec<TripLocation>, from: usize, to: usize) -> Result<Vec<TripLocation>> {
    let len = locations.len();
    if from >= len || to >= len {
        return Err(AppError::ValidationError(format!(
            "cannot move stop {from} to {to} in a trip with {len} stops"
        )));
    }
    let moved = locations.remove(from);
    locations.insert(to, moved);
    for (index, location) in locations.iter_mut().enumerate() {
        location.order_index = index as i32;
    }
    Ok(locations)
}
