//! # sy-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `sy-core` domain models.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use sy_core::models::{Trip, TripLocation, Tripbit, TripbitDetails};
use sy_core::traits::{TripRepo, TripbitRepo};
use uuid::Uuid;

const SCHEMA: &str = include_str!("schema.sql");

pub struct SqliteTripStore {
    pool: SqlitePool,
}

impl SqliteTripStore {
    /// Opens (or creates) the database at `database_url` and applies the schema.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` is a separate database, so keep exactly one alive.
        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        log::info!("SQLite store ready at {database_url}");
        Ok(Self { pool })
    }
}

// JSON columns hold lists and the category payload
fn to_json<T: serde::Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn from_json<T: serde::de::DeserializeOwned>(row: &SqliteRow, column: &str) -> anyhow::Result<T> {
    let raw: String = row.try_get(column)?;
    Ok(serde_json::from_str(&raw)?)
}

fn row_to_trip(row: &SqliteRow) -> anyhow::Result<Trip> {
    Ok(Trip {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        participants: from_json(row, "participants")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_location(row: &SqliteRow) -> anyhow::Result<TripLocation> {
    Ok(TripLocation {
        id: row.try_get("id")?,
        trip_id: row.try_get("trip_id")?,
        name: row.try_get("name")?,
        order_index: row.try_get("order_index")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
    })
}

fn row_to_tripbit(row: &SqliteRow) -> anyhow::Result<Tripbit> {
    let details: TripbitDetails = from_json(row, "details")?;
    Ok(Tripbit {
        id: row.try_get("id")?,
        trip_id: row.try_get("trip_id")?,
        created_by: row.try_get("created_by")?,
        title: row.try_get("title")?,
        url: row.try_get("url")?,
        description: row.try_get("description")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        location_id: row.try_get("location_id")?,
        details,
        participants: from_json(row, "participants")?,
        position: row.try_get("position")?,
        attachments: from_json(row, "attachments")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl TripRepo for SqliteTripStore {
    async fn create_trip(&self, trip: Trip) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO trips (id, owner_id, name, description, participants, created_at) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(trip.id)
            .bind(trip.owner_id)
            .bind(trip.name)
            .bind(trip.description)
            .bind(to_json(&trip.participants)?)
            .bind(trip.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_trip(&self, id: Uuid) -> anyhow::Result<Option<Trip>> {
        let row = sqlx::query("SELECT * FROM trips WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_trip).transpose()
    }

    async fn list_locations(&self, trip_id: Uuid) -> anyhow::Result<Vec<TripLocation>> {
        sqlx::query("SELECT * FROM trip_locations WHERE trip_id = ? ORDER BY order_index ASC")
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_location)
            .collect()
    }

    async fn create_location(&self, location: TripLocation) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO trip_locations (id, trip_id, name, order_index, start_date, end_date) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(location.id)
            .bind(location.trip_id)
            .bind(location.name)
            .bind(location.order_index)
            .bind(location.start_date)
            .bind(location.end_date)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_location_dates(
        &self,
        id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE trip_locations SET start_date = ?, end_date = ? WHERE id = ?")
            .bind(start_date)
            .bind(end_date)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Rewrites the order of a trip's stops.
    ///
    /// `order_index` is UNIQUE per trip, so every index is first parked on a
    /// negative value inside the same transaction before the final values land.
    async fn update_location_order(&self, trip_id: Uuid, order: Vec<(Uuid, i32)>) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE trip_locations SET order_index = -order_index - 1 WHERE trip_id = ?")
            .bind(trip_id)
            .execute(&mut *tx)
            .await?;

        for (id, order_index) in order {
            sqlx::query("UPDATE trip_locations SET order_index = ? WHERE id = ? AND trip_id = ?")
                .bind(order_index)
                .bind(id)
                .bind(trip_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Removes a stop and the tripbits scoped to it in one transaction.
    async fn delete_location(&self, id: Uuid) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM tripbits WHERE location_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM trip_locations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        log::debug!("deleted location {id} with {removed} scoped tripbits");
        Ok(())
    }
}

#[async_trait]
impl TripbitRepo for SqliteTripStore {
    async fn create_tripbit(&self, tripbit: Tripbit) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO tripbits (id, trip_id, created_by, title, url, description, start_date, end_date, location_id, category, details, participants, position, attachments, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(tripbit.id)
        .bind(tripbit.trip_id)
        .bind(tripbit.created_by)
        .bind(&tripbit.title)
        .bind(&tripbit.url)
        .bind(&tripbit.description)
        .bind(tripbit.start_date)
        .bind(tripbit.end_date)
        .bind(tripbit.location_id)
        .bind(tripbit.category().as_str())
        .bind(to_json(&tripbit.details)?)
        .bind(to_json(&tripbit.participants)?)
        .bind(tripbit.position)
        .bind(to_json(&tripbit.attachments)?)
        .bind(tripbit.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_tripbit(&self, id: Uuid) -> anyhow::Result<Option<Tripbit>> {
        let row = sqlx::query("SELECT * FROM tripbits WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_tripbit).transpose()
    }

    async fn list_tripbits(&self, trip_id: Uuid) -> anyhow::Result<Vec<Tripbit>> {
        sqlx::query("SELECT * FROM tripbits WHERE trip_id = ? ORDER BY created_at ASC")
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_tripbit)
            .collect()
    }

    async fn update_tripbit(&self, tripbit: Tripbit) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE tripbits SET title = ?, url = ?, description = ?, start_date = ?, end_date = ?, location_id = ?, \
             category = ?, details = ?, participants = ?, position = ?, attachments = ? WHERE id = ?",
        )
        .bind(&tripbit.title)
        .bind(&tripbit.url)
        .bind(&tripbit.description)
        .bind(tripbit.start_date)
        .bind(tripbit.end_date)
        .bind(tripbit.location_id)
        .bind(tripbit.category().as_str())
        .bind(to_json(&tripbit.details)?)
        .bind(to_json(&tripbit.participants)?)
        .bind(tripbit.position)
        .bind(to_json(&tripbit.attachments)?)
        .bind(tripbit.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("tripbit {} does not exist", tripbit.id);
        }
        Ok(())
    }

    async fn delete_tripbit(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM tripbits WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sy_core::models::{Attachment, FlightDetails};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    async fn store_with_trip() -> (SqliteTripStore, Trip) {
        let store = SqliteTripStore::new("sqlite::memory:").await.unwrap();
        let trip = Trip {
            id: Uuid::now_v7(),
            owner_id: Uuid::now_v7(),
            name: "Portugal".into(),
            description: Some("Two weeks down the coast".into()),
            participants: vec![Uuid::now_v7()],
            created_at: Utc::now(),
        };
        store.create_trip(trip.clone()).await.expect("Failed to create trip");
        (store, trip)
    }

    fn location(trip_id: Uuid, name: &str, order_index: i32) -> TripLocation {
        TripLocation {
            id: Uuid::now_v7(),
            trip_id,
            name: name.into(),
            order_index,
            start_date: Some(day(1)),
            end_date: Some(day(5)),
        }
    }

    fn flight(trip: &Trip, location_id: Option<Uuid>) -> Tripbit {
        Tripbit {
            id: Uuid::now_v7(),
            trip_id: trip.id,
            created_by: trip.owner_id,
            title: "TP 1234".into(),
            url: Some("https://example.com/booking".into()),
            description: None,
            start_date: Some(day(2)),
            end_date: None,
            location_id,
            details: TripbitDetails::Flight(FlightDetails {
                airline: Some("TAP".into()),
                flight_number: Some("TP1234".into()),
                ..Default::default()
            }),
            participants: vec![trip.owner_id],
            position: Some(1),
            attachments: vec![Attachment {
                path: "tripbits/abc/boarding-pass.pdf".into(),
                file_name: "boarding-pass.pdf".into(),
                content_type: Some("application/pdf".into()),
            }],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_trip_round_trip() {
        let (store, trip) = store_with_trip().await;
        let loaded = store.get_trip(trip.id).await.unwrap().expect("trip missing");
        assert_eq!(loaded.name, trip.name);
        assert_eq!(loaded.participants, trip.participants);
        assert!(store.get_trip(Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_and_get_tripbit() {
        let (store, trip) = store_with_trip().await;
        let lisbon = location(trip.id, "Lisbon", 0);
        store.create_location(lisbon.clone()).await.unwrap();

        let tripbit = flight(&trip, Some(lisbon.id));
        store.create_tripbit(tripbit.clone()).await.expect("Failed to create tripbit");

        let loaded = store.get_tripbit(tripbit.id).await.unwrap().expect("tripbit missing");
        assert_eq!(loaded.details, tripbit.details);
        assert_eq!(loaded.location_id, Some(lisbon.id));
        assert_eq!(loaded.attachments, tripbit.attachments);
        assert_eq!(loaded.start_date, Some(day(2)));
        assert_eq!(loaded.end_date, None);
        assert_eq!(store.list_tripbits(trip.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tripbit_with_foreign_location_is_rejected() {
        let (store, trip) = store_with_trip().await;
        let result = store.create_tripbit(flight(&trip, Some(Uuid::now_v7()))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_tripbit() {
        let (store, trip) = store_with_trip().await;
        let mut tripbit = flight(&trip, None);
        store.create_tripbit(tripbit.clone()).await.unwrap();

        tripbit.title = "TP 1235".into();
        tripbit.end_date = Some(day(3));
        store.update_tripbit(tripbit.clone()).await.unwrap();

        let loaded = store.get_tripbit(tripbit.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "TP 1235");
        assert_eq!(loaded.end_date, Some(day(3)));

        let ghost = flight(&trip, None);
        assert!(store.update_tripbit(ghost).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_location_cascades_to_scoped_tripbits() {
        let (store, trip) = store_with_trip().await;
        let lisbon = location(trip.id, "Lisbon", 0);
        store.create_location(lisbon.clone()).await.unwrap();

        let scoped = flight(&trip, Some(lisbon.id));
        let trip_wide = flight(&trip, None);
        store.create_tripbit(scoped.clone()).await.unwrap();
        store.create_tripbit(trip_wide.clone()).await.unwrap();

        store.delete_location(lisbon.id).await.unwrap();

        assert!(store.list_locations(trip.id).await.unwrap().is_empty());
        let left = store.list_tripbits(trip.id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, trip_wide.id);
    }

    #[tokio::test]
    async fn test_reorder_swaps_unique_indices() {
        let (store, trip) = store_with_trip().await;
        let lisbon = location(trip.id, "Lisbon", 0);
        let porto = location(trip.id, "Porto", 1);
        store.create_location(lisbon.clone()).await.unwrap();
        store.create_location(porto.clone()).await.unwrap();

        store
            .update_location_order(trip.id, vec![(porto.id, 0), (lisbon.id, 1)])
            .await
            .expect("Failed to reorder");

        let names: Vec<String> = store.list_locations(trip.id).await.unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Porto", "Lisbon"]);
    }

    #[tokio::test]
    async fn test_duplicate_order_index_is_rejected() {
        let (store, trip) = store_with_trip().await;
        store.create_location(location(trip.id, "Lisbon", 0)).await.unwrap();
        assert!(store.create_location(location(trip.id, "Porto", 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_update_location_dates() {
        let (store, trip) = store_with_trip().await;
        let lisbon = location(trip.id, "Lisbon", 0);
        store.create_location(lisbon.clone()).await.unwrap();

        store.update_location_dates(lisbon.id, None, None).await.unwrap();
        let loaded = store.list_locations(trip.id).await.unwrap();
        assert_eq!(loaded[0].date_range(), None);
    }
}
