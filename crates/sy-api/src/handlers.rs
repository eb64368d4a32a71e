//! # sy-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the trip planner.
//! Tripbit creation that needs a location choice is parked in
//! [`AppState::pending`] until the client resolves or cancels it, or until
//! it sits there longer than [`AppState::pending_ttl`].

use std::time::{Duration, Instant};

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sy_core::disambiguation::{LocationChoice, LocationDisambiguator, SubmitOutcome};
use sy_core::error::AppError;
use sy_core::models::{Attachment, TripLocation, Tripbit, TripbitDetails, TripbitDraft};
use sy_core::planner::TripPlanner;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the caller's user id, set by the upstream auth layer.
pub const USER_HEADER: &str = "x-seeya-user";

type ApiResult = Result<HttpResponse, ApiError>;

/// A creation flow waiting for the user to pick a stop.
pub struct PendingTripbit {
    trip_id: Uuid,
    created_by: Uuid,
    parked_at: Instant,
    flow: LocationDisambiguator,
}

/// State shared across all Actix-web workers.
pub struct AppState {
    pub planner: TripPlanner,
    pub pending: DashMap<Uuid, PendingTripbit>,
    /// How long an unanswered location prompt is kept before it is dropped.
    pub pending_ttl: Duration,
}

impl AppState {
    pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(30 * 60);

    pub fn new(planner: TripPlanner) -> Self {
        Self::with_pending_ttl(planner, Self::DEFAULT_PENDING_TTL)
    }

    pub fn with_pending_ttl(planner: TripPlanner, pending_ttl: Duration) -> Self {
        Self { planner, pending: DashMap::new(), pending_ttl }
    }

    /// Cancels every parked flow older than the TTL, as if its prompt had
    /// been closed. Returns how many were dropped.
    pub fn evict_expired(&self) -> usize {
        let ttl = self.pending_ttl;
        let mut evicted = 0;
        self.pending.retain(|pending_id, pending| {
            if pending.parked_at.elapsed() < ttl {
                return true;
            }
            pending.flow.cancel();
            log::info!("pending tripbit {pending_id} for trip {} expired unanswered", pending.trip_id);
            evicted += 1;
            false
        });
        evicted
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct LocationDatesRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MoveLocationRequest {
    pub from: usize,
    pub to: usize,
}

/// Body of the add-tripbit dialog.
#[derive(Debug, Deserialize)]
pub struct TripbitRequest {
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

impl TripbitRequest {
    fn into_draft(self, trip_id: Uuid, created_by: Uuid) -> TripbitDraft {
        TripbitDraft {
            trip_id,
            created_by,
            title: self.title,
            url: self.url,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            details: self.details,
            participants: self.participants,
            position: self.position,
            attachments: self.attachments,
        }
    }
}

/// Body of the edit-tripbit dialog; the stop is chosen explicitly here.
#[derive(Debug, Deserialize)]
pub struct UpdateTripbitRequest {
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location_id: Option<Uuid>,
    #[serde(flatten)]
    pub details: TripbitDetails,
    #[serde(default)]
    pub participants: Vec<Uuid>,
    pub position: Option<i32>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub choice: LocationChoice,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitResponse {
    Saved { tripbit: Tripbit },
    NeedsLocation { pending_id: Uuid, candidates: Vec<TripLocation> },
}

fn caller(req: &HttpRequest) -> Result<Uuid, ApiError> {
    req.headers()
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or_else(|| ApiError(AppError::Unauthorized(format!("missing or invalid {USER_HEADER} header"))))
}

pub async fn create_trip(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateTripRequest>,
) -> ApiResult {
    let owner = caller(&req)?;
    let body = body.into_inner();
    let trip = data.planner.create_trip(owner, &body.name, body.description).await?;
    Ok(HttpResponse::Created().json(trip))
}

pub async fn list_locations(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let locations = data.planner.locations(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(locations))
}

pub async fn add_location(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<LocationRequest>,
) -> ApiResult {
    let body = body.into_inner();
    let location = data
        .planner
        .add_location(path.into_inner(), &body.name, body.start_date, body.end_date)
        .await?;
    Ok(HttpResponse::Created().json(location))
}

pub async fn update_location_dates(
    data: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<LocationDatesRequest>,
) -> ApiResult {
    let (trip_id, location_id) = path.into_inner();
    let location = data
        .planner
        .update_location_dates(trip_id, location_id, body.start_date, body.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(location))
}

pub async fn move_location(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<MoveLocationRequest>,
) -> ApiResult {
    let locations = data.planner.move_location(path.into_inner(), body.from, body.to).await?;
    Ok(HttpResponse::Ok().json(locations))
}

pub async fn remove_location(data: web::Data<AppState>, path: web::Path<(Uuid, Uuid)>) -> ApiResult {
    let (trip_id, location_id) = path.into_inner();
    data.planner.remove_location(trip_id, location_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_tripbits(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let tripbits = data.planner.tripbits(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tripbits))
}

/// Orchestrates the creation of a new tripbit.
///
/// Returns `201` when the tripbit was saved (trip-wide or auto-linked), or
/// `202` with a `pending_id` and the overlapping stops when the user must choose.
pub async fn submit_tripbit(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<TripbitRequest>,
) -> ApiResult {
    let actor = caller(&req)?;
    let trip_id = path.into_inner();
    let draft = body.into_inner().into_draft(trip_id, actor);

    data.planner.check_draft(&draft).await?;
    let locations = data.planner.locations(trip_id).await?;

    let mut flow = data.planner.disambiguator();
    match flow.submit(&draft, &locations).await? {
        SubmitOutcome::Saved(tripbit) => Ok(HttpResponse::Created().json(SubmitResponse::Saved { tripbit })),
        SubmitOutcome::NeedsChoice(candidates) => {
            data.evict_expired();
            let pending_id = Uuid::now_v7();
            let parked = PendingTripbit { trip_id, created_by: actor, parked_at: Instant::now(), flow };
            data.pending.insert(pending_id, parked);
            log::debug!("tripbit for trip {trip_id} parked as {pending_id}");
            Ok(HttpResponse::Accepted().json(SubmitResponse::NeedsLocation { pending_id, candidates }))
        }
    }
}

/// Takes the caller's pending flow out of the map, so no shard lock is held
/// across the write.
fn take_pending(data: &AppState, trip_id: Uuid, pending_id: Uuid, actor: Uuid) -> Result<PendingTripbit, ApiError> {
    data.evict_expired();
    data.pending
        .remove_if(&pending_id, |_, p| p.trip_id == trip_id && p.created_by == actor)
        .map(|(_, pending)| pending)
        .ok_or_else(|| ApiError(AppError::NotFound("Pending tripbit".to_string(), pending_id.to_string())))
}

/// Persists a parked tripbit with the user's choice of stop (or trip level).
/// A failed write leaves it parked so the client can retry the same choice,
/// and so does picking a stop that was removed in the meantime.
pub async fn resolve_pending(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<ResolveRequest>,
) -> ApiResult {
    let actor = caller(&req)?;
    let (trip_id, pending_id) = path.into_inner();
    let mut pending = take_pending(&data, trip_id, pending_id, actor)?;

    let result = data.planner.choose_location(trip_id, &mut pending.flow, body.choice).await;
    if pending.flow.is_awaiting_choice() {
        data.pending.insert(pending_id, pending);
    }

    let tripbit = result?;
    Ok(HttpResponse::Created().json(tripbit))
}

/// The user closed the prompt: drop the parked tripbit without saving it.
pub async fn cancel_pending(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
) -> ApiResult {
    let actor = caller(&req)?;
    let (trip_id, pending_id) = path.into_inner();
    let mut pending = take_pending(&data, trip_id, pending_id, actor)?;
    pending.flow.cancel();
    Ok(HttpResponse::NoContent().finish())
}

pub async fn update_tripbit(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateTripbitRequest>,
) -> ApiResult {
    let actor = caller(&req)?;
    let (trip_id, tripbit_id) = path.into_inner();
    let body = body.into_inner();

    // Creator and creation time are restored from storage by the planner.
    let edited = Tripbit {
        id: tripbit_id,
        trip_id,
        created_by: actor,
        title: body.title,
        url: body.url,
        description: body.description,
        start_date: body.start_date,
        end_date: body.end_date,
        location_id: body.location_id,
        details: body.details,
        participants: body.participants,
        position: body.position,
        attachments: body.attachments,
        created_at: chrono::Utc::now(),
    };
    let saved = data.planner.update_tripbit(trip_id, edited).await?;
    Ok(HttpResponse::Ok().json(saved))
}

pub async fn delete_tripbit(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
) -> ApiResult {
    let actor = caller(&req)?;
    let (trip_id, tripbit_id) = path.into_inner();
    data.planner.delete_tripbit(trip_id, tripbit_id, actor).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use sy_core::traits::{MockTripRepo, MockTripbitRepo};

    fn parked(state: &AppState, age: Duration) -> Uuid {
        let pending_id = Uuid::now_v7();
        let parked_at = Instant::now().checked_sub(age).unwrap_or_else(Instant::now);
        state.pending.insert(
            pending_id,
            PendingTripbit {
                trip_id: Uuid::now_v7(),
                created_by: Uuid::now_v7(),
                parked_at,
                flow: state.planner.disambiguator(),
            },
        );
        pending_id
    }

    #[test]
    fn test_evict_expired_drops_only_stale_flows() {
        let planner = TripPlanner::new(Arc::new(MockTripRepo::new()), Arc::new(MockTripbitRepo::new()));
        let state = AppState::with_pending_ttl(planner, Duration::from_secs(60));

        let stale = parked(&state, Duration::from_secs(120));
        let fresh = parked(&state, Duration::ZERO);

        assert_eq!(state.evict_expired(), 1);
        assert!(!state.pending.contains_key(&stale));
        assert!(state.pending.contains_key(&fresh));
        assert_eq!(state.evict_expired(), 0);
    }
}
