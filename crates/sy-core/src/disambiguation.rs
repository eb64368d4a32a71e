//! # Disambiguation Flow
//!
//! Decides the `location_id` of a new tripbit. Zero or one matching leg is
//! resolved silently; two or more park the draft until the user picks a leg
//! or keeps the item at trip level.
//!
//! ```text
//! Idle --submit (>=2 matches)--> AwaitingChoice --choose / cancel--> Idle
//! ```
//!
//! Every creation attempt ends in at most one write, and never in a write
//! without a final location decision.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::matcher::find_matching_locations;
use crate::models::{Tripbit, TripbitDraft, TripLocation};
use crate::traits::TripbitRepo;

/// The user's answer to "which stop does this belong to?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationChoice {
    Location(Uuid),
    /// Keep the item under the entire trip
    EntireTrip,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Idle,
    AwaitingChoice {
        /// Minted when the draft is parked and reused by every `choose`
        /// attempt, so a retried write cannot create a second row.
        tripbit_id: Uuid,
        /// Ready to persist apart from its location
        draft: TripbitDraft,
        candidates: Vec<TripLocation>,
    },
}

/// Result of submitting a draft.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Persisted straight away (trip-wide or single match).
    Saved(Tripbit),
    /// Several legs overlap; call [`LocationDisambiguator::choose`] or
    /// [`LocationDisambiguator::cancel`].
    NeedsChoice(Vec<TripLocation>),
}

pub struct LocationDisambiguator {
    repo: Arc<dyn TripbitRepo>,
    state: FlowState,
}

impl LocationDisambiguator {
    pub fn new(repo: Arc<dyn TripbitRepo>) -> Self {
        Self { repo, state: FlowState::Idle }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn is_awaiting_choice(&self) -> bool {
        matches!(self.state, FlowState::AwaitingChoice { .. })
    }

    /// Legs offered to the user while a choice is pending.
    pub fn candidates(&self) -> &[TripLocation] {
        match &self.state {
            FlowState::AwaitingChoice { candidates, .. } => candidates,
            FlowState::Idle => &[],
        }
    }

    /// Id the pending tripbit will be saved under.
    pub fn pending_tripbit_id(&self) -> Option<Uuid> {
        match &self.state {
            FlowState::AwaitingChoice { tripbit_id, .. } => Some(*tripbit_id),
            FlowState::Idle => None,
        }
    }

    /// Withdraws a leg that no longer exists from the offered stops.
    /// Returns whether it was on offer.
    pub fn forget_candidate(&mut self, location_id: Uuid) -> bool {
        match &mut self.state {
            FlowState::AwaitingChoice { candidates, .. } => {
                let before = candidates.len();
                candidates.retain(|c| c.id != location_id);
                candidates.len() != before
            }
            FlowState::Idle => false,
        }
    }

    /// Matches the draft against `locations` (expected in chronological order)
    /// and persists it unless the user has to pick between several legs.
    ///
    /// On a persistence error the flow stays `Idle` and the caller still owns
    /// the draft, so the same submission can be retried.
    pub async fn submit(&mut self, draft: &TripbitDraft, locations: &[TripLocation]) -> Result<SubmitOutcome> {
        if self.is_awaiting_choice() {
            return Err(AppError::Conflict(
                "a location choice is already pending for another item".to_string(),
            ));
        }
        validate_draft(draft)?;

        let matches = find_matching_locations(draft.start_date, draft.end_date, locations);
        match matches.as_slice() {
            [] => {
                debug!("tripbit '{}' matches no dated stop, keeping it trip-wide", draft.title);
                self.persist(draft.clone().into_tripbit(Uuid::now_v7(), None)).await.map(SubmitOutcome::Saved)
            }
            [only] => {
                debug!("tripbit '{}' auto-linked to stop {}", draft.title, only.id);
                let location_id = Some(only.id);
                self.persist(draft.clone().into_tripbit(Uuid::now_v7(), location_id)).await.map(SubmitOutcome::Saved)
            }
            many => {
                let candidates: Vec<TripLocation> = many.iter().map(|loc| (*loc).clone()).collect();
                debug!("tripbit '{}' overlaps {} stops, awaiting choice", draft.title, candidates.len());
                self.state = FlowState::AwaitingChoice {
                    tripbit_id: Uuid::now_v7(),
                    draft: draft.clone(),
                    candidates: candidates.clone(),
                };
                Ok(SubmitOutcome::NeedsChoice(candidates))
            }
        }
    }

    /// Persists the pending draft with the chosen location.
    ///
    /// The flow returns to `Idle` only once the write succeeded; a failed
    /// write keeps the draft pending so the same choice can be retried.
    pub async fn choose(&mut self, choice: LocationChoice) -> Result<Tripbit> {
        let (tripbit_id, draft, location_id) = match &self.state {
            FlowState::Idle => return Err(AppError::NoPendingChoice),
            FlowState::AwaitingChoice { tripbit_id, draft, candidates } => {
                let location_id = match choice {
                    LocationChoice::EntireTrip => None,
                    LocationChoice::Location(id) if candidates.iter().any(|c| c.id == id) => Some(id),
                    LocationChoice::Location(id) => {
                        return Err(AppError::ValidationError(format!(
                            "location {id} is not one of the offered stops"
                        )));
                    }
                };
                (*tripbit_id, draft.clone(), location_id)
            }
        };

        let saved = self.persist(draft.into_tripbit(tripbit_id, location_id)).await?;
        self.state = FlowState::Idle;
        Ok(saved)
    }

    /// Drops the pending draft without writing anything.
    pub fn cancel(&mut self) -> Option<TripbitDraft> {
        match std::mem::replace(&mut self.state, FlowState::Idle) {
            FlowState::AwaitingChoice { draft, .. } => {
                debug!("discarded pending tripbit '{}'", draft.title);
                Some(draft)
            }
            FlowState::Idle => None,
        }
    }

    async fn persist(&self, tripbit: Tripbit) -> Result<Tripbit> {
        match self.repo.create_tripbit(tripbit.clone()).await {
            Ok(()) => Ok(tripbit),
            Err(e) => {
                warn!("failed to save tripbit '{}': {e:#}", tripbit.title);
                Err(AppError::Persistence(e))
            }
        }
    }
}

/// Checks the fields a draft must satisfy before it can be persisted.
pub fn validate_draft(draft: &TripbitDraft) -> Result<()> {
    if draft.title.trim().is_empty() {
        return Err(AppError::ValidationError("title must not be empty".to_string()));
    }
    crate::models::ensure_date_order(draft.start_date, draft.end_date)
}
