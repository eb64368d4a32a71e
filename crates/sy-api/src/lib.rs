//! # sy-api
//!
//! The web routing and orchestration layer for Seeya.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the trip, location and tripbit routes.
///
/// # Developer Note
/// Everything is scoped under `/trips` so the binary can mount the API
/// under a prefix (e.g., /api/v1/) if needed.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trips")
            .route("", web::post().to(handlers::create_trip))
            // Stops
            .route("/{trip_id}/locations", web::get().to(handlers::list_locations))
            .route("/{trip_id}/locations", web::post().to(handlers::add_location))
            .route("/{trip_id}/locations/move", web::post().to(handlers::move_location))
            .route("/{trip_id}/locations/{location_id}/dates", web::put().to(handlers::update_location_dates))
            .route("/{trip_id}/locations/{location_id}", web::delete().to(handlers::remove_location))
            // Tripbits; /pending/... BEFORE /{tripbit_id}
            .route("/{trip_id}/tripbits", web::get().to(handlers::list_tripbits))
            .route("/{trip_id}/tripbits", web::post().to(handlers::submit_tripbit))
            .route("/{trip_id}/tripbits/pending/{pending_id}", web::post().to(handlers::resolve_pending))
            .route("/{trip_id}/tripbits/pending/{pending_id}", web::delete().to(handlers::cancel_pending))
            .route("/{trip_id}/tripbits/{tripbit_id}", web::put().to(handlers::update_tripbit))
            .route("/{trip_id}/tripbits/{tripbit_id}", web::delete().to(handlers::delete_tripbit)),
    );
}
