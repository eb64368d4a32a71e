//! seeya/crates/sy-api/src/middleware.rs Middleware
//!
//! Request logging and CORS for the JSON API.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;

use crate::handlers::USER_HEADER;

// Returns the access logger used by the Seeya API.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// The web client is served from a different origin than the API.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .allowed_header(USER_HEADER)
        .max_age(3600)
}
