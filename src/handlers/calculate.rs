//! `POST /calcular` handler

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::error::MatchError;
use crate::types::{CalculateRequest, CalculateResponse, ErrorResponse, TechnicianPayload};

/// HTTP status for each match failure
pub fn status_for(err: &MatchError) -> StatusCode {
    match err {
        MatchError::InvalidInput | MatchError::UnresolvableAddress => StatusCode::BAD_REQUEST,
        MatchError::EmptyRoster | MatchError::NoRoute => StatusCode::NOT_FOUND,
        MatchError::Roster(_) => StatusCode::INTERNAL_SERVER_ERROR,
        MatchError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for MatchError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let body = ErrorResponse::new(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Find the nearest technician to the posted `endereco`.
///
/// The body is parsed leniently: a missing, empty or non-JSON body is
/// treated as a request without an address.
pub async fn handle_calculate(State(state): State<AppState>, body: Bytes) -> Response {
    let request: CalculateRequest = if body.is_empty() {
        CalculateRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(req) => req,
            Err(e) => {
                debug!("Failed to parse calculate request: {}", e);
                CalculateRequest::default()
            }
        }
    };

    let address = request.endereco.unwrap_or_default();
    info!("Calculate request for '{}'", address);

    match state.engine.match_address(&address).await {
        Ok(result) => {
            let payload = TechnicianPayload::from(&result.technician);
            (StatusCode::OK, Json(CalculateResponse { tecnico: payload })).into_response()
        }
        Err(e) => {
            match &e {
                MatchError::Roster(_) | MatchError::Upstream(_) => error!("Match failed: {}", e),
                _ => warn!("Match failed: {}", e),
            }
            e.into_response()
        }
    }
}
