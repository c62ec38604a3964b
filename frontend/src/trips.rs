use seed::prelude::*;
use shared::{ApiError, PlannedTrip, Trip, TripEnvelope, TripHistory, TripRequest};
use thiserror::Error;

use crate::config;
use crate::session::RouteSession;

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The backend rejected the request and said why.
    #[error("{0}")]
    Backend(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

fn new_trip_url() -> String {
    format!("{}/trips/new/", config::server_base())
}

fn history_url() -> String {
    format!("{}/trips/", config::server_base())
}

/// Sends a planning request and canonicalizes whatever trip shape the
/// backend answers with. A non-2xx response is reported with the backend's
/// own message when its body carries one.
pub async fn submit(request: TripRequest) -> Result<PlannedTrip, SubmitError> {
    web_sys::console::debug_1(
        &format!(
            "[frontend] submitting trip {} -> {}",
            request.pickup_location, request.dropoff_location
        )
        .into(),
    );

    let response = Request::new(new_trip_url())
        .method(Method::Post)
        .json(&request)
        .map_err(|err| SubmitError::Transport(format!("{err:?}")))?
        .fetch()
        .await
        .map_err(|err| SubmitError::Transport(format!("{err:?}")))?;

    let status = response.status();
    if !(200..300).contains(&status.code) {
        let fallback = format!("request failed with status {}", status.code);
        return Err(match response.json::<ApiError>().await {
            Ok(body) => SubmitError::Backend(body.error),
            Err(_) => SubmitError::Transport(fallback),
        });
    }

    let envelope: TripEnvelope = response
        .json()
        .await
        .map_err(|err| SubmitError::Decode(format!("{err:?}")))?;
    Ok(envelope.canonicalize())
}

/// Loads the stored trips, newest first, together with the most recent one.
pub async fn fetch_history() -> Result<TripHistory, SubmitError> {
    let response = Request::new(history_url())
        .fetch()
        .await
        .map_err(|err| SubmitError::Transport(format!("{err:?}")))?
        .check_status()
        .map_err(|err| SubmitError::Transport(format!("{err:?}")))?;
    response
        .json()
        .await
        .map_err(|err| SubmitError::Decode(format!("{err:?}")))
}

/// Folds a successful planning response into the session. An empty candidate
/// list keeps whatever routes the session already holds.
pub fn absorb_planned(session: &mut RouteSession, planned: PlannedTrip) -> Trip {
    if !planned.candidate_routes.is_empty() {
        session.replace_routes(planned.candidate_routes);
    }
    planned.trip
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Route;

    fn route(distance: f64) -> Route {
        Route {
            duration: 1.0,
            distance,
            path: Vec::new(),
        }
    }

    fn planned(routes: Vec<Route>) -> PlannedTrip {
        PlannedTrip {
            trip: TripEnvelope::default().canonicalize().trip,
            candidate_routes: routes,
        }
    }

    #[test]
    fn test_trip_endpoints_share_one_base() {
        assert!(new_trip_url().ends_with("/trips/new/"));
        assert!(history_url().ends_with("/trips/"));
        assert!(new_trip_url().starts_with(&config::server_base()));
        assert!(history_url().starts_with(&config::server_base()));
    }

    #[test]
    fn test_absorb_planned_replaces_routes_and_selects_shortest() {
        let mut session = RouteSession::new();
        absorb_planned(&mut session, planned(vec![route(10.0), route(5.0)]));
        assert_eq!(session.routes().len(), 2);
        assert_eq!(session.selected(), Some(1));
    }

    #[test]
    fn test_absorb_planned_keeps_session_on_empty_candidates() {
        let mut session = RouteSession::new();
        session.replace_routes(vec![route(7.0)]);
        absorb_planned(&mut session, planned(Vec::new()));
        assert_eq!(session.routes().len(), 1);
        assert_eq!(session.selected(), Some(0));
    }

    #[test]
    fn test_backend_error_renders_its_own_message() {
        let err = SubmitError::Backend("Invalid cycle hours".to_string());
        assert_eq!(err.to_string(), "Invalid cycle hours");
    }

    #[test]
    fn test_transport_error_is_prefixed() {
        let err = SubmitError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "request failed: connection refused");
    }
}
