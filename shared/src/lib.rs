use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Regulatory duty-cycle ceiling, in hours.
pub const MAX_CYCLE_HOURS: u32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCoordinateError;

impl fmt::Display for ParseCoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected \"lat,lon\"")
    }
}

impl std::error::Error for ParseCoordinateError {}

impl FromStr for Coordinate {
    type Err = ParseCoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s.split_once(',').ok_or(ParseCoordinateError)?;
        let lat = lat.trim().parse::<f64>().map_err(|_| ParseCoordinateError)?;
        let lon = lon.trim().parse::<f64>().map_err(|_| ParseCoordinateError)?;
        Ok(Self { lat, lon })
    }
}

/// One candidate path returned by the planning backend. `path` carries the
/// polyline geometry under the wire name `route`; history entries often omit
/// it, so it defaults to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub duration: f64,
    pub distance: f64,
    #[serde(rename = "route", default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelStop {
    pub location: String,
    pub distance_from_start: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterAlert {
    pub alert_level: String,
    pub location: String,
}

/// Canonical trip record. The wire protocol duplicates these fields in two
/// shapes; `TripEnvelope` is the only place both are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub total_miles: f64,
    pub current_address: String,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub cycle_hours: u32,
    #[serde(default)]
    pub available_routes: Vec<Route>,
    #[serde(default)]
    pub fuel_stops: Vec<FuelStop>,
    #[serde(default)]
    pub water_alerts: Vec<WaterAlert>,
}

/// The nested duplicate of the trip core fields observed on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripCore {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub total_miles: Option<f64>,
    #[serde(default)]
    pub current_address: Option<String>,
    #[serde(default)]
    pub pickup_address: Option<String>,
    #[serde(default)]
    pub dropoff_address: Option<String>,
    #[serde(default)]
    pub cycle_hours: Option<u32>,
    #[serde(default)]
    pub available_routes: Option<Vec<Route>>,
}

/// Wire adapter for trip documents. The backend sometimes answers with the
/// core fields flat, sometimes nested under `trip`, and submission responses
/// add a top-level `routes` array carrying candidate geometry. Everything
/// downstream of `canonicalize` sees one flat `Trip`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripEnvelope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub total_miles: Option<f64>,
    #[serde(default)]
    pub current_address: Option<String>,
    #[serde(default)]
    pub pickup_address: Option<String>,
    #[serde(default)]
    pub dropoff_address: Option<String>,
    #[serde(default)]
    pub cycle_hours: Option<u32>,
    #[serde(default)]
    pub available_routes: Option<Vec<Route>>,
    #[serde(default)]
    pub trip: Option<TripCore>,
    #[serde(default)]
    pub routes: Option<Vec<Route>>,
    #[serde(default)]
    pub fuel_stops: Option<Vec<FuelStop>>,
    #[serde(default)]
    pub water_alerts: Option<Vec<WaterAlert>>,
}

/// A canonicalized submission result: the trip record plus the candidate
/// routes meant for the shared session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTrip {
    pub trip: Trip,
    pub candidate_routes: Vec<Route>,
}

impl TripEnvelope {
    /// Collapse both wire shapes into the canonical one. The nested `trip`
    /// block, when present, is authoritative for the core fields; top-level
    /// duplicates are the fallback. Advisory lists and candidate routes are
    /// top-level only.
    pub fn canonicalize(self) -> PlannedTrip {
        let core = self.trip.unwrap_or_default();

        let trip = Trip {
            id: core.id.or(self.id).unwrap_or_default(),
            total_miles: core.total_miles.or(self.total_miles).unwrap_or_default(),
            current_address: core
                .current_address
                .or(self.current_address)
                .unwrap_or_default(),
            pickup_address: core
                .pickup_address
                .or(self.pickup_address)
                .unwrap_or_default(),
            dropoff_address: core
                .dropoff_address
                .or(self.dropoff_address)
                .unwrap_or_default(),
            cycle_hours: core.cycle_hours.or(self.cycle_hours).unwrap_or_default(),
            available_routes: core
                .available_routes
                .or(self.available_routes)
                .unwrap_or_default(),
            fuel_stops: self.fuel_stops.unwrap_or_default(),
            water_alerts: self.water_alerts.unwrap_or_default(),
        };

        PlannedTrip {
            trip,
            candidate_routes: self.routes.unwrap_or_default(),
        }
    }
}

/// Body of `POST /trips/new/`. Locations travel as `"lat,lon"` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub current_location: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub cycle_hours: u32,
}

impl TripRequest {
    pub fn from_coordinates(
        current: Coordinate,
        pickup: Coordinate,
        dropoff: Coordinate,
        cycle_hours: u32,
    ) -> Self {
        Self {
            current_location: current.to_string(),
            pickup_location: pickup.to_string(),
            dropoff_location: dropoff.to_string(),
            cycle_hours,
        }
    }
}

/// Body of `GET /trips/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripHistory {
    #[serde(default)]
    pub recent_trip: Option<TripEnvelope>,
    #[serde(default)]
    pub all_trips: Vec<TripEnvelope>,
}

/// Error body accompanying a non-2xx planning response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

/// Index of the shortest route by distance; ties go to the first occurrence.
/// This is the default selection after every successful submission.
pub fn shortest_route_index(routes: &[Route]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, route) in routes.iter().enumerate() {
        match best {
            Some((_, distance)) if route.distance >= distance => {}
            _ => best = Some((idx, route.distance)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Render fractional hours as "3h 25min".
pub fn format_duration(hours: f64) -> String {
    let whole = hours.floor();
    let mut minutes = ((hours - whole) * 60.0).round() as u32;
    let mut whole = whole as u32;
    if minutes == 60 {
        whole += 1;
        minutes = 0;
    }
    format!("{whole}h {minutes}min")
}
