use seed::prelude::*;
use serde::Deserialize;
use shared::Coordinate;
use thiserror::Error;

const NOMINATIM_BASE: &str = "https://nominatim.openstreetmap.org";

/// Address shown when reverse geocoding cannot produce one.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Queries shorter than this never reach the network.
pub const MIN_QUERY_CHARS: usize = 3;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Transport(String),
    #[error("malformed geocoding payload: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationSuggestion {
    pub name: String,
    pub coord: Coordinate,
}

#[derive(Debug, Deserialize)]
struct ReversePayload {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct SearchPlace {
    display_name: String,
    lat: String,
    lon: String,
}

/// Resolves a coordinate to a display address. Every failure collapses to
/// the [`UNKNOWN_LOCATION`] sentinel; callers never see an error.
pub async fn reverse_geocode(coord: Coordinate) -> String {
    match fetch_address(coord).await {
        Ok(address) => address,
        Err(err) => {
            web_sys::console::warn_1(&format!("[frontend] reverse geocoding failed: {err}").into());
            UNKNOWN_LOCATION.to_string()
        }
    }
}

async fn fetch_address(coord: Coordinate) -> Result<String, GeocodeError> {
    let url = format!(
        "{NOMINATIM_BASE}/reverse?format=json&lat={}&lon={}",
        coord.lat, coord.lon
    );
    let response = Request::new(url)
        .fetch()
        .await
        .map_err(|err| GeocodeError::Transport(format!("{err:?}")))?
        .check_status()
        .map_err(|err| GeocodeError::Transport(format!("{err:?}")))?;
    let payload: ReversePayload = response
        .json()
        .await
        .map_err(|err| GeocodeError::Decode(format!("{err:?}")))?;
    Ok(payload.display_name)
}

/// Free-text forward search. Queries below the length gate resolve to an
/// empty list without touching the network; rows whose coordinates do not
/// parse are dropped rather than failing the whole response.
pub async fn search_suggestions(query: String) -> Result<Vec<LocationSuggestion>, GeocodeError> {
    if !should_search(&query) {
        return Ok(Vec::new());
    }
    let url = format!("{NOMINATIM_BASE}/search?format=json&q={}", encode(&query));
    let response = Request::new(url)
        .fetch()
        .await
        .map_err(|err| GeocodeError::Transport(format!("{err:?}")))?
        .check_status()
        .map_err(|err| GeocodeError::Transport(format!("{err:?}")))?;
    let places: Vec<SearchPlace> = response
        .json()
        .await
        .map_err(|err| GeocodeError::Decode(format!("{err:?}")))?;
    Ok(collect_suggestions(places))
}

fn collect_suggestions(places: Vec<SearchPlace>) -> Vec<LocationSuggestion> {
    places
        .into_iter()
        .filter_map(|place| {
            let lat = place.lat.trim().parse().ok()?;
            let lon = place.lon.trim().parse().ok()?;
            Some(LocationSuggestion {
                name: place.display_name,
                coord: Coordinate { lat, lon },
            })
        })
        .collect()
}

/// Empty and near-empty inputs stay local.
pub fn should_search(query: &str) -> bool {
    query.chars().count() >= MIN_QUERY_CHARS
}

fn encode(query: &str) -> String {
    js_sys::encode_uri_component(query).into()
}

/// Monotonic request counter for one suggestion field. Every keystroke that
/// goes to the network takes a fresh generation; a response is applied only
/// if its generation is still the latest, so a slow response for an old
/// query can never overwrite the results of a newer one.
#[derive(Debug, Default)]
pub struct SuggestionState {
    latest: u64,
    items: Vec<LocationSuggestion>,
    loading: bool,
}

impl SuggestionState {
    pub fn items(&self) -> &[LocationSuggestion] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Registers an outgoing request and returns its generation.
    pub fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.loading = true;
        self.latest
    }

    /// Empties the list and invalidates every in-flight request.
    pub fn clear(&mut self) {
        self.latest += 1;
        self.items.clear();
        self.loading = false;
    }

    /// Applies a response if it is still the latest one. Returns whether it
    /// was applied.
    pub fn accept(&mut self, generation: u64, items: Vec<LocationSuggestion>) -> bool {
        if generation != self.latest {
            return false;
        }
        self.items = items;
        self.loading = false;
        true
    }
}
