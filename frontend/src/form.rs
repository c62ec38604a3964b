use seed::{prelude::*, *};
use shared::{Coordinate, TripRequest, MAX_CYCLE_HOURS};

use crate::geocode::{self, SuggestionState};
use crate::geolocation;
use crate::{bool_attr, NoticeLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Pickup,
    Dropoff,
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Self::Pickup => "Pickup location",
            Self::Dropoff => "Dropoff location",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            Self::Pickup => "Search pickup location",
            Self::Dropoff => "Search dropoff location",
        }
    }
}

/// One searchable location field: the visible text, the coordinate captured
/// from the last picked suggestion, and the suggestion list itself. Editing
/// the text does not clear an already captured coordinate; only picking a
/// suggestion rewrites it.
#[derive(Debug, Default)]
struct FieldState {
    text: String,
    coords: Option<Coordinate>,
    suggestions: SuggestionState,
}

#[derive(Debug, Default)]
struct FieldErrors {
    current: Option<String>,
    pickup: Option<String>,
    dropoff: Option<String>,
    cycle_hours: Option<String>,
}

impl FieldErrors {
    fn any(&self) -> bool {
        self.current.is_some()
            || self.pickup.is_some()
            || self.dropoff.is_some()
            || self.cycle_hours.is_some()
    }
}

pub struct Model {
    current_display: String,
    current_coords: Option<Coordinate>,
    location_loading: bool,
    location_denied: bool,
    retrying: bool,
    pickup: FieldState,
    dropoff: FieldState,
    cycle_hours: String,
    errors: FieldErrors,
}

impl Model {
    fn field(&self, field: Field) -> &FieldState {
        match field {
            Field::Pickup => &self.pickup,
            Field::Dropoff => &self.dropoff,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut FieldState {
        match field {
            Field::Pickup => &mut self.pickup,
            Field::Dropoff => &mut self.dropoff,
        }
    }

    fn field_error(&self, field: Field) -> Option<&String> {
        match field {
            Field::Pickup => self.errors.pickup.as_ref(),
            Field::Dropoff => self.errors.dropoff.as_ref(),
        }
    }

    /// Checks every field and either builds the request or reports why it
    /// cannot be built. A search field counts as filled only when it holds a
    /// captured coordinate; free text alone is not submittable.
    fn validate(&self) -> Result<TripRequest, FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.current_coords.is_none() {
            errors.current = Some("Current location is required".to_string());
        }
        if self.pickup.text.trim().is_empty() || self.pickup.coords.is_none() {
            errors.pickup = Some("Pickup location is required".to_string());
        }
        if self.dropoff.text.trim().is_empty() || self.dropoff.coords.is_none() {
            errors.dropoff = Some("Dropoff location is required".to_string());
        }
        let cycle_hours = match validate_cycle_hours(&self.cycle_hours) {
            Ok(value) => Some(value),
            Err(message) => {
                errors.cycle_hours = Some(message);
                None
            }
        };
        if errors.any() {
            return Err(errors);
        }
        match (
            self.current_coords,
            self.pickup.coords,
            self.dropoff.coords,
            cycle_hours,
        ) {
            (Some(current), Some(pickup), Some(dropoff), Some(cycle_hours)) => Ok(
                TripRequest::from_coordinates(current, pickup, dropoff, cycle_hours),
            ),
            _ => Err(errors),
        }
    }
}

fn validate_cycle_hours(input: &str) -> Result<u32, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Cycle Hours is required".to_string());
    }
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("Only numbers are allowed".to_string());
    }
    match trimmed.parse::<i64>() {
        Ok(value) if value < 0 => Err("Minimum value is 0".to_string()),
        Ok(value) if value > i64::from(MAX_CYCLE_HOURS) => {
            Err(format!("Maximum value is {MAX_CYCLE_HOURS}"))
        }
        Ok(value) => Ok(value as u32),
        Err(_) => Err(if trimmed.starts_with('-') {
            "Minimum value is 0".to_string()
        } else {
            format!("Maximum value is {MAX_CYCLE_HOURS}")
        }),
    }
}

pub enum Msg {
    LocationResolved(Result<Coordinate, String>),
    AddressResolved(String),
    RetryLocation,
    FieldChanged(Field, String),
    SuggestionsFetched {
        field: Field,
        generation: u64,
        result: Result<Vec<geocode::LocationSuggestion>, geocode::GeocodeError>,
    },
    SuggestionPicked(Field, usize),
    CycleHoursChanged(String),
    Submit,
    Cancel,
}

pub enum Event {
    SubmitRequested(TripRequest),
    DismissRequested,
    Notified(NoticeLevel, String),
}

/// Fresh form state for a newly opened dialog; kicks off the device
/// position lookup straight away.
pub fn init(orders: &mut impl Orders<Msg>) -> Model {
    orders.perform_cmd(async { Msg::LocationResolved(geolocation::current_position().await) });
    Model {
        current_display: String::new(),
        current_coords: None,
        location_loading: true,
        location_denied: false,
        retrying: false,
        pickup: FieldState::default(),
        dropoff: FieldState::default(),
        cycle_hours: String::new(),
        errors: FieldErrors::default(),
    }
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) -> Option<Event> {
    match msg {
        Msg::LocationResolved(Ok(coord)) => {
            model.current_coords = Some(coord);
            model.location_denied = false;
            model.retrying = false;
            orders.perform_cmd(async move {
                Msg::AddressResolved(geocode::reverse_geocode(coord).await)
            });
            None
        }
        Msg::LocationResolved(Err(err)) => {
            web_sys::console::warn_1(&format!("[frontend] location unavailable: {err}").into());
            model.location_loading = false;
            model.location_denied = true;
            if model.retrying {
                model.retrying = false;
                Some(Event::Notified(
                    NoticeLevel::Error,
                    "Please provide location access".to_string(),
                ))
            } else {
                None
            }
        }
        Msg::AddressResolved(address) => {
            model.current_display = address;
            model.location_loading = false;
            model.errors.current = None;
            None
        }
        Msg::RetryLocation => {
            model.retrying = true;
            model.location_loading = true;
            orders.perform_cmd(async {
                Msg::LocationResolved(geolocation::current_position().await)
            });
            None
        }
        Msg::FieldChanged(field, text) => {
            model.field_mut(field).text = text.clone();
            if geocode::should_search(&text) {
                let generation = model.field_mut(field).suggestions.begin();
                orders.perform_cmd(async move {
                    Msg::SuggestionsFetched {
                        field,
                        generation,
                        result: geocode::search_suggestions(text).await,
                    }
                });
            } else {
                model.field_mut(field).suggestions.clear();
            }
            None
        }
        Msg::SuggestionsFetched {
            field,
            generation,
            result,
        } => {
            let items = match result {
                Ok(items) => items,
                Err(err) => {
                    web_sys::console::warn_1(
                        &format!("[frontend] suggestion lookup failed: {err}").into(),
                    );
                    Vec::new()
                }
            };
            model.field_mut(field).suggestions.accept(generation, items);
            None
        }
        Msg::SuggestionPicked(field, index) => {
            let state = model.field_mut(field);
            if let Some(pick) = state.suggestions.items().get(index).cloned() {
                state.text = pick.name;
                state.coords = Some(pick.coord);
                state.suggestions.clear();
            }
            None
        }
        Msg::CycleHoursChanged(text) => {
            model.errors.cycle_hours = validate_cycle_hours(&text).err();
            model.cycle_hours = text;
            None
        }
        Msg::Submit => match model.validate() {
            Ok(request) => Some(Event::SubmitRequested(request)),
            Err(errors) => {
                model.errors = errors;
                None
            }
        },
        Msg::Cancel => Some(Event::DismissRequested),
    }
}

pub fn view(model: &Model, submitting: bool) -> Node<Msg> {
    form![
        C!["trip-form"],
        view_current_field(model),
        view_search_field(model, Field::Pickup),
        view_search_field(model, Field::Dropoff),
        view_cycle_field(model),
        div![
            C!["form-actions"],
            button![
                "Cancel",
                attrs! {
                    At::Type => "button",
                    At::Disabled => bool_attr(submitting),
                },
                ev(Ev::Click, |event| {
                    event.prevent_default();
                    Msg::Cancel
                }),
            ],
            button![
                if submitting { "Submitting..." } else { "Submit" },
                attrs! { At::Disabled => bool_attr(submitting) },
                ev(Ev::Click, |event| {
                    event.prevent_default();
                    Msg::Submit
                }),
            ],
        ],
    ]
}

fn view_current_field(model: &Model) -> Node<Msg> {
    let display = if model.location_loading {
        "Fetching location..."
    } else {
        &model.current_display
    };
    div![
        C!["form-field"],
        label!["Current location"],
        div![
            C!["current-location-row"],
            input![attrs! {
                At::Type => "text",
                At::Value => display,
                At::ReadOnly => bool_attr(true),
            }],
            if model.location_denied && !model.location_loading {
                button![
                    "Retry",
                    attrs! { At::Type => "button" },
                    ev(Ev::Click, |event| {
                        event.prevent_default();
                        Msg::RetryLocation
                    }),
                ]
            } else {
                empty![]
            },
        ],
        view_error(model.errors.current.as_ref()),
    ]
}

fn view_search_field(model: &Model, field: Field) -> Node<Msg> {
    let state = model.field(field);
    div![
        C!["form-field"],
        label![field.label()],
        input![
            attrs! {
                At::Type => "text",
                At::Placeholder => field.placeholder(),
                At::Value => state.text,
            },
            input_ev(Ev::Input, move |text| Msg::FieldChanged(field, text)),
        ],
        view_error(model.field_error(field)),
        view_suggestions(state, field),
    ]
}

fn view_suggestions(state: &FieldState, field: Field) -> Node<Msg> {
    if state.suggestions.is_loading() {
        return ul![C!["suggestions"], li![C!["suggestion-loading"], "Loading..."]];
    }
    if state.suggestions.items().is_empty() {
        return empty![];
    }
    ul![
        C!["suggestions"],
        state
            .suggestions
            .items()
            .iter()
            .enumerate()
            .map(|(index, suggestion)| {
                li![
                    suggestion.name.clone(),
                    ev(Ev::Click, move |_| Msg::SuggestionPicked(field, index)),
                ]
            })
            .collect::<Vec<_>>(),
    ]
}

fn view_cycle_field(model: &Model) -> Node<Msg> {
    div![
        C!["form-field"],
        label!["Cycle Hours (hrs)"],
        input![
            attrs! {
                At::Type => "number",
                At::Placeholder => format!("0 - {MAX_CYCLE_HOURS}"),
                At::Value => model.cycle_hours,
            },
            input_ev(Ev::Input, Msg::CycleHoursChanged),
        ],
        view_error(model.errors.cycle_hours.as_ref()),
    ]
}

fn view_error(error: Option<&String>) -> Node<Msg> {
    match error {
        Some(message) => p![C!["field-error"], message],
        None => empty![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_model() -> Model {
        Model {
            current_display: "221B Baker Street, London".to_string(),
            current_coords: Some(Coordinate {
                lat: 51.52,
                lon: -0.15,
            }),
            location_loading: false,
            location_denied: false,
            retrying: false,
            pickup: FieldState {
                text: "Chicago, IL".to_string(),
                coords: Some(Coordinate {
                    lat: 41.8781,
                    lon: -87.6298,
                }),
                suggestions: SuggestionState::default(),
            },
            dropoff: FieldState {
                text: "Denver, CO".to_string(),
                coords: Some(Coordinate {
                    lat: 39.7392,
                    lon: -104.9903,
                }),
                suggestions: SuggestionState::default(),
            },
            cycle_hours: "12".to_string(),
            errors: FieldErrors::default(),
        }
    }

    #[test]
    fn test_cycle_hours_rejects_non_numeric_input() {
        assert_eq!(
            validate_cycle_hours("abc"),
            Err("Only numbers are allowed".to_string())
        );
        assert_eq!(
            validate_cycle_hours("5.5"),
            Err("Only numbers are allowed".to_string())
        );
    }

    #[test]
    fn test_cycle_hours_rejects_a_plus_prefix() {
        assert_eq!(
            validate_cycle_hours("+5"),
            Err("Only numbers are allowed".to_string())
        );
    }

    #[test]
    fn test_cycle_hours_reports_overflow_as_range_violation() {
        assert_eq!(
            validate_cycle_hours("99999999999999999999"),
            Err("Maximum value is 70".to_string())
        );
        assert_eq!(
            validate_cycle_hours("-99999999999999999999"),
            Err("Minimum value is 0".to_string())
        );
    }

    #[test]
    fn test_cycle_hours_rejects_empty_input() {
        assert_eq!(
            validate_cycle_hours("  "),
            Err("Cycle Hours is required".to_string())
        );
    }

    #[test]
    fn test_cycle_hours_enforces_range() {
        assert_eq!(
            validate_cycle_hours("-1"),
            Err("Minimum value is 0".to_string())
        );
        assert_eq!(
            validate_cycle_hours("71"),
            Err("Maximum value is 70".to_string())
        );
        assert_eq!(validate_cycle_hours("0"), Ok(0));
        assert_eq!(validate_cycle_hours("70"), Ok(70));
    }

    #[test]
    fn test_validate_builds_request_from_captured_coordinates() {
        let request = filled_model().validate().expect("model is complete");
        assert_eq!(request.current_location, "51.52,-0.15");
        assert_eq!(request.pickup_location, "41.8781,-87.6298");
        assert_eq!(request.dropoff_location, "39.7392,-104.9903");
        assert_eq!(request.cycle_hours, 12);
    }

    #[test]
    fn test_validate_requires_current_location() {
        let mut model = filled_model();
        model.current_coords = None;
        let errors = model.validate().expect_err("current location missing");
        assert_eq!(
            errors.current,
            Some("Current location is required".to_string())
        );
    }

    #[test]
    fn test_sentinel_address_with_captured_coordinate_is_submittable() {
        let mut model = filled_model();
        model.current_display = geocode::UNKNOWN_LOCATION.to_string();
        let request = model.validate().expect("coordinate was captured");
        assert_eq!(request.current_location, "51.52,-0.15");
    }

    #[test]
    fn test_typed_text_without_picked_suggestion_is_not_submittable() {
        let mut model = filled_model();
        model.pickup.coords = None;
        let errors = model.validate().expect_err("no captured coordinate");
        assert_eq!(
            errors.pickup,
            Some("Pickup location is required".to_string())
        );
    }

    #[test]
    fn test_validate_requires_dropoff_text() {
        let mut model = filled_model();
        model.dropoff.text = String::new();
        let errors = model.validate().expect_err("dropoff text missing");
        assert_eq!(
            errors.dropoff,
            Some("Dropoff location is required".to_string())
        );
    }

    #[test]
    fn test_validate_collects_every_failure_at_once() {
        let mut model = filled_model();
        model.current_coords = None;
        model.pickup.coords = None;
        model.cycle_hours = "99".to_string();
        let errors = model.validate().expect_err("three failures");
        assert!(errors.current.is_some());
        assert!(errors.pickup.is_some());
        assert!(errors.cycle_hours.is_some());
        assert!(errors.dropoff.is_none());
    }
}
