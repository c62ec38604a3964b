use seed::{prelude::*, *};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::to_value;
use shared::{Coordinate, Route, TripRequest};
use wasm_bindgen::{
    prelude::{wasm_bindgen, JsValue},
    JsCast,
};

use crate::geolocation;
use crate::session::RouteSession;
use crate::NoticeLevel;

/// Center used when the device position is unavailable or too slow.
pub const FALLBACK_COORD: Coordinate = Coordinate {
    lat: 51.505,
    lon: -0.09,
};

/// Cycle hours attached to map-initiated submissions; the form is not open
/// in that flow, so there is nothing to ask the user.
pub const DEFAULT_CYCLE_HOURS: u32 = 5;

/// How long the app waits for the device position before falling back.
const LOCATION_WAIT_MS: u32 = 5_000;

const SELECTED_COLOR: &str = "red";
const UNSELECTED_COLOR: &str = "#BDC3C7";
const SELECTED_WEIGHT: u32 = 6;
const UNSELECTED_WEIGHT: u32 = 4;
const SELECTED_OPACITY: f64 = 1.0;
const UNSELECTED_OPACITY: f64 = 0.6;

#[wasm_bindgen(module = "/leaflet_map.js")]
extern "C" {
    #[wasm_bindgen(js_name = initMap)]
    fn init_map();
    #[wasm_bindgen(js_name = setBaseLayer)]
    fn set_base_layer(layer: &str);
    #[wasm_bindgen(js_name = centerMap)]
    fn center_map(lat: f64, lon: f64);
    #[wasm_bindgen(js_name = updateUserMarker)]
    fn update_user_marker(coord: JsValue);
    #[wasm_bindgen(js_name = updateTemporaryMarker)]
    fn update_temporary_marker(coord: JsValue);
    #[wasm_bindgen(js_name = updateEndpointMarkers)]
    fn update_endpoint_markers(pickup: JsValue, dropoff: JsValue);
    #[wasm_bindgen(js_name = renderRoutes)]
    fn render_routes(routes: JsValue);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationSource {
    Platform,
    Fallback,
}

/// Result of racing the platform position against [`LOCATION_WAIT_MS`].
/// Whichever side settles first wins; the loser finds the state already
/// resolved and changes nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationState {
    Pending,
    Resolved {
        coord: Coordinate,
        source: LocationSource,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuState {
    Idle,
    Open { coord: Coordinate, x: f64, y: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Pickup,
    Dropoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseLayer {
    OsmHot,
    Osm,
}

impl BaseLayer {
    pub fn label(self) -> &'static str {
        match self {
            Self::OsmHot => "OpenStreetMap.HOT",
            Self::Osm => "OpenStreetMap",
        }
    }

    fn id(self) -> &'static str {
        match self {
            Self::OsmHot => "osm-hot",
            Self::Osm => "osm",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::OsmHot => Self::Osm,
            Self::Osm => Self::OsmHot,
        }
    }
}

pub struct Model {
    location: LocationState,
    menu: MenuState,
    pickup: Option<Coordinate>,
    dropoff: Option<Coordinate>,
    base_layer: BaseLayer,
}

impl Model {
    fn new() -> Self {
        Self {
            location: LocationState::Pending,
            menu: MenuState::Idle,
            pickup: None,
            dropoff: None,
            base_layer: BaseLayer::OsmHot,
        }
    }

    /// First writer wins; later settlers are ignored.
    fn settle_location(&mut self, coord: Coordinate, source: LocationSource) -> bool {
        if let LocationState::Resolved { .. } = self.location {
            return false;
        }
        self.location = LocationState::Resolved { coord, source };
        true
    }

    fn open_menu(&mut self, coord: Coordinate, x: f64, y: f64) {
        self.menu = MenuState::Open { coord, x, y };
    }

    fn dismiss_menu(&mut self) -> bool {
        match self.menu {
            MenuState::Open { .. } => {
                self.menu = MenuState::Idle;
                true
            }
            MenuState::Idle => false,
        }
    }

    /// Captures the menu coordinate into the chosen endpoint and closes the
    /// menu. Returns the captured coordinate, or `None` when no menu was
    /// open.
    fn choose_endpoint(&mut self, endpoint: Endpoint) -> Option<Coordinate> {
        let MenuState::Open { coord, .. } = self.menu else {
            return None;
        };
        match endpoint {
            Endpoint::Pickup => self.pickup = Some(coord),
            Endpoint::Dropoff => self.dropoff = Some(coord),
        }
        self.menu = MenuState::Idle;
        Some(coord)
    }

    fn current_coordinate(&self) -> Coordinate {
        match self.location {
            LocationState::Resolved { coord, .. } => coord,
            LocationState::Pending => FALLBACK_COORD,
        }
    }

    /// A submission is due as soon as both endpoints are placed; re-placing
    /// either one triggers a fresh submission.
    fn plan_request(&self) -> Option<TripRequest> {
        let pickup = self.pickup?;
        let dropoff = self.dropoff?;
        Some(TripRequest::from_coordinates(
            self.current_coordinate(),
            pickup,
            dropoff,
            DEFAULT_CYCLE_HOURS,
        ))
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct MenuDetail {
    lat: f64,
    lon: f64,
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RouteClickDetail {
    index: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
struct RoutePaint {
    path: Vec<Coordinate>,
    color: &'static str,
    weight: u32,
    opacity: f64,
}

pub enum Msg {
    ContextMenuOpened { coord: Coordinate, x: f64, y: f64 },
    MenuChoiceMade(Endpoint),
    MenuDismissed,
    RouteLineClicked(usize),
    LocationResolved(Result<Coordinate, String>),
    LocationTimedOut,
    BaseLayerSwitched(BaseLayer),
}

pub enum Event {
    PlanRequested(TripRequest),
    Notified(NoticeLevel, String),
}

/// Mounts the Leaflet map into its host element. Must run before the first
/// render so the overlays have something to sit on.
pub fn mount() {
    init_map();
}

pub fn init(orders: &mut impl Orders<Msg>) -> Model {
    orders.stream(streams::window_event(Ev::from("map-contextmenu"), |event| {
        let event = event
            .dyn_into::<web_sys::CustomEvent>()
            .expect("map-contextmenu must be a custom event");
        let detail: MenuDetail =
            serde_wasm_bindgen::from_value(event.detail()).unwrap_or_default();
        Msg::ContextMenuOpened {
            coord: Coordinate {
                lat: detail.lat,
                lon: detail.lon,
            },
            x: detail.x,
            y: detail.y,
        }
    }));
    orders.stream(streams::window_event(Ev::from("map-click"), |_| {
        Msg::MenuDismissed
    }));
    orders.stream(streams::window_event(Ev::from("map-route-click"), |event| {
        let event = event
            .dyn_into::<web_sys::CustomEvent>()
            .expect("map-route-click must be a custom event");
        let detail = serde_wasm_bindgen::from_value(event.detail())
            .unwrap_or(RouteClickDetail { index: usize::MAX });
        Msg::RouteLineClicked(detail.index)
    }));
    orders.perform_cmd(async { Msg::LocationResolved(geolocation::current_position().await) });
    orders.perform_cmd(cmds::timeout(LOCATION_WAIT_MS, || Msg::LocationTimedOut));
    Model::new()
}

pub fn update(msg: Msg, model: &mut Model, session: &mut RouteSession) -> Option<Event> {
    match msg {
        Msg::ContextMenuOpened { coord, x, y } => {
            model.open_menu(coord, x, y);
            push_temporary_marker(Some(coord));
            None
        }
        Msg::MenuDismissed => {
            if model.dismiss_menu() {
                push_temporary_marker(None);
            }
            None
        }
        Msg::MenuChoiceMade(endpoint) => {
            model.choose_endpoint(endpoint)?;
            push_temporary_marker(None);
            push_endpoint_markers(model.pickup, model.dropoff);
            model.plan_request().map(Event::PlanRequested)
        }
        Msg::RouteLineClicked(index) => {
            if session.select(index) {
                redraw_routes(session);
            } else {
                web_sys::console::warn_1(
                    &format!("[frontend] ignoring click on unknown route {index}").into(),
                );
            }
            None
        }
        Msg::LocationResolved(Ok(coord)) => {
            if model.settle_location(coord, LocationSource::Platform) {
                push_user_marker(coord);
                center_map(coord.lat, coord.lon);
            }
            None
        }
        Msg::LocationResolved(Err(err)) => {
            if !model.settle_location(FALLBACK_COORD, LocationSource::Fallback) {
                return None;
            }
            web_sys::console::warn_1(&format!("[frontend] location unavailable: {err}").into());
            push_user_marker(FALLBACK_COORD);
            Some(Event::Notified(
                NoticeLevel::Error,
                "Location access denied. Map will load default position.".to_string(),
            ))
        }
        Msg::LocationTimedOut => {
            if !model.settle_location(FALLBACK_COORD, LocationSource::Fallback) {
                return None;
            }
            push_user_marker(FALLBACK_COORD);
            Some(Event::Notified(
                NoticeLevel::Warning,
                "Using default location due to timeout.".to_string(),
            ))
        }
        Msg::BaseLayerSwitched(layer) => {
            model.base_layer = layer;
            set_base_layer(layer.id());
            None
        }
    }
}

/// Repaints every candidate polyline from the session state.
pub fn redraw_routes(session: &RouteSession) {
    let paints = paint_routes(session.routes(), session.selected());
    if let Ok(value) = to_value(&paints) {
        render_routes(value);
    }
}

fn paint_routes(routes: &[Route], selected: Option<usize>) -> Vec<RoutePaint> {
    routes
        .iter()
        .enumerate()
        .map(|(idx, route)| {
            let is_selected = selected == Some(idx);
            RoutePaint {
                path: route.path.clone(),
                color: if is_selected {
                    SELECTED_COLOR
                } else {
                    UNSELECTED_COLOR
                },
                weight: if is_selected {
                    SELECTED_WEIGHT
                } else {
                    UNSELECTED_WEIGHT
                },
                opacity: if is_selected {
                    SELECTED_OPACITY
                } else {
                    UNSELECTED_OPACITY
                },
            }
        })
        .collect()
}

fn push_user_marker(coord: Coordinate) {
    if let Ok(value) = to_value(&coord) {
        update_user_marker(value);
    }
}

fn push_temporary_marker(coord: Option<Coordinate>) {
    if let Ok(value) = to_value(&coord) {
        update_temporary_marker(value);
    }
}

fn push_endpoint_markers(pickup: Option<Coordinate>, dropoff: Option<Coordinate>) {
    if let (Ok(pickup), Ok(dropoff)) = (to_value(&pickup), to_value(&dropoff)) {
        update_endpoint_markers(pickup, dropoff);
    }
}

pub fn view(model: &Model, submitting: bool) -> Node<Msg> {
    div![
        C!["map-surface"],
        view_layer_toggle(model),
        if let LocationState::Pending = model.location {
            view_overlay("Loading map...")
        } else {
            empty![]
        },
        if submitting {
            view_overlay("Planning trip...")
        } else {
            empty![]
        },
        view_context_menu(model),
    ]
}

fn view_layer_toggle(model: &Model) -> Node<Msg> {
    let target = model.base_layer.other();
    button![
        C!["layer-toggle"],
        format!("View {}", target.label()),
        ev(Ev::Click, move |event| {
            event.stop_propagation();
            Msg::BaseLayerSwitched(target)
        }),
    ]
}

fn view_overlay(text: &str) -> Node<Msg> {
    div![C!["map-overlay"], div![C!["spinner"]], p![text]]
}

fn view_context_menu(model: &Model) -> Node<Msg> {
    let MenuState::Open { coord, x, y } = model.menu else {
        return empty![];
    };
    div![
        C!["map-context-menu"],
        style! {
            St::Left => format!("{x}px"),
            St::Top => format!("{y}px"),
        },
        p![
            C!["menu-coordinate"],
            format!("{:.4}, {:.4}", coord.lat, coord.lon)
        ],
        button![
            "Route From",
            ev(Ev::Click, |event| {
                event.stop_propagation();
                Msg::MenuChoiceMade(Endpoint::Pickup)
            }),
        ],
        button![
            "Route To",
            ev(Ev::Click, |event| {
                event.stop_propagation();
                Msg::MenuChoiceMade(Endpoint::Dropoff)
            }),
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    fn route(distance: f64, path: Vec<Coordinate>) -> Route {
        Route {
            duration: 1.0,
            distance,
            path,
        }
    }

    #[test]
    fn test_platform_fix_wins_over_late_timeout() {
        let mut model = Model::new();
        assert!(model.settle_location(coord(40.0, -75.0), LocationSource::Platform));
        assert!(!model.settle_location(FALLBACK_COORD, LocationSource::Fallback));
        assert_eq!(
            model.location,
            LocationState::Resolved {
                coord: coord(40.0, -75.0),
                source: LocationSource::Platform,
            }
        );
    }

    #[test]
    fn test_timeout_wins_over_late_platform_fix() {
        let mut model = Model::new();
        assert!(model.settle_location(FALLBACK_COORD, LocationSource::Fallback));
        assert!(!model.settle_location(coord(40.0, -75.0), LocationSource::Platform));
        assert_eq!(model.current_coordinate(), FALLBACK_COORD);
    }

    #[test]
    fn test_menu_choice_without_open_menu_does_nothing() {
        let mut model = Model::new();
        assert_eq!(model.choose_endpoint(Endpoint::Pickup), None);
        assert_eq!(model.pickup, None);
    }

    #[test]
    fn test_menu_choice_captures_coordinate_and_closes_menu() {
        let mut model = Model::new();
        model.open_menu(coord(41.0, -87.0), 10.0, 20.0);
        assert_eq!(
            model.choose_endpoint(Endpoint::Pickup),
            Some(coord(41.0, -87.0))
        );
        assert_eq!(model.pickup, Some(coord(41.0, -87.0)));
        assert_eq!(model.menu, MenuState::Idle);
    }

    #[test]
    fn test_no_submission_until_both_endpoints_set() {
        let mut model = Model::new();
        model.open_menu(coord(41.0, -87.0), 0.0, 0.0);
        model.choose_endpoint(Endpoint::Pickup);
        assert!(model.plan_request().is_none());

        model.open_menu(coord(42.0, -88.0), 0.0, 0.0);
        model.choose_endpoint(Endpoint::Dropoff);
        let request = model.plan_request().expect("both endpoints placed");
        assert_eq!(request.pickup_location, "41,-87");
        assert_eq!(request.dropoff_location, "42,-88");
        assert_eq!(request.cycle_hours, DEFAULT_CYCLE_HOURS);
    }

    #[test]
    fn test_endpoints_may_arrive_in_either_order() {
        let mut model = Model::new();
        model.open_menu(coord(42.0, -88.0), 0.0, 0.0);
        model.choose_endpoint(Endpoint::Dropoff);
        model.open_menu(coord(41.0, -87.0), 0.0, 0.0);
        model.choose_endpoint(Endpoint::Pickup);
        assert!(model.plan_request().is_some());
    }

    #[test]
    fn test_plan_request_uses_resolved_position() {
        let mut model = Model::new();
        model.settle_location(coord(39.5, -76.5), LocationSource::Platform);
        model.open_menu(coord(41.0, -87.0), 0.0, 0.0);
        model.choose_endpoint(Endpoint::Pickup);
        model.open_menu(coord(42.0, -88.0), 0.0, 0.0);
        model.choose_endpoint(Endpoint::Dropoff);
        let request = model.plan_request().expect("both endpoints placed");
        assert_eq!(request.current_location, "39.5,-76.5");
    }

    #[test]
    fn test_dismiss_reports_whether_menu_was_open() {
        let mut model = Model::new();
        assert!(!model.dismiss_menu());
        model.open_menu(coord(1.0, 2.0), 0.0, 0.0);
        assert!(model.dismiss_menu());
        assert_eq!(model.menu, MenuState::Idle);
    }

    #[test]
    fn test_selected_route_is_painted_for_emphasis() {
        let path = vec![coord(1.0, 2.0), coord(3.0, 4.0)];
        let paints = paint_routes(
            &[route(10.0, path.clone()), route(5.0, Vec::new())],
            Some(0),
        );
        assert_eq!(paints[0].color, SELECTED_COLOR);
        assert_eq!(paints[0].weight, SELECTED_WEIGHT);
        assert!((paints[0].opacity - SELECTED_OPACITY).abs() < 1e-9);
        assert_eq!(paints[0].path, path);
        assert_eq!(paints[1].color, UNSELECTED_COLOR);
        assert_eq!(paints[1].weight, UNSELECTED_WEIGHT);
        assert!((paints[1].opacity - UNSELECTED_OPACITY).abs() < 1e-9);
    }

    #[test]
    fn test_no_selection_paints_everything_muted() {
        let paints = paint_routes(&[route(10.0, Vec::new())], None);
        assert_eq!(paints[0].color, UNSELECTED_COLOR);
    }

    #[test]
    fn test_base_layer_toggle_alternates() {
        assert_eq!(BaseLayer::OsmHot.other(), BaseLayer::Osm);
        assert_eq!(BaseLayer::Osm.other(), BaseLayer::OsmHot);
    }
}
