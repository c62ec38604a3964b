use std::collections::HashSet;

use seed::{prelude::*, *};
use shared::{format_duration, Trip};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Recent,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripSection {
    Routes,
    FuelStops,
    WaterAlerts,
}

impl TripSection {
    fn title(self) -> &'static str {
        match self {
            Self::Routes => "Available Routes",
            Self::FuelStops => "Fuel Stops",
            Self::WaterAlerts => "Water Alerts",
        }
    }
}

/// Identity of one collapsible section. The trip index keeps sections of
/// different history entries independent even though they share a section
/// kind; the recent tab always uses index zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionKey {
    pub tab: Tab,
    pub section: TripSection,
    pub trip_index: usize,
}

pub struct Model {
    active_tab: Tab,
    expanded: HashSet<SectionKey>,
}

impl Model {
    pub fn new() -> Self {
        Self {
            active_tab: Tab::Recent,
            expanded: HashSet::new(),
        }
    }

    fn is_expanded(&self, key: SectionKey) -> bool {
        self.expanded.contains(&key)
    }

    fn toggle(&mut self, key: SectionKey) {
        if !self.expanded.insert(key) {
            self.expanded.remove(&key);
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

pub enum Msg {
    TabSwitched(Tab),
    SectionToggled(SectionKey),
    PlanTripClicked,
}

pub enum Event {
    PlanTripRequested,
}

pub fn update(msg: Msg, model: &mut Model) -> Option<Event> {
    match msg {
        Msg::TabSwitched(tab) => {
            model.active_tab = tab;
            None
        }
        Msg::SectionToggled(key) => {
            model.toggle(key);
            None
        }
        Msg::PlanTripClicked => Some(Event::PlanTripRequested),
    }
}

pub fn view(model: &Model, recent: Option<&Trip>, history: &[Trip], loading: bool) -> Node<Msg> {
    aside![
        C!["trip-panel"],
        div![
            C!["panel-header"],
            h2!["Trips"],
            button![
                "Add Trip",
                ev(Ev::Click, |event| {
                    event.stop_propagation();
                    Msg::PlanTripClicked
                }),
            ],
        ],
        view_tabs(model),
        match model.active_tab {
            Tab::Recent => view_recent(model, recent, loading),
            Tab::History => view_history(model, history, loading),
        },
    ]
}

fn view_tabs(model: &Model) -> Node<Msg> {
    let tab_button = |tab: Tab, label: &str| {
        button![
            C![IF!(model.active_tab == tab => "active")],
            label,
            ev(Ev::Click, move |_| Msg::TabSwitched(tab)),
        ]
    };
    div![
        C!["panel-tabs"],
        tab_button(Tab::Recent, "Recent Trips"),
        tab_button(Tab::History, "Routes History"),
    ]
}

fn view_recent(model: &Model, recent: Option<&Trip>, loading: bool) -> Node<Msg> {
    if loading {
        return p![C!["panel-status"], "Loading trips..."];
    }
    let Some(trip) = recent else {
        return p![C!["panel-status"], "No Trips in History"];
    };
    div![
        C!["trip-card"],
        p![total_miles_label(trip.total_miles)],
        p![format!("Current: {}", trip.current_address)],
        p![format!("Pickup: {}", trip.pickup_address)],
        p![format!("Dropoff: {}", trip.dropoff_address)],
        p![format!("Cycle Hours: {} hrs", trip.cycle_hours)],
        view_trip_sections(model, trip, Tab::Recent, 0),
    ]
}

fn view_history(model: &Model, history: &[Trip], loading: bool) -> Node<Msg> {
    if loading {
        return p![C!["panel-status"], "Loading trips..."];
    }
    if history.is_empty() {
        return p![C!["panel-status"], "No Trips in History"];
    }
    div![
        C!["trip-list"],
        history
            .iter()
            .enumerate()
            .map(|(index, trip)| {
                div![
                    C!["trip-card"],
                    h3![format!("Trip {}", index + 1)],
                    p![total_miles_label(trip.total_miles)],
                    p![format!("Pickup: {}", trip.pickup_address)],
                    p![format!("Dropoff: {}", trip.dropoff_address)],
                    view_trip_sections(model, trip, Tab::History, index),
                ]
            })
            .collect::<Vec<_>>(),
    ]
}

fn view_trip_sections(model: &Model, trip: &Trip, tab: Tab, trip_index: usize) -> Node<Msg> {
    div![
        C!["trip-sections"],
        view_section(
            model,
            SectionKey {
                tab,
                section: TripSection::Routes,
                trip_index,
            },
            route_rows(trip),
        ),
        view_section(
            model,
            SectionKey {
                tab,
                section: TripSection::FuelStops,
                trip_index,
            },
            fuel_rows(trip),
        ),
        view_section(
            model,
            SectionKey {
                tab,
                section: TripSection::WaterAlerts,
                trip_index,
            },
            alert_rows(trip),
        ),
    ]
}

fn view_section(model: &Model, key: SectionKey, rows: Vec<Node<Msg>>) -> Node<Msg> {
    let expanded = model.is_expanded(key);
    div![
        C!["trip-section"],
        button![
            C!["section-header"],
            span![key.section.title()],
            span![if expanded { "\u{25be}" } else { "\u{25b8}" }],
            ev(Ev::Click, move |_| Msg::SectionToggled(key)),
        ],
        if expanded {
            div![C!["section-body"], rows]
        } else {
            empty![]
        },
    ]
}

fn route_rows(trip: &Trip) -> Vec<Node<Msg>> {
    if trip.available_routes.is_empty() {
        return vec![p![C!["section-empty"], "No routes available"]];
    }
    trip.available_routes
        .iter()
        .enumerate()
        .map(|(index, route)| {
            div![
                C!["section-row"],
                p![format!("Route {}", index + 1)],
                p![format!("Duration: {}", format_duration(route.duration))],
                p![format!("Distance: {:.2} km", route.distance)],
            ]
        })
        .collect()
}

fn fuel_rows(trip: &Trip) -> Vec<Node<Msg>> {
    if trip.fuel_stops.is_empty() {
        return vec![p![C!["section-empty"], "No fuel stops available"]];
    }
    trip.fuel_stops
        .iter()
        .map(|stop| {
            div![
                C!["section-row"],
                p![stop.location.clone()],
                p![fuel_distance_label(stop.distance_from_start)],
            ]
        })
        .collect()
}

fn total_miles_label(total_miles: f64) -> String {
    format!("Total Miles: {total_miles:.2}")
}

// distance_from_start is kilometres on the wire.
fn fuel_distance_label(distance_from_start: f64) -> String {
    format!("Distance from start: {distance_from_start:.2} km")
}

fn alert_rows(trip: &Trip) -> Vec<Node<Msg>> {
    if trip.water_alerts.is_empty() {
        return vec![p![C!["section-empty"], "No water alerts available"]];
    }
    trip.water_alerts
        .iter()
        .enumerate()
        .map(|(index, alert)| {
            div![
                C!["section-row"],
                p![format!("Alert {}", index + 1)],
                p![format!("Level: {}", alert.alert_level)],
                p![format!("Location: {}", alert.location)],
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(tab: Tab, section: TripSection, trip_index: usize) -> SectionKey {
        SectionKey {
            tab,
            section,
            trip_index,
        }
    }

    #[test]
    fn test_sections_start_collapsed() {
        let model = Model::new();
        assert!(!model.is_expanded(key(Tab::Recent, TripSection::Routes, 0)));
    }

    #[test]
    fn test_toggle_expands_and_collapses() {
        let mut model = Model::new();
        let routes = key(Tab::Recent, TripSection::Routes, 0);
        model.toggle(routes);
        assert!(model.is_expanded(routes));
        model.toggle(routes);
        assert!(!model.is_expanded(routes));
    }

    #[test]
    fn test_same_section_is_independent_across_trips() {
        let mut model = Model::new();
        model.toggle(key(Tab::History, TripSection::FuelStops, 0));
        assert!(!model.is_expanded(key(Tab::History, TripSection::FuelStops, 1)));
    }

    #[test]
    fn test_same_section_is_independent_across_tabs() {
        let mut model = Model::new();
        model.toggle(key(Tab::Recent, TripSection::Routes, 0));
        assert!(!model.is_expanded(key(Tab::History, TripSection::Routes, 0)));
    }

    #[test]
    fn test_switching_tabs_preserves_expansion() {
        let mut model = Model::new();
        let routes = key(Tab::Recent, TripSection::Routes, 0);
        model.toggle(routes);
        update(Msg::TabSwitched(Tab::History), &mut model);
        update(Msg::TabSwitched(Tab::Recent), &mut model);
        assert!(model.is_expanded(routes));
    }

    #[test]
    fn test_plan_trip_click_raises_event() {
        let mut model = Model::new();
        assert!(matches!(
            update(Msg::PlanTripClicked, &mut model),
            Some(Event::PlanTripRequested)
        ));
    }

    #[test]
    fn test_fuel_distance_is_labelled_in_kilometres() {
        assert_eq!(fuel_distance_label(40.0), "Distance from start: 40.00 km");
    }

    #[test]
    fn test_total_miles_rounds_to_two_decimals() {
        assert_eq!(total_miles_label(120.533_333), "Total Miles: 120.53");
        assert_eq!(total_miles_label(85.0), "Total Miles: 85.00");
    }
}
