use shared::{shortest_route_index, Route};

/// Store for the candidate routes of the current planning session and the
/// index currently highlighted on the map. The root model owns the single
/// instance and hands it down by reference, so every consumer is reachable
/// from the owner and none can outlive it.
#[derive(Debug, Default)]
pub struct RouteSession {
    routes: Vec<Route>,
    selected: Option<usize>,
}

impl RouteSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Replaces the whole candidate set. The selection is recomputed from the
    /// new set: shortest total distance wins, first occurrence on ties.
    pub fn replace_routes(&mut self, routes: Vec<Route>) {
        self.selected = shortest_route_index(&routes);
        self.routes = routes;
    }

    /// Moves the highlight. An out-of-range index leaves the state untouched
    /// and reports failure so the caller can log it.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.routes.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }
}
