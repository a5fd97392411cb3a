use std::collections::HashMap;

use fleetsim_api::models::GeoPoint;

/// A named, ordered path through a city as `(longitude, latitude)` pairs.
#[derive(Debug)]
pub struct Route {
    pub city: &'static str,
    pub waypoints: &'static [(f64, f64)],
}

impl Route {
    pub fn point(&self, index: usize) -> GeoPoint {
        let (lon, lat) = self.waypoints[index % self.waypoints.len()];
        GeoPoint { lat, lon }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

pub const DEFAULT_CITY: &str = "Toronto";

pub const ROUTES: &[Route] = &[
    Route {
        city: "Toronto",
        waypoints: &[
            (-79.3832, 43.6532), // Downtown
            (-79.3871, 43.6629), // Queen's Park
            (-79.3944, 43.6702), // Annex
            (-79.4282, 43.6928), // towards Yorkdale
            (-79.4502, 43.7076),
            (-79.4651, 43.7192), // North York
        ],
    },
    Route {
        city: "Ottawa",
        waypoints: &[
            (-75.6972, 45.4215), // Parliament Hill
            (-75.6910, 45.4296), // ByWard Market
            (-75.6802, 45.4415), // Rideau Canal
            (-75.6732, 45.4487), // Sandy Hill
            (-75.6598, 45.4602), // Vanier
            (-75.6453, 45.4701),
        ],
    },
];

/// Route for `city`, or the default city's route for unknown names.
pub fn route(city: &str) -> &'static Route {
    ROUTES
        .iter()
        .find(|route| route.city == city)
        .or_else(|| ROUTES.iter().find(|route| route.city == DEFAULT_CITY))
        .unwrap_or(&ROUTES[0])
}

/// Per-city position along its route. Every city advances independently.
#[derive(Debug, Default, Clone)]
pub struct RouteCursor {
    positions: HashMap<&'static str, usize>,
}

impl RouteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits the waypoint under the city's cursor and moves the cursor on,
    /// wrapping after the last waypoint.
    pub fn advance(&mut self, city: &str) -> GeoPoint {
        let route = route(city);
        let index = self.positions.entry(route.city).or_insert(0);

        let point = route.point(*index);
        *index = (*index + 1) % route.len();

        point
    }

    pub fn position(&self, city: &str) -> usize {
        self.positions.get(route(city).city).copied().unwrap_or(0)
    }
}
