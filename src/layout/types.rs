use super::label_placement::Placement;
use crate::ir::{ChangeCategory, Point};
use crate::search::RouteDetails;
use serde::Serialize;

/// Screen-space rectangle, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStyle {
    pub color: String,
    pub rgb: [u8; 3],
    pub rank: u32,
    pub dash_array: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelLayout {
    /// Anchor in geometry coordinates.
    pub anchor: Point,
    pub screen_anchor: Point,
    pub screen_box: ScreenRect,
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLayout {
    pub route: String,
    pub category: ChangeCategory,
    pub style: RouteStyle,
    pub visible: bool,
    pub selected: bool,
    /// Projected line parts.
    pub parts: Vec<Vec<Point>>,
    pub label: Option<LabelLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub category: ChangeCategory,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapLayout {
    pub width: f64,
    pub height: f64,
    pub scenario: String,
    /// Routes with geometry, in placement (and draw) order.
    pub routes: Vec<RouteLayout>,
    pub legend: Vec<LegendEntry>,
    pub selection: Option<RouteDetails>,
    #[serde(skip)]
    pub placement: Placement,
}

impl MapLayout {
    pub fn route(&self, id: &str) -> Option<&RouteLayout> {
        self.routes.iter().find(|route| route.route == id)
    }

    pub fn visible_routes(&self) -> impl Iterator<Item = &RouteLayout> {
        self.routes.iter().filter(|route| route.visible)
    }
}
