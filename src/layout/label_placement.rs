// Greedy route-label placement. Each route claims the first point along its own
// path whose label box is clear of every box committed before it; routes that run
// out of points keep their start point.

use crate::ir::{Point, RouteFeature};
use serde::Serialize;
use std::collections::BTreeMap;

/// Axis-aligned label rectangle. Bounds are inclusive for overlap tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl LabelBox {
    /// Box centered horizontally on the anchor, hanging from it along +y.
    pub fn at(anchor: Point, width: f64, height: f64) -> Self {
        Self {
            x1: anchor.x - width / 2.0,
            y1: anchor.y,
            x2: anchor.x + width / 2.0,
            y2: anchor.y + height,
        }
    }

    pub fn overlaps(&self, other: &LabelBox) -> bool {
        self.x2 >= other.x1 && self.x1 <= other.x2 && self.y1 <= other.y2 && self.y2 >= other.y1
    }
}

/// Label dimensions derived from the configured label size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelMetrics {
    pub height: f64,
}

impl LabelMetrics {
    pub fn new(label_size: f64, height_ratio: f64) -> Self {
        Self {
            height: label_size * height_ratio,
        }
    }

    /// Box height as-is; width grows with the label text.
    pub fn from_height(height: f64) -> Self {
        Self { height }
    }

    pub fn width(&self, text: &str) -> f64 {
        let chars = text.chars().count() as f64;
        self.height.max(self.height / 2.0 * chars)
    }

    pub fn label_box(&self, anchor: Point, text: &str) -> LabelBox {
        LabelBox::at(anchor, self.width(text), self.height)
    }
}

/// Committed label boxes for one placement pass.
#[derive(Debug, Default)]
pub struct PlacementRegistry {
    boxes: Vec<LabelBox>,
}

impl PlacementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_free(&self, candidate: &LabelBox) -> bool {
        !self.boxes.iter().any(|placed| placed.overlaps(candidate))
    }

    pub fn commit(&mut self, label_box: LabelBox) {
        self.boxes.push(label_box);
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLabel {
    pub route: String,
    pub anchor: Point,
    pub label_box: LabelBox,
    /// The route's coordinates were exhausted and the label sits on its start
    /// point regardless of overlap.
    pub fallback: bool,
}

/// Result of one placement pass, in placement order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Placement {
    pub labels: Vec<PlacedLabel>,
}

impl Placement {
    pub fn get(&self, route: &str) -> Option<&PlacedLabel> {
        self.labels.iter().find(|label| label.route == route)
    }

    /// Route id to label anchor.
    pub fn anchors(&self) -> BTreeMap<String, Point> {
        self.labels
            .iter()
            .map(|label| (label.route.clone(), label.anchor))
            .collect()
    }

    pub fn fallback_count(&self) -> usize {
        self.labels.iter().filter(|label| label.fallback).count()
    }

    /// Pairs `(earlier, later)` of overlapping boxes. Every `later` entry of a
    /// valid pass is a fallback label.
    pub fn conflicts(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for (later, label) in self.labels.iter().enumerate() {
            for (earlier, placed) in self.labels[..later].iter().enumerate() {
                if placed.label_box.overlaps(&label.label_box) {
                    out.push((earlier, later));
                }
            }
        }
        out
    }
}

/// Place one label per route with geometry, in the given order. Routes without
/// geometry are skipped.
pub fn place_labels<'a, I>(routes: I, metrics: LabelMetrics) -> Placement
where
    I: IntoIterator<Item = &'a RouteFeature>,
{
    let mut registry = PlacementRegistry::new();
    let mut placement = Placement::default();

    for route in routes {
        let Some(start) = route.start() else {
            continue;
        };
        let width = metrics.width(&route.route);

        let found = route
            .flat_coordinates()
            .map(|candidate| (candidate, LabelBox::at(candidate, width, metrics.height)))
            .find(|(_, candidate_box)| registry.is_free(candidate_box));

        let (anchor, label_box, fallback) = match found {
            Some((anchor, label_box)) => (anchor, label_box, false),
            None => {
                tracing::debug!(route = %route.route, "no free label position, using route start");
                (start, LabelBox::at(start, width, metrics.height), true)
            }
        };

        registry.commit(label_box);
        placement.labels.push(PlacedLabel {
            route: route.route.clone(),
            anchor,
            label_box,
            fallback,
        });
    }

    placement
}
