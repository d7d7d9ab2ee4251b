pub mod label_placement;
pub mod projection;
pub mod ranking;
pub mod types;

pub use label_placement::{LabelBox, LabelMetrics, PlacedLabel, Placement, PlacementRegistry, place_labels};
pub use projection::{GeoBounds, MercatorFit};
pub use ranking::placement_order;
pub use types::{LabelLayout, LegendEntry, MapLayout, RouteLayout, RouteStyle, ScreenRect};

use crate::config::{LayoutConfig, RenderConfig};
use crate::ir::{ChangeCategory, Point, RouteFeature, RouteSet};
use crate::search::RouteDetails;
use crate::theme::Theme;

/// Classify, order, place and project every route with geometry.
///
/// Placement covers all routes regardless of `visible_categories`, so toggling a
/// category never moves the other labels.
pub fn compute_layout(
    routes: &RouteSet,
    theme: &Theme,
    config: &LayoutConfig,
    render: &RenderConfig,
) -> MapLayout {
    let palette = &theme.palette;
    let ordered: Vec<&RouteFeature> = placement_order(&routes.routes, palette)
        .into_iter()
        .filter(|route| route.has_geometry())
        .collect();

    let metrics = LabelMetrics::new(config.label_size, config.label_height_ratio);
    let placement = place_labels(ordered.iter().copied(), metrics);
    tracing::debug!(
        placed = placement.labels.len(),
        fallback = placement.fallback_count(),
        "label placement finished"
    );

    let width = f64::from(render.width.max(1.0));
    let height = f64::from(render.height.max(1.0));
    let bounds = GeoBounds::of(routes.with_geometry().flat_map(|route| route.flat_coordinates()));
    let fit = bounds.map(|bounds| MercatorFit::new(bounds, width, height, f64::from(config.padding)));

    let selected = config
        .selected_route
        .as_deref()
        .and_then(|id| RouteDetails::lookup(routes, id, palette));
    if let (Some(id), None) = (config.selected_route.as_deref(), selected.as_ref()) {
        tracing::warn!(route = id, "selected route not found");
    }

    let mut layouts = Vec::with_capacity(ordered.len());
    if let Some(fit) = fit {
        for route in &ordered {
            let parts = route
                .parts
                .iter()
                .map(|part| part.iter().map(|p| fit.project(*p)).collect())
                .collect();
            let label = placement.get(&route.route).map(|placed| {
                let corners = &placed.label_box;
                let a = fit.project(Point::new(corners.x1, corners.y1));
                let b = fit.project(Point::new(corners.x2, corners.y2));
                LabelLayout {
                    anchor: placed.anchor,
                    screen_anchor: fit.project(placed.anchor),
                    screen_box: ScreenRect::from_corners(a, b),
                    fallback: placed.fallback,
                }
            });
            layouts.push(RouteLayout {
                route: route.route.clone(),
                category: route.category,
                style: route_style(theme, route.category),
                visible: config.visible_categories.contains(&route.category),
                selected: selected.as_ref().is_some_and(|s| s.route == route.route),
                parts,
                label,
            });
        }
    }

    MapLayout {
        width,
        height,
        scenario: routes.scenario.clone(),
        routes: layouts,
        legend: legend_entries(theme),
        selection: selected,
        placement,
    }
}

pub fn route_style(theme: &Theme, category: ChangeCategory) -> RouteStyle {
    let palette = &theme.palette;
    RouteStyle {
        color: palette.color(category).to_string(),
        rgb: palette.rgb(category),
        rank: palette.rank(category),
        dash_array: palette.dash_array(category, theme.route_width),
    }
}

/// Legend rows, most severe category first.
pub fn legend_entries(theme: &Theme) -> Vec<LegendEntry> {
    ChangeCategory::ALL
        .iter()
        .rev()
        .map(|&category| LegendEntry {
            category,
            label: category.to_string(),
            color: theme.palette.color(category).to_string(),
        })
        .collect()
}
