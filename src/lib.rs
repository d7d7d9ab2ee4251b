#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dataset;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod search;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, DataConfig, LayoutConfig, RenderConfig, load_config};
pub use dataset::build_route_set;
pub use ir::{ChangeCategory, Point, RouteFeature, RouteSet, ServiceChange};
pub use layout::{LabelMetrics, MapLayout, Placement, compute_layout, place_labels};
pub use render::render_svg;
pub use theme::Theme;

/// Parse both inputs and join them under `config.data`.
pub fn load_routes(routes_geojson: &str, changes_json: &str, config: &DataConfig) -> anyhow::Result<RouteSet> {
    let shapes = parser::parse_route_shapes(routes_geojson, &config.route_property)?;
    let changes = parser::parse_service_changes(changes_json)?;
    Ok(build_route_set(shapes, changes, config)?)
}

/// Inputs as JSON text to a finished layout.
pub fn layout_with_options(routes_geojson: &str, changes_json: &str, config: &Config) -> anyhow::Result<MapLayout> {
    let routes = load_routes(routes_geojson, changes_json, &config.data)?;
    Ok(compute_layout(&routes, &config.theme, &config.layout, &config.render))
}

/// Inputs as JSON text to an SVG document.
pub fn render_with_options(routes_geojson: &str, changes_json: &str, config: &Config) -> anyhow::Result<String> {
    let layout = layout_with_options(routes_geojson, changes_json, config)?;
    Ok(render_svg(&layout, &config.theme, &config.render))
}
