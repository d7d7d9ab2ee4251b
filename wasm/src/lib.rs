use service_change_map::{Config, ChangeCategory, layout_dump::layout_dump_json, layout_with_options, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapOptions {
    scenario: Option<String>,
    label_size: Option<f64>,
    width: Option<f32>,
    height: Option<f32>,
    visible_categories: Option<Vec<String>>,
    selected_route: Option<String>,
    title: Option<String>,
}

fn build_config(options: MapOptions) -> Result<Config, String> {
    let mut config = Config::default();
    if let Some(scenario) = options.scenario {
        config.data.scenario = scenario;
    }
    if let Some(size) = options.label_size.filter(|s| s.is_finite() && *s > 0.0) {
        config.layout.label_size = size;
    }
    if let Some(width) = options.width {
        config.render.width = width;
    }
    if let Some(height) = options.height {
        config.render.height = height;
    }
    if let Some(names) = options.visible_categories {
        config.layout.visible_categories = names
            .iter()
            .map(|name| name.parse::<ChangeCategory>().map_err(|err| err.to_string()))
            .collect::<Result<_, _>>()?;
    }
    config.layout.selected_route = options.selected_route.filter(|route| !route.is_empty());
    if let Some(title) = options.title {
        config.render.title = title;
    }
    Ok(config)
}

fn parse_options(options_json: Option<String>) -> Result<Config, JsValue> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<MapOptions>(&raw).map_err(|error| JsValue::from_str(&error.to_string()))?,
        None => MapOptions::default(),
    };
    build_config(options).map_err(|error| JsValue::from_str(&error))
}

/// Route labels and styles as a JSON layout dump.
#[wasm_bindgen]
pub fn place_route_labels(routes_geojson: &str, changes_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let config = parse_options(options_json)?;
    let layout = layout_with_options(routes_geojson, changes_json, &config)
        .map_err(|error| JsValue::from_str(&format!("{error:#}")))?;
    layout_dump_json(&layout).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[wasm_bindgen]
pub fn render_service_map_svg(routes_geojson: &str, changes_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let config = parse_options(options_json)?;
    render_with_options(routes_geojson, changes_json, &config).map_err(|error| JsValue::from_str(&format!("{error:#}")))
}
