use crate::ir::{ChangeCategory, UnknownCategory};
use crate::theme::{Theme, hex_to_rgb};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] json5::Error),
    #[error("{name} must be a #rrggbb color, got '{value}'")]
    InvalidColor { name: String, value: String },
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidNumber { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Label size in geometry units; box height is `label_size * label_height_ratio`.
    pub label_size: f64,
    pub label_height_ratio: f64,
    /// Viewport padding in pixels around the fitted route bounds.
    pub padding: f32,
    pub visible_categories: BTreeSet<ChangeCategory>,
    pub selected_route: Option<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            label_size: 0.0075,
            label_height_ratio: 4.0 / 3.0,
            padding: 16.0,
            visible_categories: ChangeCategory::ALL.into_iter().collect(),
            selected_route: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
    pub legend: bool,
    pub tooltip: bool,
    /// Opacity of routes and labels that are not the selected route.
    pub dimmed_opacity: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            title: "Proposed Service Changes".to_string(),
            legend: true,
            tooltip: true,
            dimmed_opacity: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Change-table column holding the categories to display.
    pub scenario: String,
    /// GeoJSON feature property holding the route code.
    pub route_property: String,
    /// Route code to public identifier.
    pub rename: BTreeMap<String, String>,
    /// Keep shapes without an annotation row (as `other`).
    pub include_unmatched: bool,
    /// Change rows without a shape whose line contains this marker become
    /// geometry-less routes.
    pub geometryless_marker: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            scenario: "change-30".to_string(),
            route_property: "PUB_RTE".to_string(),
            rename: BTreeMap::from([("1".to_string(), "BRT/1".to_string())]),
            include_unmatched: true,
            geometryless_marker: Some("flex".to_string()),
        }
    }
}

impl DataConfig {
    pub fn public_id(&self, code: &str) -> String {
        let code = code.trim();
        self.rename
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
    pub data: DataConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutSection>,
    render: Option<RenderSection>,
    data: Option<DataSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_weight: Option<u16>,
    font_size: Option<f32>,
    background: Option<String>,
    label_text_color: Option<String>,
    highlight_color: Option<String>,
    panel_background: Option<String>,
    panel_text_color: Option<String>,
    route_width: Option<f32>,
    category_colors: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutSection {
    label_size: Option<f64>,
    label_height_ratio: Option<f64>,
    padding: Option<f32>,
    visible_categories: Option<Vec<String>>,
    selected_route: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderSection {
    width: Option<f32>,
    height: Option<f32>,
    title: Option<String>,
    legend: Option<bool>,
    tooltip: Option<bool>,
    dimmed_opacity: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataSection {
    scenario: Option<String>,
    route_property: Option<String>,
    rename: Option<BTreeMap<String, String>>,
    include_unmatched: Option<bool>,
    geometryless_marker: Option<String>,
}

/// Load a JSON5 config file layered over the defaults. `None` yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "light" {
            config.theme = Theme::light();
        } else if theme_name == "dark" || theme_name == "default" {
            config.theme = Theme::dark();
        } else {
            tracing::warn!(theme = theme_name, "unknown theme name, keeping default");
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_weight {
            config.theme.font_weight = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = checked_color("background", v)?;
        }
        if let Some(v) = vars.label_text_color {
            config.theme.label_text_color = checked_color("labelTextColor", v)?;
        }
        if let Some(v) = vars.highlight_color {
            config.theme.highlight_color = checked_color("highlightColor", v)?;
        }
        if let Some(v) = vars.panel_background {
            config.theme.panel_background = checked_color("panelBackground", v)?;
        }
        if let Some(v) = vars.panel_text_color {
            config.theme.panel_text_color = checked_color("panelTextColor", v)?;
        }
        if let Some(v) = vars.route_width {
            config.theme.route_width = v;
        }
        if let Some(colors) = vars.category_colors {
            for (key, value) in colors {
                let category: ChangeCategory = key.parse()?;
                let name = format!("categoryColors.{}", category.as_str());
                config.theme.palette.colors[category.index()] = checked_color(&name, value)?;
            }
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.label_size {
            config.layout.label_size = checked_positive("labelSize", v)?;
        }
        if let Some(v) = layout.label_height_ratio {
            config.layout.label_height_ratio = checked_positive("labelHeightRatio", v)?;
        }
        if let Some(v) = layout.padding {
            config.layout.padding = v.max(0.0);
        }
        if let Some(v) = layout.visible_categories {
            config.layout.visible_categories = v
                .iter()
                .map(|name| name.parse::<ChangeCategory>())
                .collect::<Result<_, UnknownCategory>>()?;
        }
        if let Some(v) = layout.selected_route {
            config.layout.selected_route = Some(v);
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.title {
            config.render.title = v;
        }
        if let Some(v) = render.legend {
            config.render.legend = v;
        }
        if let Some(v) = render.tooltip {
            config.render.tooltip = v;
        }
        if let Some(v) = render.dimmed_opacity {
            config.render.dimmed_opacity = v.clamp(0.0, 1.0);
        }
    }

    if let Some(data) = parsed.data {
        if let Some(v) = data.scenario {
            config.data.scenario = v;
        }
        if let Some(v) = data.route_property {
            config.data.route_property = v;
        }
        if let Some(v) = data.rename {
            config.data.rename = v;
        }
        if let Some(v) = data.include_unmatched {
            config.data.include_unmatched = v;
        }
        if let Some(v) = data.geometryless_marker {
            config.data.geometryless_marker = if v.trim().is_empty() { None } else { Some(v) };
        }
    }

    Ok(config)
}

fn checked_color(name: &str, value: String) -> Result<String, ConfigError> {
    if hex_to_rgb(&value).is_some() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidColor {
            name: name.to_string(),
            value,
        })
    }
}

fn checked_positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidNumber { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.data.scenario, "change-30");
        assert_eq!(config.data.public_id("1"), "BRT/1");
        assert_eq!(config.data.public_id(" 72 "), "72");
        assert_eq!(config.layout.visible_categories.len(), 6);
    }

    #[test]
    fn file_overrides_layer_over_defaults() {
        let config = parse_config(
            r##"{
                // JSON5 comments are allowed
                theme: "light",
                themeVariables: { categoryColors: { "reduced": "#123456" }, fontSize: 14 },
                layout: { labelSize: 0.01, visibleCategories: ["reduced", "eliminated"] },
                render: { title: "Fall 2020 (15% Scenario)" },
                data: { scenario: "change-15", includeUnmatched: false },
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.background, Theme::light().background);
        assert_eq!(config.theme.palette.color(ChangeCategory::Reduced), "#123456");
        assert_eq!(config.theme.palette.color(ChangeCategory::Other), "#a8aaac");
        assert_eq!(config.theme.font_size, 14.0);
        assert_eq!(config.layout.label_size, 0.01);
        assert_eq!(config.layout.label_height_ratio, 4.0 / 3.0);
        assert_eq!(
            config.layout.visible_categories,
            BTreeSet::from([ChangeCategory::Reduced, ChangeCategory::Eliminated])
        );
        assert_eq!(config.render.title, "Fall 2020 (15% Scenario)");
        assert_eq!(config.data.scenario, "change-15");
        assert!(!config.data.include_unmatched);
        assert_eq!(config.data.public_id("1"), "BRT/1");
    }

    #[test]
    fn rejects_bad_colors_and_sizes() {
        let err = parse_config(r#"{ themeVariables: { background: "navy" } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidColor { .. }));
        let err = parse_config(r#"{ layout: { labelSize: 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { name: "labelSize", .. }));
        let err = parse_config(r#"{ layout: { visibleCategories: ["sometimes"] } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCategory(_)));
    }
}
