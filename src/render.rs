use crate::config::RenderConfig;
use crate::ir::{ChangeCategory, Point};
use crate::layout::{MapLayout, RouteLayout};
use crate::search::RouteDetails;
use crate::theme::Theme;
use anyhow::Result;
use std::fmt::Write;
use std::path::Path;

const LEGEND_ROW_HEIGHT: f64 = 20.0;
const LEGEND_WIDTH: f64 = 260.0;
const TOOLTIP_HEIGHT: f64 = 84.0;

pub fn render_svg(layout: &MapLayout, theme: &Theme, config: &RenderConfig) -> String {
    let mut svg = String::new();
    let width = layout.width;
    let height = layout.height;
    let has_selection = layout.selection.is_some();

    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    );
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    );

    svg.push_str("<g id=\"routes\">");
    for route in layout.visible_routes() {
        let opacity = element_opacity(route, has_selection, config);
        route_svg(&mut svg, route, &route.style.color, theme.route_width, opacity);
    }
    svg.push_str("</g>");

    if let Some(route) = layout.routes.iter().find(|r| r.selected && r.visible) {
        svg.push_str("<g id=\"highlight\">");
        route_svg(&mut svg, route, &theme.highlight_color, theme.route_width * 3.0, 1.0);
        route_svg(&mut svg, route, &route.style.color, theme.route_width * 2.0, 1.0);
        svg.push_str("</g>");
    }

    for category in ChangeCategory::ALL {
        let members: Vec<&RouteLayout> = layout
            .visible_routes()
            .filter(|route| route.category == category && route.label.is_some())
            .collect();
        if members.is_empty() {
            continue;
        }
        let _ = write!(svg, "<g id=\"{}-route-labels\">", category.slug());
        for route in members {
            label_svg(&mut svg, route, theme, element_opacity(route, has_selection, config));
        }
        svg.push_str("</g>");
    }

    if config.legend {
        legend_svg(&mut svg, layout, theme, &config.title);
    }
    if config.tooltip {
        if let Some(details) = &layout.selection {
            tooltip_svg(&mut svg, details, theme, width, height);
        }
    }

    svg.push_str("</svg>");
    svg
}

fn element_opacity(route: &RouteLayout, has_selection: bool, config: &RenderConfig) -> f32 {
    if has_selection && !route.selected {
        config.dimmed_opacity
    } else {
        1.0
    }
}

fn route_svg(svg: &mut String, route: &RouteLayout, color: &str, stroke_width: f32, opacity: f32) {
    let dash = route
        .style
        .dash_array
        .as_deref()
        .map(|d| format!(" stroke-dasharray=\"{d}\""))
        .unwrap_or_default();
    for part in &route.parts {
        match part.as_slice() {
            [] => {}
            [point] => {
                let _ = write!(
                    svg,
                    "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{color}\" opacity=\"{opacity}\"/>",
                    point.x, point.y, stroke_width
                );
            }
            points => {
                let _ = write!(
                    svg,
                    "<path d=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{stroke_width}\" stroke-linecap=\"round\" stroke-linejoin=\"round\" opacity=\"{opacity}\"{dash}/>",
                    points_to_path(points)
                );
            }
        }
    }
}

fn label_svg(svg: &mut String, route: &RouteLayout, theme: &Theme, opacity: f32) {
    let Some(label) = &route.label else {
        return;
    };
    let rect = label.screen_box;
    let center = rect.center();
    let font_size = (rect.height * 0.75).max(1.0);
    let _ = write!(
        svg,
        "<g opacity=\"{opacity}\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
        rect.x, rect.y, rect.width, rect.height, route.style.color
    );
    let _ = write!(
        svg,
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-weight=\"{}\" font-size=\"{font_size:.2}\" fill=\"{}\">{}</text></g>",
        center.x,
        center.y,
        escape_xml(&theme.font_family),
        theme.font_weight,
        theme.label_text_color,
        escape_xml(&route.route)
    );
}

fn legend_svg(svg: &mut String, layout: &MapLayout, theme: &Theme, title: &str) {
    let x = 12.0;
    let y = 12.0;
    let rows = layout.legend.len() as f64;
    let panel_height = 40.0 + rows * LEGEND_ROW_HEIGHT;
    let font_size = theme.font_size + 1.0;
    let _ = write!(
        svg,
        "<g id=\"legend\"><rect x=\"{x}\" y=\"{y}\" width=\"{LEGEND_WIDTH}\" height=\"{panel_height}\" rx=\"4\" fill=\"{}\" opacity=\"0.92\"/>",
        theme.panel_background
    );
    let _ = write!(
        svg,
        "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-weight=\"600\" font-size=\"{font_size}\" fill=\"{}\">{}</text>",
        x + 10.0,
        y + 22.0,
        escape_xml(&theme.font_family),
        theme.panel_text_color,
        escape_xml(title)
    );
    for (idx, entry) in layout.legend.iter().enumerate() {
        let row_y = y + 34.0 + idx as f64 * LEGEND_ROW_HEIGHT;
        let _ = write!(
            svg,
            "<rect x=\"{:.2}\" y=\"{row_y:.2}\" width=\"14\" height=\"14\" fill=\"{}\"/>",
            x + 10.0,
            entry.color
        );
        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            x + 32.0,
            row_y + 11.0,
            escape_xml(&theme.font_family),
            theme.font_size,
            theme.panel_text_color,
            escape_xml(&entry.label)
        );
    }
    svg.push_str("</g>");
}

fn tooltip_svg(svg: &mut String, details: &RouteDetails, theme: &Theme, width: f64, height: f64) {
    let x = 12.0;
    let panel_width = (width - 24.0).max(1.0);
    let y = (height - TOOLTIP_HEIGHT - 12.0).max(0.0);
    let _ = write!(
        svg,
        "<g id=\"tooltip\"><rect x=\"{x}\" y=\"{y:.2}\" width=\"{panel_width:.2}\" height=\"{TOOLTIP_HEIGHT}\" rx=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"3\"/>",
        theme.panel_background, details.color
    );
    let half = panel_width / 2.0;
    let cells: [(f64, f64, f32, &str); 4] = [
        (x + 12.0, y + 28.0, theme.font_size * 2.0, details.route.as_str()),
        (x + half * 0.5, y + 28.0, theme.font_size, details.area.as_deref().unwrap_or("")),
        (x + 12.0, y + 60.0, theme.font_size + 2.0, details.status.as_str()),
        (x + half * 0.5, y + 60.0, theme.font_size, details.group.as_deref().unwrap_or("")),
    ];
    for (cx, cy, size, text) in cells {
        if text.is_empty() {
            continue;
        }
        let _ = write!(
            svg,
            "<text x=\"{cx:.2}\" y=\"{cy:.2}\" font-family=\"{}\" font-size=\"{size}\" fill=\"{}\">{}</text>",
            escape_xml(&theme.font_family),
            theme.panel_text_color,
            escape_xml(text)
        );
    }
    if let Some(description) = details.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            x + half,
            y + 28.0,
            escape_xml(&theme.font_family),
            theme.font_size,
            theme.panel_text_color,
            escape_xml(description)
        );
    }
    svg.push_str("</g>");
}

fn points_to_path(points: &[Point]) -> String {
    let Some((first, rest)) = points.split_first() else {
        return String::new();
    };
    let mut d = String::new();
    let _ = write!(d, "M {:.2} {:.2}", first.x, first.y);
    for point in rest {
        let _ = write!(d, " L {:.2} {:.2}", point.x, point.y);
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|family| family.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "sans-serif".to_string());
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .or_else(|| usvg::Size::from_wh(1200.0, 800.0))
        .ok_or_else(|| anyhow::anyhow!("Invalid output size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig, _theme: &Theme) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the 'png' feature"))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{RouteFeature, RouteSet, ServiceChange};
    use crate::layout::compute_layout;

    fn sample_set() -> RouteSet {
        let feature = |id: &str, category, points: &[(f64, f64)]| RouteFeature {
            route: id.to_string(),
            parts: vec![points.iter().map(|&(x, y)| Point::new(x, y)).collect()],
            change: Some(ServiceChange {
                line: id.to_string(),
                area: Some("Berkeley & Albany".to_string()),
                group: Some("Local".to_string()),
                description: Some("Runs every 30 minutes".to_string()),
                ..ServiceChange::default()
            }),
            category,
        };
        RouteSet {
            scenario: "change-30".to_string(),
            routes: vec![
                feature("72", ChangeCategory::Reduced, &[(-122.27, 37.80), (-122.30, 37.90)]),
                feature("NL", ChangeCategory::Eliminated, &[(-122.20, 37.82), (-122.00, 37.75)]),
                feature("6", ChangeCategory::Modified, &[(-122.25, 37.85)]),
            ],
            unmatched: Vec::new(),
        }
    }

    #[test]
    fn render_svg_basic() {
        let theme = Theme::default();
        let render = RenderConfig::default();
        let layout = compute_layout(&sample_set(), &theme, &LayoutConfig::default(), &render);
        let svg = render_svg(&layout, &theme, &render);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(">72</text>"));
        assert!(svg.contains("id=\"eliminated-route-labels\""));
        assert!(svg.contains("id=\"reduced-route-labels\""));
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("Proposed Service Changes"));
        assert!(svg.contains(">no change</text>"));
        assert!(!svg.contains("id=\"tooltip\""));
    }

    #[test]
    fn hidden_categories_are_not_drawn() {
        let theme = Theme::default();
        let render = RenderConfig::default();
        let config = LayoutConfig {
            visible_categories: [ChangeCategory::Eliminated].into_iter().collect(),
            ..LayoutConfig::default()
        };
        let layout = compute_layout(&sample_set(), &theme, &config, &render);
        let svg = render_svg(&layout, &theme, &render);
        assert!(svg.contains(">NL</text>"));
        assert!(!svg.contains(">72</text>"));
        assert!(!svg.contains("reduced-route-labels"));
    }

    #[test]
    fn selection_adds_highlight_and_escaped_tooltip() {
        let theme = Theme::default();
        let render = RenderConfig::default();
        let config = LayoutConfig {
            selected_route: Some("72".to_string()),
            ..LayoutConfig::default()
        };
        let layout = compute_layout(&sample_set(), &theme, &config, &render);
        let svg = render_svg(&layout, &theme, &render);
        assert!(svg.contains("id=\"highlight\""));
        assert!(svg.contains("id=\"tooltip\""));
        assert!(svg.contains("Berkeley &amp; Albany"));
        assert!(svg.contains("Runs every 30 minutes"));
        assert!(svg.contains(&format!("opacity=\"{}\"", render.dimmed_opacity)));
    }

    #[test]
    fn font_family_is_escaped() {
        let theme = Theme {
            font_family: "\"Fira Sans\", <sans>".to_string(),
            ..Theme::default()
        };
        let render = RenderConfig::default();
        let config = LayoutConfig {
            selected_route: Some("72".to_string()),
            ..LayoutConfig::default()
        };
        let layout = compute_layout(&sample_set(), &theme, &config, &render);
        let svg = render_svg(&layout, &theme, &render);
        assert!(svg.contains("font-family=\"&quot;Fira Sans&quot;, &lt;sans&gt;\""));
        assert!(!svg.contains("\"Fira Sans\""));
    }

    #[test]
    fn path_from_points() {
        assert_eq!(points_to_path(&[]), "");
        assert_eq!(
            points_to_path(&[Point::new(1.0, 2.0), Point::new(3.5, 4.25)]),
            "M 1.00 2.00 L 3.50 4.25"
        );
    }
}
