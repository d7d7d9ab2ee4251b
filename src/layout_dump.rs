use crate::ir::{ChangeCategory, Point};
use crate::layout::{LabelBox, MapLayout};
use crate::search::RouteDetails;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub scenario: String,
    pub width: f64,
    pub height: f64,
    pub routes: Vec<RouteDump>,
    pub fallback_labels: usize,
    pub selection: Option<RouteDetails>,
}

#[derive(Debug, Serialize)]
pub struct RouteDump {
    pub route: String,
    pub category: ChangeCategory,
    pub color: String,
    pub rgb: [u8; 3],
    pub rank: u32,
    pub visible: bool,
    pub label: Option<LabelDump>,
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    /// Anchor in the input coordinate space.
    pub position: [f64; 2],
    pub label_box: LabelBox,
    /// Anchor in output pixels.
    pub screen: [f64; 2],
    pub fallback: bool,
}

impl LayoutDump {
    pub fn from_layout(layout: &MapLayout) -> Self {
        let routes = layout
            .routes
            .iter()
            .map(|route| RouteDump {
                route: route.route.clone(),
                category: route.category,
                color: route.style.color.clone(),
                rgb: route.style.rgb,
                rank: route.style.rank,
                visible: route.visible,
                label: route.label.as_ref().and_then(|label| {
                    let placed = layout.placement.get(&route.route)?;
                    Some(LabelDump {
                        position: xy(label.anchor),
                        label_box: placed.label_box,
                        screen: xy(label.screen_anchor),
                        fallback: label.fallback,
                    })
                }),
            })
            .collect();

        LayoutDump {
            scenario: layout.scenario.clone(),
            width: layout.width,
            height: layout.height,
            routes,
            fallback_labels: layout.placement.fallback_count(),
            selection: layout.selection.clone(),
        }
    }
}

fn xy(point: Point) -> [f64; 2] {
    [point.x, point.y]
}

pub fn layout_dump_json(layout: &MapLayout) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&LayoutDump::from_layout(layout))
}

pub fn write_layout_dump(path: &Path, layout: &MapLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
