use crate::config::{Config, load_config};
use crate::dataset::build_route_set;
use crate::ir::ChangeCategory;
use crate::layout::compute_layout;
use crate::layout_dump::{layout_dump_json, write_layout_dump};
use crate::parser::{load_route_shapes, load_service_changes};
use crate::render::{render_svg, write_output_png, write_output_svg};
use crate::search::suggest;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SUGGESTION_LIMIT: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "svcmap", version, about = "Transit service-change map renderer")]
pub struct Args {
    /// Route shapes (GeoJSON FeatureCollection)
    #[arg(short = 'r', long = "routes")]
    pub routes: PathBuf,

    /// Service-change table (JSON array of rows)
    #[arg(short = 'd', long = "changes")]
    pub changes: PathBuf,

    /// Output file (svg/png/json). Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Change-table column to classify routes by (e.g. change-15)
    #[arg(short = 's', long = "scenario")]
    pub scenario: Option<String>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Only draw these categories (repeatable)
    #[arg(long = "show", value_parser = parse_category)]
    pub show: Vec<ChangeCategory>,

    /// Highlight a route and show its details
    #[arg(long = "select")]
    pub select: Option<String>,

    /// Print route ids matching a search query and exit
    #[arg(long = "suggest")]
    pub suggest: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

fn parse_category(raw: &str) -> Result<ChangeCategory, String> {
    raw.parse().map_err(|err: crate::ir::UnknownCategory| err.to_string())
}

pub fn run() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .try_init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let shapes = load_route_shapes(&args.routes, &config.data.route_property)?;
    let changes = load_service_changes(&args.changes)?;
    let routes = build_route_set(shapes, changes, &config.data)
        .with_context(|| format!("joining {}", args.routes.display()))?;
    tracing::info!(routes = routes.len(), scenario = %routes.scenario, "route set loaded");

    if let Some(query) = args.suggest.as_deref() {
        for id in suggest(&routes, query, SUGGESTION_LIMIT) {
            println!("{id}");
        }
        return Ok(());
    }

    let layout = compute_layout(&routes, &config.theme, &config.layout, &config.render);
    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&layout, &config.theme, &config.render);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = args
                .output
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            let svg = render_svg(&layout, &config.theme, &config.render);
            write_output_png(&svg, output, &config.render, &config.theme)?;
        }
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, &layout)?,
            None => println!("{}", layout_dump_json(&layout)?),
        },
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(scenario) = &args.scenario {
        config.data.scenario = scenario.clone();
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if !args.show.is_empty() {
        config.layout.visible_categories = args.show.iter().copied().collect();
    }
    if let Some(route) = &args.select {
        config.layout.selected_route = Some(route.clone());
    }
}
