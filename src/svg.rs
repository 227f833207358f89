//! Headless export of a scene as a standalone SVG document.

use crate::legend::Legend;
use crate::map::geometry::path_data;
use crate::map::projection::ZoomTransform;
use crate::map::renderer::{CountyShape, MapScene};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

const STATES_STROKE: &str = "#ffffff";
const TICK_SIZE: f64 = 6.0;
const TICK_PADDING: f64 = 3.0;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Attributes without a value are omitted rather than written empty
fn county_path(shape: &CountyShape) -> String {
    let mut attrs = format!(r#"d="{}""#, path_data(&shape.geometry));
    if let Some(fill) = shape.fill {
        let _ = write!(attrs, r#" fill="{fill}""#);
    }
    let _ = write!(attrs, r#" class="{}""#, CountyShape::CLASS);
    if let Some(education) = shape.data_education() {
        let _ = write!(attrs, r#" data-education="{education}""#);
    }
    if let Some(fips) = shape.data_fips() {
        let _ = write!(attrs, r#" data-fips="{fips}""#);
    }
    format!(
        "<path {attrs}><title>{}</title></path>\n",
        escape(&shape.tooltip_text())
    )
}

fn legend_group(legend: &Legend) -> String {
    let mut out = String::from("<g id=\"legend\">\n");
    for s in &legend.swatches {
        let _ = writeln!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            s.x, s.y, s.size, s.size, s.color
        );
    }
    out.push_str("</g>\n");

    let _ = writeln!(
        out,
        r#"<g id="legend-x-axis" transform="translate({},{})" text-anchor="end" font-size="10">"#,
        legend.axis_translate.x, legend.axis_translate.y
    );
    let _ = writeln!(
        out,
        r#"<path class="domain" stroke="currentColor" fill="none" d="M-{TICK_SIZE},{}H0V0H-{TICK_SIZE}"/>"#,
        legend.height
    );
    for tick in &legend.ticks {
        let _ = writeln!(
            out,
            r#"<g class="tick" transform="translate(0,{})"><line stroke="currentColor" x2="-{TICK_SIZE}"/><text fill="currentColor" x="-{}" dy="0.32em">{}</text></g>"#,
            tick.y,
            TICK_SIZE + TICK_PADDING,
            escape(&tick.label)
        );
    }
    out.push_str("</g>\n");
    out
}

/// Full document for `scene` under `transform`; the legend is left out when
/// nothing was loaded
pub fn render(scene: &MapScene, legend: Option<&Legend>, transform: &ZoomTransform) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" id="plot" viewBox="0 0 {} {}">"#,
        scene.surface.x, scene.surface.y
    );
    let _ = writeln!(
        out,
        r#"<g transform="{}" stroke-width="{}">"#,
        transform.to_svg(),
        transform.stroke_width()
    );
    for shape in &scene.counties {
        out.push_str(&county_path(shape));
    }
    let _ = writeln!(
        out,
        r#"<path class="states" fill="none" stroke="{STATES_STROKE}" d="{}"/>"#,
        path_data(&scene.states)
    );
    out.push_str("</g>\n");
    if let Some(legend) = legend {
        out.push_str(&legend_group(legend));
    }
    out.push_str("</svg>\n");
    out
}

pub fn write(path: &Path, scene: &MapScene, legend: Option<&Legend>, transform: &ZoomTransform) -> Result<()> {
    std::fs::write(path, render(scene, legend, transform))
        .with_context(|| format!("Failed to write SVG to {:?}", path))
}
