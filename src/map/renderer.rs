use crate::braille::BrailleCanvas;
use crate::data::StatisticRecord;
use crate::join::JoinedFeature;
use crate::map::geometry::{self, draw_line, Bounds};
use crate::map::projection::{Viewport, ZoomTransform};
use crate::map::spatial::FeatureGrid;
use crate::scale::{QuantizeScale, Rgb};
use geojson::{Position, Value};
use glam::DVec2;
use rayon::prelude::*;

/// Hit-test grid cell size in surface units
const GRID_CELL_SIZE: f64 = 20.0;

/// Text for attributes whose statistic is missing
pub const UNDEFINED: &str = "undefined";

/// One filled county path with its inspectable attributes
#[derive(Debug, Clone, PartialEq)]
pub struct CountyShape {
    pub id: Option<i64>,
    pub geometry: Value,
    pub bounds: Option<Bounds>,
    /// `None` when the county has no statistic
    pub fill: Option<Rgb>,
    pub stats: Option<StatisticRecord>,
}

impl CountyShape {
    pub const CLASS: &'static str = "county";

    /// `data-fips`: the joined record's identifier, absent without a record
    pub fn data_fips(&self) -> Option<String> {
        self.stats.as_ref().map(|s| s.id.to_string())
    }

    /// `data-education`: the joined record's percentage, absent without a record
    pub fn data_education(&self) -> Option<String> {
        self.stats.as_ref().map(|s| s.percentage.to_string())
    }

    /// Tooltip line: `area, state: percentage`
    pub fn tooltip_text(&self) -> String {
        match &self.stats {
            Some(s) => format!("{}, {}: {}", s.area_name, s.state_name, s.percentage),
            None => format!("{UNDEFINED}, {UNDEFINED}: {UNDEFINED}"),
        }
    }
}

/// Everything drawn inside the zoomable group: county fills and the state
/// border mesh.
pub struct MapScene {
    pub surface: DVec2,
    pub counties: Vec<CountyShape>,
    pub states: Value,
    index: FeatureGrid,
}

impl MapScene {
    pub fn new(surface: DVec2, features: Vec<JoinedFeature>, states: Value, scale: &QuantizeScale) -> Self {
        let counties: Vec<CountyShape> = features
            .into_par_iter()
            .map(|f| {
                let fill = f.percentage().and_then(|p| scale.apply(p));
                CountyShape {
                    id: f.id,
                    bounds: geometry::bounds(&f.geometry),
                    geometry: f.geometry,
                    fill,
                    stats: f.stats,
                }
            })
            .collect();
        let index = FeatureGrid::build(counties.iter().map(|c| c.bounds.as_ref()), GRID_CELL_SIZE);

        Self {
            surface,
            counties,
            states,
            index,
        }
    }

    /// A scene with nothing drawn
    pub fn empty(surface: DVec2) -> Self {
        Self {
            surface,
            counties: Vec::new(),
            states: Value::MultiLineString(Vec::new()),
            index: FeatureGrid::new(GRID_CELL_SIZE),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }

    /// Index of the county containing a surface point; later shapes are
    /// painted on top so they win
    pub fn shape_at(&self, p: DVec2) -> Option<usize> {
        self.index
            .query_point(p)
            .iter()
            .rev()
            .copied()
            .find(|&i| {
                let c = &self.counties[i];
                c.bounds.is_some_and(|b| b.contains(p)) && geometry::contains(&c.geometry, p)
            })
    }

    pub fn county(&self, i: usize) -> Option<&CountyShape> {
        self.counties.get(i)
    }

    pub fn find_by_id(&self, id: i64) -> Option<usize> {
        self.counties.iter().position(|c| c.id == Some(id))
    }
}

/// Rasterized map for one frame
pub struct MapLayers {
    /// Character cell columns and rows
    pub width: usize,
    pub height: usize,
    /// County fill under each cell center, row major
    pub fills: Vec<Option<Rgb>>,
    /// State border dots
    pub borders: BrailleCanvas,
}

impl MapLayers {
    pub fn fill(&self, col: usize, row: usize) -> Option<Rgb> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.fills[row * self.width + col]
    }
}

/// Turns a scene plus the current zoom into terminal cells
pub struct MapRenderer;

impl MapRenderer {
    /// Braille gives 2x4 dot resolution per character
    pub fn viewport(scene: &MapScene, width: usize, height: usize) -> Viewport {
        Viewport::new(scene.surface, width * 2, height * 4)
    }

    pub fn render(scene: &MapScene, transform: &ZoomTransform, width: usize, height: usize) -> MapLayers {
        let viewport = Self::viewport(scene, width, height);
        let mut fills = vec![None; width * height];

        if width > 0 {
            fills.par_chunks_mut(width).enumerate().for_each(|(row, cells)| {
                for (col, cell) in cells.iter_mut().enumerate() {
                    // Center of the 2x4 dot block
                    let screen = viewport.unproject((col * 2) as f64 + 1.0, (row * 4) as f64 + 2.0);
                    if !in_surface(scene.surface, screen) {
                        continue;
                    }
                    let p = transform.invert(screen);
                    *cell = scene.shape_at(p).and_then(|i| scene.counties[i].fill);
                }
            });
        }

        let mut borders = BrailleCanvas::new(width, height);
        geometry::for_each_line(&scene.states, &mut |line: &[Position]| {
            draw_linestring(&mut borders, line, transform, &viewport);
        });

        MapLayers {
            width,
            height,
            fills,
            borders,
        }
    }

    /// Surface point under a map-area cell, or `None` in the letterbox
    pub fn cell_to_surface(scene: &MapScene, width: usize, height: usize, col: u16, row: u16) -> Option<DVec2> {
        let viewport = Self::viewport(scene, width, height);
        let screen = viewport.unproject(col as f64 * 2.0 + 1.0, row as f64 * 4.0 + 2.0);
        in_surface(scene.surface, screen).then_some(screen)
    }
}

fn in_surface(surface: DVec2, p: DVec2) -> bool {
    p.x >= 0.0 && p.y >= 0.0 && p.x <= surface.x && p.y <= surface.y
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &[Position], transform: &ZoomTransform, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for pos in line {
        let [x, y, ..] = pos.as_slice() else {
            continue;
        };
        let (px, py) = viewport.project(transform.apply(DVec2::new(*x, *y)));

        if let Some((prev_x, prev_y)) = prev {
            if viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}
