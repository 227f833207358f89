use crate::interaction::{EventHandler, Interaction, MapEvent};
use crate::legend::Legend;
use crate::map::projection::{Viewport, ZoomBehavior, ZoomTransform};
use crate::map::renderer::{MapRenderer, MapScene};
use crate::pipeline::{LoadState, MapInstance};
use glam::DVec2;

/// Cells scrolled per key press
const KEY_PAN_COLS: i32 = 6;
const KEY_PAN_ROWS: i32 = 3;

/// Application state
pub struct App {
    pub instance: MapInstance,
    /// Shown until (or unless) a load succeeds
    empty: MapScene,
    pub zoom: ZoomBehavior,
    pub interaction: Interaction,
    /// Map area in character cells
    pub map_width: usize,
    pub map_height: usize,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position, re-hit-tested after every zoom
    pub mouse_pos: Option<(u16, u16)>,
}

impl App {
    pub fn new(instance: MapInstance, width: usize, height: usize) -> Self {
        let config = &instance.config;
        let zoom = ZoomBehavior::new(config.plot.width, config.plot.height, config.zoom.min, config.zoom.max);
        let interaction = Interaction::new(config.tooltip.cell_offset as f64);
        let empty = instance.empty_scene();

        let mut app = Self {
            instance,
            empty,
            zoom,
            interaction,
            map_width: 0,
            map_height: 0,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
        };
        app.resize(width, height);
        app
    }

    /// Update map area when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        // Account for border (2 chars horizontal, 2 chars vertical plus the status bar)
        self.map_width = width.saturating_sub(2);
        self.map_height = height.saturating_sub(3);
    }

    pub fn scene(&self) -> &MapScene {
        match self.instance.choropleth() {
            Some(c) => &c.scene,
            None => &self.empty,
        }
    }

    pub fn legend(&self) -> Option<&Legend> {
        self.instance.choropleth().map(|c| &c.legend)
    }

    pub fn transform(&self) -> ZoomTransform {
        self.interaction.transform
    }

    fn viewport(&self) -> Viewport {
        MapRenderer::viewport(self.scene(), self.map_width, self.map_height)
    }

    fn dispatch(&mut self, event: MapEvent) {
        let scene = match self.instance.choropleth() {
            Some(c) => &c.scene,
            None => &self.empty,
        };
        self.interaction.handle(scene, &event);
    }

    /// Untransformed surface point under a terminal cell, `None` outside the
    /// map area or in its letterbox
    pub fn cell_to_screen(&self, col: u16, row: u16) -> Option<DVec2> {
        // Account for border (1 cell offset)
        let local_col = col.checked_sub(1)?;
        let local_row = row.checked_sub(1)?;
        if local_col as usize >= self.map_width || local_row as usize >= self.map_height {
            return None;
        }
        MapRenderer::cell_to_surface(self.scene(), self.map_width, self.map_height, local_col, local_row)
    }

    /// County index under a terminal cell
    pub fn county_at(&self, col: u16, row: u16) -> Option<usize> {
        let screen = self.cell_to_screen(col, row)?;
        self.scene().shape_at(self.transform().invert(screen))
    }

    /// Track the pointer and emit enter/leave events as it crosses counties
    pub fn hover(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        let hit = self.county_at(col, row);
        for event in self.interaction.hover_events(hit, col as f64, row as f64) {
            self.dispatch(event);
        }
    }

    fn set_transform(&mut self, t: ZoomTransform) {
        if t == self.transform() {
            return;
        }
        self.dispatch(MapEvent::TransformChanged(t));
        if let Some((col, row)) = self.mouse_pos {
            self.hover(col, row);
        }
    }

    /// Zoom by `factor` about a terminal cell (the map center when the cell
    /// is outside the map)
    pub fn zoom_at(&mut self, col: u16, row: u16, factor: f64) {
        let anchor = self.cell_to_screen(col, row).unwrap_or_else(|| self.zoom.center());
        self.set_transform(self.zoom.zoom_at(self.transform(), anchor, factor));
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        self.zoom_at(col, row, self.instance.config.zoom.step);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        self.zoom_at(col, row, 1.0 / self.instance.config.zoom.step);
    }

    pub fn zoom_in(&mut self) {
        let t = self.zoom.zoom_at(self.transform(), self.zoom.center(), self.instance.config.zoom.step);
        self.set_transform(t);
    }

    pub fn zoom_out(&mut self) {
        let t = self
            .zoom
            .zoom_at(self.transform(), self.zoom.center(), 1.0 / self.instance.config.zoom.step);
        self.set_transform(t);
    }

    /// Move the content by a number of character cells
    pub fn pan_cells(&mut self, dcols: i32, drows: i32) {
        let scale = self.viewport().scale();
        if scale <= 0.0 {
            return;
        }
        // Braille gives 2x4 resolution per character
        let dx = (dcols * 2) as f64 / scale;
        let dy = (drows * 4) as f64 / scale;
        self.set_transform(self.zoom.pan(self.transform(), dx, dy));
    }

    /// Arrow keys move the view, so the content moves the other way
    pub fn pan_view(&mut self, cols: i32, rows: i32) {
        self.pan_cells(-cols * KEY_PAN_COLS, -rows * KEY_PAN_ROWS);
    }

    /// Content follows the pointer while the button is held
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = x as i32 - last_x as i32;
            let dy = y as i32 - last_y as i32;
            self.pan_cells(dx, dy);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn reset_view(&mut self) {
        self.set_transform(ZoomTransform::IDENTITY);
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.transform().k)
    }

    pub fn load_status(&self) -> String {
        match &self.instance.state {
            LoadState::Failed(reason) => format!("failed: {reason}"),
            LoadState::Rendered(c) => format!("{} counties", c.scene.counties.len()),
            other => other.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::data::tests::MemorySource;

    async fn app() -> App {
        let mut instance = MapInstance::new(MapConfig::default());
        instance.load(&MemorySource::two_counties()).await;
        // 100x30 map cells: 0.2 braille dots per surface unit
        App::new(instance, 102, 33)
    }

    #[tokio::test]
    async fn test_hover_shows_and_hides_tooltip() {
        let mut app = app().await;
        // map cell (15,7) sits over the first county
        app.hover(16, 8);
        assert_eq!(app.interaction.tooltip.text, "A, X: 10");
        assert_eq!(app.interaction.tooltip.position, DVec2::new(17.0, 9.0));
        assert!(!app.interaction.tooltip.hidden);

        app.hover(26, 8);
        assert_eq!(app.interaction.tooltip.text, "B, Y: 90");

        app.hover(90, 30);
        assert!(app.interaction.tooltip.hidden);
        assert_eq!(app.county_at(0, 0), None);
    }

    #[tokio::test]
    async fn test_zoom_is_clamped_and_strokes_follow() {
        let mut app = app().await;
        for _ in 0..20 {
            app.zoom_in();
        }
        assert_eq!(app.transform().k, 12.0);
        assert_eq!(app.interaction.stroke_width, 1.0 / 12.0);
        assert_eq!(app.zoom_level(), "12.0x");

        for _ in 0..20 {
            app.zoom_out_at(50, 15);
        }
        assert_eq!(app.transform(), ZoomTransform::IDENTITY);
    }

    #[tokio::test]
    async fn test_drag_stays_inside_canvas() {
        let mut app = app().await;
        app.last_mouse = Some((10, 10));
        app.handle_drag(40, 20);
        assert_eq!(app.transform(), ZoomTransform::IDENTITY);

        app.zoom_in_at(51, 16);
        let before = app.transform();
        app.end_drag();
        app.last_mouse = Some((50, 15));
        app.handle_drag(49, 15);
        let after = app.transform();
        // one cell = 2 dots = 10 surface units at 0.2 dots per unit
        assert!((after.x - (before.x - 10.0)).abs() < 1e-9);
        assert_eq!(after.y, before.y);

        app.pan_view(-1000, 0);
        assert_eq!(app.transform().x, 0.0);
        app.reset_view();
        assert_eq!(app.transform(), ZoomTransform::IDENTITY);
    }

    #[tokio::test]
    async fn test_failed_load_shows_empty_map() {
        let mut instance = MapInstance::new(MapConfig::default());
        instance.load(&MemorySource(Default::default())).await;
        let mut app = App::new(instance, 102, 33);
        assert!(app.scene().is_empty());
        assert!(app.legend().is_none());
        assert!(app.load_status().starts_with("failed"));
        app.hover(16, 8);
        assert!(app.interaction.tooltip.hidden);
    }
}
