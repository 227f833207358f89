//! Pointer and zoom events, and the state they drive: the current transform
//! and the single reusable tooltip.

use crate::map::projection::ZoomTransform;
use crate::map::renderer::{CountyShape, MapScene, UNDEFINED};
use glam::DVec2;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// Pointer moved onto a county; coordinates are in host units
    PointerEnter { shape: usize, x: f64, y: f64 },
    PointerLeave,
    TransformChanged(ZoomTransform),
}

pub trait EventHandler {
    fn handle(&mut self, scene: &MapScene, event: &MapEvent);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub text: String,
    pub data_education: String,
    /// Top-left corner in host units
    pub position: DVec2,
    pub hidden: bool,
}

impl Default for Tooltip {
    fn default() -> Self {
        Self {
            text: String::new(),
            data_education: UNDEFINED.to_string(),
            position: DVec2::ZERO,
            hidden: true,
        }
    }
}

impl Tooltip {
    pub fn show(&mut self, shape: &CountyShape, pointer: DVec2, offset: f64) {
        self.text = shape.tooltip_text();
        self.data_education = shape.data_education().unwrap_or_else(|| UNDEFINED.to_string());
        self.position = pointer + DVec2::splat(offset);
        self.hidden = false;
    }

    pub fn hide(&mut self) {
        self.hidden = true;
    }
}

/// Mutable view state; owned by the event loop
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub transform: ZoomTransform,
    /// Outline width that keeps borders one unit wide on screen
    pub stroke_width: f64,
    pub tooltip: Tooltip,
    pub hovered: Option<usize>,
    offset: f64,
}

impl Interaction {
    pub fn new(tooltip_offset: f64) -> Self {
        Self {
            transform: ZoomTransform::IDENTITY,
            stroke_width: 1.0,
            tooltip: Tooltip::default(),
            hovered: None,
            offset: tooltip_offset,
        }
    }

    /// Events for a pointer now over `hit`: leaving the previous county
    /// always precedes entering the next one
    pub fn hover_events(&self, hit: Option<usize>, x: f64, y: f64) -> Vec<MapEvent> {
        if hit == self.hovered {
            return Vec::new();
        }
        let mut events = Vec::with_capacity(2);
        if self.hovered.is_some() {
            events.push(MapEvent::PointerLeave);
        }
        if let Some(shape) = hit {
            events.push(MapEvent::PointerEnter { shape, x, y });
        }
        events
    }
}

impl EventHandler for Interaction {
    fn handle(&mut self, scene: &MapScene, event: &MapEvent) {
        match *event {
            MapEvent::PointerEnter { shape, x, y } => {
                let Some(county) = scene.county(shape) else {
                    return;
                };
                self.hovered = Some(shape);
                self.tooltip.show(county, DVec2::new(x, y), self.offset);
                trace!("Tooltip shown: {}", self.tooltip.text);
            }
            MapEvent::PointerLeave => {
                self.hovered = None;
                self.tooltip.hide();
            }
            MapEvent::TransformChanged(t) => {
                self.transform = t;
                self.stroke_width = t.stroke_width();
            }
        }
    }
}
