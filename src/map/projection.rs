use glam::DVec2;

/// Pan/zoom state: a surface point `p` is displayed at `p * k + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform { k: 1.0, x: 0.0, y: 0.0 };

    pub fn apply(&self, p: DVec2) -> DVec2 {
        p * self.k + DVec2::new(self.x, self.y)
    }

    pub fn invert(&self, p: DVec2) -> DVec2 {
        (p - DVec2::new(self.x, self.y)) / self.k
    }

    /// SVG `transform` attribute value
    pub fn to_svg(&self) -> String {
        format!("translate({},{}) scale({})", self.x, self.y, self.k)
    }

    /// Outline width that stays one unit wide on screen
    pub fn stroke_width(&self) -> f64 {
        1.0 / self.k
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Limits a pan/zoom gesture may reach
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBehavior {
    /// Allowed range of `k`
    pub scale_extent: (f64, f64),
    /// Content bounds that must keep covering the viewport
    pub translate_extent: (DVec2, DVec2),
    /// Visible viewport in surface units
    pub extent: (DVec2, DVec2),
}

impl ZoomBehavior {
    pub fn new(width: f64, height: f64, min_zoom: f64, max_zoom: f64) -> Self {
        let bounds = (DVec2::ZERO, DVec2::new(width, height));
        Self {
            scale_extent: (min_zoom, max_zoom),
            translate_extent: bounds,
            extent: bounds,
        }
    }

    /// Never panics, even on an inverted extent: the upper bound wins
    fn clamp_scale(&self, k: f64) -> f64 {
        k.max(self.scale_extent.0).min(self.scale_extent.1)
    }

    /// Shift a transform so the translate extent covers the viewport; when
    /// the content is smaller than the viewport along an axis it is centered.
    pub fn constrain(&self, t: ZoomTransform) -> ZoomTransform {
        let (e0, e1) = self.extent;
        let (t0, t1) = self.translate_extent;
        let d0 = t.invert(e0) - t0;
        let d1 = t.invert(e1) - t1;

        let shift = |lo: f64, hi: f64| {
            if hi > lo {
                (lo + hi) / 2.0
            } else if lo < 0.0 {
                lo
            } else {
                hi.max(0.0)
            }
        };
        let dx = shift(d0.x, d1.x);
        let dy = shift(d0.y, d1.y);

        ZoomTransform {
            k: t.k,
            x: t.x + t.k * dx,
            y: t.y + t.k * dy,
        }
    }

    /// Scale by `factor` keeping the surface point under `anchor` fixed
    pub fn zoom_at(&self, t: ZoomTransform, anchor: DVec2, factor: f64) -> ZoomTransform {
        let k = self.clamp_scale(t.k * factor);
        let fixed = t.invert(anchor);
        let moved = fixed * k;
        self.constrain(ZoomTransform {
            k,
            x: anchor.x - moved.x,
            y: anchor.y - moved.y,
        })
    }

    /// Translate by a screen-space delta
    pub fn pan(&self, t: ZoomTransform, dx: f64, dy: f64) -> ZoomTransform {
        self.constrain(ZoomTransform {
            k: self.clamp_scale(t.k),
            x: t.x + dx,
            y: t.y + dy,
        })
    }

    pub fn center(&self) -> DVec2 {
        (self.extent.0 + self.extent.1) / 2.0
    }
}

/// Fits the logical surface into a pixel grid, preserving aspect ratio and
/// centering the leftover space (SVG `xMidYMid meet`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical surface size
    pub surface: DVec2,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(surface: DVec2, width: usize, height: usize) -> Self {
        Self {
            surface,
            width,
            height,
        }
    }

    /// Pixels per surface unit
    pub fn scale(&self) -> f64 {
        let sx = self.width as f64 / self.surface.x;
        let sy = self.height as f64 / self.surface.y;
        sx.min(sy)
    }

    fn offset(&self) -> DVec2 {
        let used = self.surface * self.scale();
        (DVec2::new(self.width as f64, self.height as f64) - used) / 2.0
    }

    /// Surface point to pixel
    pub fn project(&self, p: DVec2) -> (i32, i32) {
        let px = p * self.scale() + self.offset();
        (px.x.floor() as i32, px.y.floor() as i32)
    }

    /// Pixel (center) back to surface point
    pub fn unproject(&self, px: f64, py: f64) -> DVec2 {
        let scale = self.scale();
        if scale <= 0.0 {
            return DVec2::ZERO;
        }
        (DVec2::new(px, py) - self.offset()) / scale
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}
