use crate::braille::BrailleCanvas;
use geojson::{Position, Value};
use glam::DVec2;

/// Axis-aligned bounds in surface units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

fn point(p: &Position) -> Option<DVec2> {
    match p.as_slice() {
        [x, y, ..] => Some(DVec2::new(*x, *y)),
        _ => None,
    }
}

/// Visit every ring or line of a geometry as a point list
pub fn for_each_line<F>(value: &Value, f: &mut F)
where
    F: FnMut(&[Position]),
{
    match value {
        Value::LineString(line) => f(line),
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            for line in lines {
                f(line);
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                for ring in rings {
                    f(ring);
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                for_each_line(&g.value, f);
            }
        }
        Value::Point(_) | Value::MultiPoint(_) => {}
    }
}

pub fn bounds(value: &Value) -> Option<Bounds> {
    let mut acc: Option<Bounds> = None;
    for_each_line(value, &mut |line: &[Position]| {
        for p in line.iter().filter_map(point) {
            acc = Some(match acc {
                Some(b) => Bounds {
                    min: b.min.min(p),
                    max: b.max.max(p),
                },
                None => Bounds { min: p, max: p },
            });
        }
    });
    acc
}

/// Even-odd containment over every ring, so holes are excluded
pub fn contains(value: &Value, p: DVec2) -> bool {
    let mut inside = false;
    let mut visit = |ring: &[Position]| {
        if ring_crossings(ring, p) % 2 == 1 {
            inside = !inside;
        }
    };
    match value {
        Value::Polygon(_) | Value::MultiPolygon(_) => for_each_line(value, &mut visit),
        Value::GeometryCollection(geometries) => {
            return geometries.iter().any(|g| contains(&g.value, p));
        }
        _ => return false,
    }
    inside
}

fn ring_crossings(ring: &[Position], p: DVec2) -> usize {
    let pts: Vec<DVec2> = ring.iter().filter_map(point).collect();
    if pts.len() < 3 {
        return 0;
    }
    let mut crossings = 0;
    let mut j = pts.len() - 1;
    for i in 0..pts.len() {
        let (a, b) = (pts[i], pts[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                crossings += 1;
            }
        }
        j = i;
    }
    crossings
}

/// SVG path data, one closed subpath per polygon ring
pub fn path_data(value: &Value) -> String {
    let closed = matches!(
        value,
        Value::Polygon(_) | Value::MultiPolygon(_) | Value::GeometryCollection(_)
    );
    let mut d = String::new();
    for_each_line(value, &mut |line: &[Position]| {
        let mut pts = line.iter().filter_map(point);
        let Some(first) = pts.next() else {
            return;
        };
        d.push_str(&format!("M{},{}", first.x, first.y));
        for p in pts {
            d.push_str(&format!("L{},{}", p.x, p.y));
        }
        if closed {
            d.push('Z');
        }
    });
    d
}

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}
