//! TopoJSON documents: shared arcs, quantized coordinates, named objects.
//!
//! Decoding follows the reference TopoJSON reader: arcs are delta encoded when
//! the document carries a `transform`, negative arc references (`!i`) walk arc
//! `i` backwards, and consecutive arcs in a ring share their joint point.

mod mesh;

pub use mesh::{interior_borders, mesh};

use geojson::{Position, Value};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
    #[serde(default)]
    pub arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    pub objects: HashMap<String, Geometry>,
}

/// Quantization transform: `x = qx * scale[0] + translate[0]`
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub id: Option<GeometryId>,
    /// `None` for a null geometry (`"type": null`) or one of an unknown type
    #[serde(flatten)]
    pub shape: Option<Shape>,
}

/// Geometry identifiers arrive either as numbers or as zero padded strings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum GeometryId {
    Number(i64),
    Text(String),
}

impl GeometryId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GeometryId::Number(n) => Some(*n),
            GeometryId::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Shape {
    GeometryCollection { geometries: Vec<Geometry> },
    Polygon { arcs: Vec<Vec<i64>> },
    MultiPolygon { arcs: Vec<Vec<Vec<i64>>> },
    LineString { arcs: Vec<i64> },
    MultiLineString { arcs: Vec<Vec<i64>> },
    Point { coordinates: Vec<f64> },
    MultiPoint { coordinates: Vec<Vec<f64>> },
}

/// A decoded geometry with its identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<i64>,
    pub geometry: Value,
}

impl Geometry {
    pub fn id(&self) -> Option<i64> {
        self.id.as_ref().and_then(GeometryId::as_i64)
    }

    /// Members of a collection, or the geometry itself
    pub fn members(&self) -> &[Geometry] {
        match &self.shape {
            Some(Shape::GeometryCollection { geometries }) => geometries,
            _ => std::slice::from_ref(self),
        }
    }
}

impl Topology {
    pub fn object(&self, name: &str) -> Option<&Geometry> {
        self.objects.get(name)
    }

    /// Decode every arc to absolute coordinates once
    pub fn decode_arcs(&self) -> Vec<Vec<Position>> {
        self.arcs
            .par_iter()
            .map(|arc| decode_arc(arc, self.transform.as_ref()))
            .collect()
    }

    /// One arc in absolute coordinates; a complemented index walks it backwards
    pub fn arc(&self, index: i64) -> Vec<Position> {
        let (i, reversed) = arc_index(index);
        let mut points = self
            .arcs
            .get(i)
            .map(|arc| decode_arc(arc, self.transform.as_ref()))
            .unwrap_or_default();
        if reversed {
            points.reverse();
        }
        points
    }

    fn point(&self, position: &[f64]) -> Position {
        match (&self.transform, position) {
            (Some(t), [x, y, rest @ ..]) => {
                let mut p = vec![x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]];
                p.extend_from_slice(rest);
                p
            }
            _ => position.to_vec(),
        }
    }
}

fn decode_arc(arc: &[Vec<f64>], transform: Option<&Transform>) -> Vec<Position> {
    let Some(t) = transform else {
        return arc.iter().map(|p| p.to_vec()).collect();
    };

    let (mut x, mut y) = (0.0, 0.0);
    arc.iter()
        .filter(|p| p.len() >= 2)
        .map(|p| {
            x += p[0];
            y += p[1];
            vec![x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
        })
        .collect()
}

/// Resolves arc references against a set of decoded arcs
pub(crate) struct ArcResolver<'a> {
    arcs: &'a [Vec<Position>],
}

impl<'a> ArcResolver<'a> {
    pub(crate) fn new(arcs: &'a [Vec<Position>]) -> Self {
        Self { arcs }
    }

    /// Arc `index` in traversal order, empty if the index is out of range
    pub(crate) fn arc(&self, index: i64) -> Vec<Position> {
        let (i, reversed) = arc_index(index);
        let mut points = self.arcs.get(i).cloned().unwrap_or_default();
        if reversed {
            points.reverse();
        }
        points
    }

    pub(crate) fn line(&self, refs: &[i64]) -> Vec<Position> {
        let mut points: Vec<Position> = Vec::new();
        for &r in refs {
            // the joint point is repeated by the next arc
            points.pop();
            points.extend(self.arc(r));
        }
        if points.len() == 1 {
            points.push(points[0].clone());
        }
        points
    }

    pub(crate) fn ring(&self, refs: &[i64]) -> Vec<Position> {
        let mut points = self.line(refs);
        if let Some(first) = points.first().cloned() {
            while points.len() < 4 {
                points.push(first.clone());
            }
        }
        points
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Vec<Vec<Position>> {
        rings.iter().map(|r| self.ring(r)).collect()
    }
}

/// Arc slot and direction for a possibly complemented reference
pub(crate) fn arc_index(index: i64) -> (usize, bool) {
    if index < 0 {
        ((!index) as usize, true)
    } else {
        (index as usize, false)
    }
}

/// Convert a topology object into features.
///
/// A `GeometryCollection` yields one feature per member in document order;
/// any other geometry yields a single feature.
pub fn feature(topology: &Topology, object: &Geometry) -> Vec<Feature> {
    let arcs = topology.decode_arcs();
    let resolver = ArcResolver::new(&arcs);

    object
        .members()
        .par_iter()
        .map(|geometry| Feature {
            id: geometry.id(),
            geometry: geometry_value(topology, &resolver, geometry),
        })
        .collect()
}

/// A null geometry becomes an empty collection: no bounds, no path, never hit
fn geometry_value(topology: &Topology, resolver: &ArcResolver, geometry: &Geometry) -> Value {
    let Some(shape) = &geometry.shape else {
        return Value::GeometryCollection(Vec::new());
    };
    match shape {
        Shape::GeometryCollection { geometries } => Value::GeometryCollection(
            geometries
                .iter()
                .map(|g| geojson::Geometry::new(geometry_value(topology, resolver, g)))
                .collect(),
        ),
        Shape::Polygon { arcs } => Value::Polygon(resolver.polygon(arcs)),
        Shape::MultiPolygon { arcs } => {
            Value::MultiPolygon(arcs.iter().map(|p| resolver.polygon(p)).collect())
        }
        Shape::LineString { arcs } => Value::LineString(resolver.line(arcs)),
        Shape::MultiLineString { arcs } => {
            Value::MultiLineString(arcs.iter().map(|l| resolver.line(l)).collect())
        }
        Shape::Point { coordinates } => Value::Point(topology.point(coordinates)),
        Shape::MultiPoint { coordinates } => {
            Value::MultiPoint(coordinates.iter().map(|p| topology.point(p)).collect())
        }
    }
}
