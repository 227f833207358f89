use super::{arc_index, ArcResolver, Geometry, Shape, Topology};
use geojson::{Position, Value};
use std::collections::HashMap;

/// Keeps arcs whose first and last referencing geometries differ, i.e. the
/// borders between two distinct regions. Outer coastlines, referenced by a
/// single geometry, are dropped.
pub fn interior_borders(a: &Geometry, b: &Geometry) -> bool {
    !std::ptr::eq(a, b)
}

/// Boundary mesh of an object as a `MultiLineString`.
///
/// Every arc referenced by the object's members is considered once. With a
/// filter, an arc is kept when `filter(first, last)` holds for the first and
/// last member geometries referencing it. Kept arcs that continue one another
/// are joined into a single line.
pub fn mesh<F>(topology: &Topology, object: &Geometry, filter: Option<F>) -> Value
where
    F: Fn(&Geometry, &Geometry) -> bool,
{
    let mut order: Vec<usize> = Vec::new();
    let mut geoms_by_arc: HashMap<usize, Vec<&Geometry>> = HashMap::new();

    for geometry in object.members() {
        for refs in arc_refs(geometry) {
            for &r in refs {
                let (i, _) = arc_index(r);
                let geoms = geoms_by_arc.entry(i).or_insert_with(|| {
                    order.push(i);
                    Vec::new()
                });
                geoms.push(geometry);
            }
        }
    }

    let selected = order.into_iter().filter(|i| match (&filter, geoms_by_arc.get(i)) {
        (Some(f), Some(geoms)) => match (geoms.first(), geoms.last()) {
            (Some(first), Some(last)) => f(first, last),
            _ => false,
        },
        _ => true,
    });

    let arcs = topology.decode_arcs();
    let resolver = ArcResolver::new(&arcs);
    let lines: Vec<Vec<Position>> = selected.map(|i| resolver.arc(i as i64)).collect();

    Value::MultiLineString(stitch(lines))
}

/// Every arc reference list of a geometry, flattened one level per ring/line
fn arc_refs(geometry: &Geometry) -> Vec<&[i64]> {
    let Some(shape) = &geometry.shape else {
        return Vec::new();
    };
    match shape {
        Shape::Polygon { arcs } | Shape::MultiLineString { arcs } => {
            arcs.iter().map(Vec::as_slice).collect()
        }
        Shape::MultiPolygon { arcs } => arcs
            .iter()
            .flat_map(|polygon| polygon.iter().map(Vec::as_slice))
            .collect(),
        Shape::LineString { arcs } => vec![arcs.as_slice()],
        Shape::GeometryCollection { geometries } => {
            geometries.iter().flat_map(arc_refs).collect()
        }
        Shape::Point { .. } | Shape::MultiPoint { .. } => Vec::new(),
    }
}

type PointKey = (u64, u64);

fn key(p: &Position) -> Option<PointKey> {
    match p.as_slice() {
        [x, y, ..] => Some((x.to_bits(), y.to_bits())),
        _ => None,
    }
}

/// Append each line to an open fragment ending where it starts
fn stitch(lines: Vec<Vec<Position>>) -> Vec<Vec<Position>> {
    let mut fragments: Vec<Vec<Position>> = Vec::new();
    let mut open_ends: HashMap<PointKey, usize> = HashMap::new();

    for line in lines {
        if line.len() < 2 {
            continue;
        }
        let (Some(start), Some(end)) = (line.first().and_then(key), line.last().and_then(key))
        else {
            continue;
        };

        match open_ends.remove(&start) {
            Some(idx) => {
                fragments[idx].extend(line.into_iter().skip(1));
                open_ends.insert(end, idx);
            }
            None => {
                open_ends.insert(end, fragments.len());
                fragments.push(line);
            }
        }
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::tests::{parse, TWO_SQUARES};

    fn lines(value: Value) -> Vec<Vec<Position>> {
        match value {
            Value::MultiLineString(lines) => lines,
            other => panic!("expected multilinestring, got {other:?}"),
        }
    }

    #[test]
    fn test_interior_mesh_keeps_only_shared_arc() {
        let topology = parse(TWO_SQUARES);
        let states = topology.object("states").unwrap();
        let borders = lines(mesh(&topology, states, Some(interior_borders)));

        assert_eq!(borders, vec![vec![vec![200.0, 100.0], vec![200.0, 200.0]]]);
    }

    #[test]
    fn test_unfiltered_mesh_covers_every_arc() {
        let topology = parse(TWO_SQUARES);
        let states = topology.object("states").unwrap();
        let all = lines(mesh(&topology, states, None::<fn(&Geometry, &Geometry) -> bool>));

        let points: usize = all.iter().map(Vec::len).sum();
        // arcs 0 and 2 have 4 points each, arc 1 has 2; joined arcs share a point
        assert!(points >= 8 && points <= 10);
        assert!(!all.is_empty());
    }

    #[test]
    fn test_single_region_has_no_interior_border() {
        let topology = parse(TWO_SQUARES);
        let counties = topology.object("counties").unwrap();
        let first = &counties.members()[0];
        let borders = lines(mesh(&topology, first, Some(interior_borders)));
        assert!(borders.is_empty());
    }

    #[test]
    fn test_stitch_joins_continuations() {
        let joined = stitch(vec![
            vec![vec![0.0, 0.0], vec![1.0, 0.0]],
            vec![vec![1.0, 0.0], vec![2.0, 0.0]],
            vec![vec![5.0, 5.0], vec![6.0, 6.0]],
        ]);
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0], vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![2.0, 0.0]]);
    }
}
