use crate::data::StatisticRecord;
use crate::topology::{self, Geometry, Topology};
use geojson::Value;
use std::collections::HashMap;
use tracing::debug;

/// A county geometry with the education record sharing its identifier
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedFeature {
    pub id: Option<i64>,
    pub geometry: Value,
    pub stats: Option<StatisticRecord>,
}

impl JoinedFeature {
    pub fn percentage(&self) -> Option<f64> {
        self.stats.as_ref().map(|s| s.percentage)
    }

    pub fn area_name(&self) -> Option<&str> {
        self.stats.as_ref().map(|s| s.area_name.as_str())
    }

    pub fn state_name(&self) -> Option<&str> {
        self.stats.as_ref().map(|s| s.state_name.as_str())
    }
}

/// One joined feature per geometry of `counties`, in topology order.
///
/// The first record carrying an identifier wins. Records whose identifier
/// matches no geometry are dropped.
pub fn join(topology: &Topology, counties: &Geometry, records: &[StatisticRecord]) -> Vec<JoinedFeature> {
    let mut by_id: HashMap<i64, &StatisticRecord> = HashMap::with_capacity(records.len());
    for record in records {
        by_id.entry(record.id).or_insert(record);
    }

    let features = topology::feature(topology, counties);
    let mut matched = 0usize;

    let joined: Vec<JoinedFeature> = features
        .into_iter()
        .map(|f| {
            let stats = f.id.and_then(|id| by_id.get(&id)).map(|r| (*r).clone());
            if stats.is_some() {
                matched += 1;
            }
            JoinedFeature {
                id: f.id,
                geometry: f.geometry,
                stats,
            }
        })
        .collect();

    debug!(
        "Joined {} of {} counties; {} records without geometry",
        matched,
        joined.len(),
        by_id.len().saturating_sub(matched)
    );

    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::tests::{parse, TWO_SQUARES};

    fn record(id: i64, name: &str, percentage: f64) -> StatisticRecord {
        StatisticRecord {
            id,
            area_name: name.to_string(),
            state_name: "X".to_string(),
            percentage,
        }
    }

    #[test]
    fn test_one_feature_per_geometry() {
        let topology = parse(TWO_SQUARES);
        let counties = topology.object("counties").unwrap();
        let joined = join(&topology, counties, &[record(1002, "B", 90.0), record(1001, "A", 10.0)]);

        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].id, Some(1001));
        assert_eq!(joined[0].area_name(), Some("A"));
        assert_eq!(joined[1].id, Some(1002));
        assert_eq!(joined[1].percentage(), Some(90.0));
    }

    #[test]
    fn test_missing_record_leaves_stats_empty() {
        let topology = parse(TWO_SQUARES);
        let counties = topology.object("counties").unwrap();
        let joined = join(&topology, counties, &[record(1001, "A", 10.0), record(9999, "Orphan", 50.0)]);

        assert_eq!(joined.len(), 2);
        assert!(joined[1].stats.is_none());
        assert_eq!(joined[1].percentage(), None);
        assert_eq!(joined[1].area_name(), None);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let topology = parse(TWO_SQUARES);
        let counties = topology.object("counties").unwrap();
        let joined = join(&topology, counties, &[record(1001, "first", 1.0), record(1001, "second", 2.0)]);
        assert_eq!(joined[0].area_name(), Some("first"));
    }

    #[test]
    fn test_null_geometry_is_still_joined() {
        let topology = parse(
            r#"{
                "type": "Topology",
                "arcs": [],
                "objects": {
                    "counties": {"type": "GeometryCollection", "geometries": [{"type": null, "id": 1001}]}
                }
            }"#,
        );
        let counties = topology.object("counties").unwrap();
        let joined = join(&topology, counties, &[record(1001, "A", 10.0)]);

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].area_name(), Some("A"));
        assert_eq!(crate::map::geometry::bounds(&joined[0].geometry), None);
    }
}
