//! `GeoJSON` export of clustered map features.
//!
//! Property names follow what `MapLibre` cluster layers expect
//! (`cluster`, `cluster_id`, `point_count`).

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::MapFeature;

/// Converts features into a `GeoJSON` `FeatureCollection`, preserving order.
#[must_use]
pub fn to_feature_collection(features: &[MapFeature]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: features.iter().map(to_feature).collect(),
        foreign_members: None,
    }
}

fn to_feature(feature: &MapFeature) -> Feature {
    let position = feature.position();

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![position.lng, position.lat]))),
        id: None,
        properties: Some(properties(feature)),
        foreign_members: None,
    }
}

fn properties(feature: &MapFeature) -> JsonObject {
    let value = match feature {
        MapFeature::Unclustered(f) => json!({
            "cluster": false,
            "crisis_id": f.crisis_id,
            "category": f.category,
            "severity": f.severity,
            "pulse": f.severity.pulses(),
            "color": f.color,
        }),
        MapFeature::Cluster(f) => json!({
            "cluster": true,
            "cluster_id": f.id.to_string(),
            "cluster_zoom": f.id.zoom,
            "cluster_seed": f.id.seed,
            "point_count": f.point_count,
            "tier": f.tier.index(),
            "radius": f.tier.radius(),
            "color": f.tier.color(),
            "max_severity": f.max_severity,
        }),
    };

    match value {
        serde_json::Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

#[cfg(test)]
mod tests {
    use crisis_map_crisis_models::{Category, LngLat, Severity};

    use super::*;
    use crate::{ClusterIndex, ClusterOptions, ClusterPoint};

    fn index() -> ClusterIndex {
        let points = vec![
            ClusterPoint {
                crisis_id: 1,
                category: Category::Conflict,
                severity: Severity::Critical,
                position: LngLat::new(39.0, 34.8),
            },
            ClusterPoint {
                crisis_id: 2,
                category: Category::Disaster,
                severity: Severity::Low,
                position: LngLat::new(39.0001, 34.8),
            },
            ClusterPoint {
                crisis_id: 3,
                category: Category::Climate,
                severity: Severity::High,
                position: LngLat::new(-62.2, -3.5),
            },
        ];
        ClusterIndex::new(points, ClusterOptions::default())
    }

    #[test]
    fn exports_points_and_clusters() {
        let collection = to_feature_collection(&index().features(3.0));
        assert_eq!(collection.features.len(), 2);

        let cluster = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(cluster["cluster"], true);
        assert_eq!(cluster["point_count"], 2);
        assert_eq!(cluster["tier"], 0);
        assert_eq!(cluster["cluster_id"], "3/0");
        assert_eq!(cluster["max_severity"], "Critical");

        let single = collection.features[1].properties.as_ref().unwrap();
        assert_eq!(single["cluster"], false);
        assert_eq!(single["crisis_id"], 3);
        assert_eq!(single["category"], "Climate");
        assert_eq!(single["color"], "#2dd4bf");
        assert_eq!(single["pulse"], true);
    }

    #[test]
    fn geometry_is_lng_lat_point() {
        let collection = to_feature_collection(&index().features(20.0));
        let geometry = collection.features[2].geometry.as_ref().unwrap();
        assert_eq!(geometry.value, Value::Point(vec![-62.2, -3.5]));
    }

    #[test]
    fn serializes_as_feature_collection() {
        let json = serde_json::to_value(to_feature_collection(&[])).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"], serde_json::json!([]));
    }
}
