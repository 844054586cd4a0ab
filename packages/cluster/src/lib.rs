#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zoom-aware geographic clustering of crisis points.
//!
//! Points are projected into Web Mercator world space (`[0, 1]²`) and
//! bulk-loaded into an R-tree once. For a given integer zoom level the
//! clustering radius, expressed in rendered pixels, is converted to a
//! world-space distance and points are grouped by single linkage: two
//! points share a cluster when a chain of points, each within the radius
//! of the next, connects them. Shrinking the radius can only remove
//! links, so clusters only ever split as the map zooms in.
//!
//! Groups smaller than [`ClusterOptions::min_points`] render as
//! individual features, and at or above [`ClusterOptions::max_zoom`]
//! every point renders individually.

pub mod export;

use std::f64::consts::PI;

use crisis_map_crisis_models::{Category, Crisis, CrisisId, LngLat, Severity};
use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};

pub use export::to_feature_collection;

/// Tunables for [`ClusterIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterOptions {
    /// Clustering radius in rendered pixels.
    pub radius: f64,
    /// Tile extent in pixels the radius is measured against.
    pub extent: f64,
    /// Zoom level at and above which clustering is disabled.
    pub max_zoom: u8,
    /// Minimum group size that forms a cluster. Values below 2 are
    /// treated as 2.
    pub min_points: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            radius: 50.0,
            extent: 512.0,
            max_zoom: 14,
            min_points: 2,
        }
    }
}

/// Stable handle for a cluster feature.
///
/// `seed` is the position of the cluster's first member in the point set
/// the index was built from, and `zoom` the level the cluster was produced
/// at. A handle is only meaningful for the index that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterId {
    /// Integer zoom level.
    pub zoom: u8,
    /// Lowest member position.
    pub seed: usize,
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.zoom, self.seed)
    }
}

/// Density bucket of a cluster, used to pick its radius and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterTier {
    /// Fewer than 10 points
    Small,
    /// 10 to 99 points
    Medium,
    /// 100 points or more
    Large,
}

impl ClusterTier {
    #[must_use]
    pub const fn for_count(point_count: usize) -> Self {
        if point_count < 10 {
            Self::Small
        } else if point_count < 100 {
            Self::Medium
        } else {
            Self::Large
        }
    }

    /// Numeric tier (0, 1 or 2).
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Circle radius in pixels.
    #[must_use]
    pub const fn radius(self) -> f64 {
        match self {
            Self::Small => 20.0,
            Self::Medium => 30.0,
            Self::Large => 40.0,
        }
    }

    /// Circle color (CSS hex).
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Small => "#51bbd6",
            Self::Medium => "#f1f075",
            Self::Large => "#f28cb1",
        }
    }
}

/// Input point for clustering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterPoint {
    pub crisis_id: CrisisId,
    pub category: Category,
    pub severity: Severity,
    pub position: LngLat,
}

impl From<&Crisis> for ClusterPoint {
    fn from(crisis: &Crisis) -> Self {
        Self {
            crisis_id: crisis.id,
            category: crisis.category,
            severity: crisis.severity,
            position: crisis.position(),
        }
    }
}

/// A single crisis rendered on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnclusteredFeature {
    /// Backing crisis.
    pub crisis_id: CrisisId,
    pub category: Category,
    pub severity: Severity,
    pub position: LngLat,
    /// Category-derived marker color.
    pub color: &'static str,
}

/// Several nearby crises merged into one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterFeature {
    /// Handle used for zoom-to-expand.
    pub id: ClusterId,
    /// Mean position of the members.
    pub position: LngLat,
    /// Number of member crises.
    pub point_count: usize,
    /// Density bucket derived from `point_count`.
    pub tier: ClusterTier,
    /// Most severe member.
    pub max_severity: Severity,
    /// Member crisis ids in input order.
    pub members: Vec<CrisisId>,
}

/// One renderable map feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MapFeature {
    Unclustered(UnclusteredFeature),
    Cluster(ClusterFeature),
}

impl MapFeature {
    #[must_use]
    pub const fn position(&self) -> LngLat {
        match self {
            Self::Unclustered(f) => f.position,
            Self::Cluster(f) => f.position,
        }
    }

    /// Number of crises this feature stands for.
    #[must_use]
    pub const fn point_count(&self) -> usize {
        match self {
            Self::Unclustered(_) => 1,
            Self::Cluster(f) => f.point_count,
        }
    }

    #[must_use]
    pub const fn is_cluster(&self) -> bool {
        matches!(self, Self::Cluster(_))
    }
}

/// Click event emitted by a map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FeatureClick {
    /// A cluster feature was clicked.
    Cluster { id: ClusterId },
    /// An unclustered feature was clicked.
    Crisis { id: CrisisId },
}

/// What a [`FeatureClick`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// Select the crisis.
    Select(CrisisId),
    /// Recenter on `center` and zoom to `zoom`, where the cluster splits.
    Expand { center: LngLat, zoom: u8 },
}

/// Projects a WGS84 position into Web Mercator world space.
///
/// `x` grows eastwards and `y` southwards, both in `[0, 1]`. Latitudes
/// beyond the Mercator limit are clamped to the edges.
#[must_use]
pub fn project(position: LngLat) -> [f64; 2] {
    let x = position.lng / 360.0 + 0.5;
    let sin = (position.lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    [x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)]
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Spatial index over a fixed point set.
///
/// Built once per filtered crisis list and queried for any zoom level.
/// Construction is `O(n log n)`; producing features at a zoom level is a
/// full recomputation.
pub struct ClusterIndex {
    points: Vec<ClusterPoint>,
    projected: Vec<[f64; 2]>,
    tree: RTree<IndexedPoint>,
    options: ClusterOptions,
}

impl ClusterIndex {
    /// Builds the index.
    #[must_use]
    pub fn new(points: Vec<ClusterPoint>, options: ClusterOptions) -> Self {
        let projected: Vec<[f64; 2]> = points.iter().map(|p| project(p.position)).collect();
        let tree = RTree::bulk_load(
            projected
                .iter()
                .enumerate()
                .map(|(i, &xy)| GeomWithData::new(xy, i))
                .collect(),
        );

        log::debug!("Built cluster index over {} points", points.len());

        Self {
            points,
            projected,
            tree,
            options,
        }
    }

    /// Builds the index from crisis records, preserving their order.
    #[must_use]
    pub fn from_crises<'a>(
        crises: impl IntoIterator<Item = &'a Crisis>,
        options: ClusterOptions,
    ) -> Self {
        Self::new(crises.into_iter().map(ClusterPoint::from).collect(), options)
    }

    #[must_use]
    pub const fn options(&self) -> &ClusterOptions {
        &self.options
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Integer zoom level for a (possibly fractional) viewport zoom.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn zoom_level(zoom: f64) -> u8 {
        if zoom.is_nan() || zoom <= 0.0 {
            0
        } else {
            zoom.floor().min(f64::from(u8::MAX)) as u8
        }
    }

    /// Features for the given viewport zoom.
    #[must_use]
    pub fn features(&self, zoom: f64) -> Vec<MapFeature> {
        self.features_at_level(Self::zoom_level(zoom))
    }

    /// Features for an integer zoom level, ordered by the input position of
    /// each feature's first member.
    #[must_use]
    pub fn features_at_level(&self, level: u8) -> Vec<MapFeature> {
        let mut keyed: Vec<(usize, MapFeature)> = Vec::new();

        for members in self.components(level) {
            if members.len() >= self.min_points() {
                let feature = self.cluster_feature(level, &members);
                keyed.push((members[0], MapFeature::Cluster(feature)));
            } else {
                keyed.extend(
                    members
                        .iter()
                        .map(|&i| (i, MapFeature::Unclustered(self.unclustered_feature(i)))),
                );
            }
        }

        keyed.sort_by_key(|(first, _)| *first);

        log::debug!(
            "Clustered {} points into {} features at zoom {level}",
            self.points.len(),
            keyed.len()
        );

        keyed.into_iter().map(|(_, feature)| feature).collect()
    }

    /// Looks up the cluster a handle refers to.
    ///
    /// Returns `None` if the handle does not name a cluster of this index.
    #[must_use]
    pub fn cluster(&self, id: ClusterId) -> Option<ClusterFeature> {
        let members = self.cluster_members(id)?;
        Some(self.cluster_feature(id.zoom, &members))
    }

    /// The smallest zoom level at which the members of `id` stop forming a
    /// single cluster.
    ///
    /// Never exceeds [`ClusterOptions::max_zoom`]. Returns `None` if the
    /// handle does not name a cluster of this index.
    #[must_use]
    pub fn expansion_zoom(&self, id: ClusterId) -> Option<u8> {
        let members = self.cluster_members(id)?;

        // Components only shrink as the level rises, so the first splitting
        // level can be found by bisection.
        let levels: Vec<u8> = (id.zoom.saturating_add(1)..self.options.max_zoom).collect();
        let first_split = levels.partition_point(|&level| {
            self.clustering_enabled(level) && self.component(id.seed, level).len() == members.len()
        });

        Some(levels.get(first_split).copied().unwrap_or(self.options.max_zoom))
    }

    /// Resolves a click from the map surface.
    ///
    /// Returns `None` when the click refers to a crisis or cluster that is
    /// not part of this index (e.g. a stale event after a filter change).
    #[must_use]
    pub fn resolve_click(&self, click: FeatureClick) -> Option<ClickOutcome> {
        match click {
            FeatureClick::Crisis { id } => self
                .points
                .iter()
                .any(|p| p.crisis_id == id)
                .then_some(ClickOutcome::Select(id)),
            FeatureClick::Cluster { id } => {
                let cluster = self.cluster(id)?;
                let zoom = self.expansion_zoom(id)?;
                Some(ClickOutcome::Expand {
                    center: cluster.position,
                    zoom,
                })
            }
        }
    }

    fn min_points(&self) -> usize {
        self.options.min_points.max(2)
    }

    fn clustering_enabled(&self, level: u8) -> bool {
        level < self.options.max_zoom && self.options.radius > 0.0 && self.options.extent > 0.0
    }

    /// Clustering radius in world units at `level`.
    fn world_radius(&self, level: u8) -> f64 {
        self.options.radius / (self.options.extent * 2f64.powi(i32::from(level)))
    }

    /// Connected components at `level`, each sorted, in seed order.
    fn components(&self, level: u8) -> Vec<Vec<usize>> {
        if !self.clustering_enabled(level) {
            return (0..self.points.len()).map(|i| vec![i]).collect();
        }

        let radius = self.world_radius(level);
        let mut tree = self.tree.clone();
        let mut assigned = vec![false; self.points.len()];
        let mut components = Vec::new();

        for seed in 0..self.points.len() {
            if !assigned[seed] {
                components.push(self.flood(&mut tree, seed, radius, &mut assigned));
            }
        }

        components
    }

    /// The component containing `seed` at `level`, sorted.
    fn component(&self, seed: usize, level: u8) -> Vec<usize> {
        let mut tree = self.tree.clone();
        let mut assigned = vec![false; self.points.len()];
        self.flood(&mut tree, seed, self.world_radius(level), &mut assigned)
    }

    /// Flood-fills from `seed` over links no longer than `radius`.
    ///
    /// Reached points are drained from `tree`, so every point is returned by
    /// at most one neighbor query and a full pass stays `O(n log n)`.
    fn flood(
        &self,
        tree: &mut RTree<IndexedPoint>,
        seed: usize,
        radius: f64,
        assigned: &mut [bool],
    ) -> Vec<usize> {
        let max_squared = radius * radius;
        let mut members = vec![seed];
        let mut stack = vec![seed];
        assigned[seed] = true;

        while let Some(current) = stack.pop() {
            for neighbor in tree.drain_within_distance(self.projected[current], max_squared) {
                if !assigned[neighbor.data] {
                    assigned[neighbor.data] = true;
                    members.push(neighbor.data);
                    stack.push(neighbor.data);
                }
            }
        }

        members.sort_unstable();
        members
    }

    fn cluster_members(&self, id: ClusterId) -> Option<Vec<usize>> {
        if id.seed >= self.points.len() || !self.clustering_enabled(id.zoom) {
            return None;
        }

        let members = self.component(id.seed, id.zoom);

        (members[0] == id.seed && members.len() >= self.min_points()).then_some(members)
    }

    #[allow(clippy::cast_precision_loss)]
    fn cluster_feature(&self, level: u8, members: &[usize]) -> ClusterFeature {
        let count = members.len();
        let (lng_sum, lat_sum) = members.iter().fold((0.0, 0.0), |(lng, lat), &i| {
            let p = self.points[i].position;
            (lng + p.lng, lat + p.lat)
        });
        let max_severity = members
            .iter()
            .map(|&i| self.points[i].severity)
            .max()
            .unwrap_or(Severity::Low);

        ClusterFeature {
            id: ClusterId {
                zoom: level,
                seed: members[0],
            },
            position: LngLat::new(lng_sum / count as f64, lat_sum / count as f64),
            point_count: count,
            tier: ClusterTier::for_count(count),
            max_severity,
            members: members.iter().map(|&i| self.points[i].crisis_id).collect(),
        }
    }

    fn unclustered_feature(&self, i: usize) -> UnclusteredFeature {
        let point = &self.points[i];
        UnclusteredFeature {
            crisis_id: point.crisis_id,
            category: point.category,
            severity: point.severity,
            position: point.position,
            color: point.category.color(),
        }
    }
}
