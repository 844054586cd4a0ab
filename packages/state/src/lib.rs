#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Explicit UI state container for the crisis map.
//!
//! [`MapStore`] owns the loaded snapshot, the [`FilterState`], the
//! [`Selection`] and the map viewport, and keeps the derived views (the
//! filtered list and the clustered map features) consistent with them.
//! Every user interaction is an [`Action`] passed to
//! [`MapStore::dispatch`], which updates state in one step and returns the
//! [`Effect`]s the map surface should perform.

pub mod selection;

use crisis_map_cluster::{ClickOutcome, ClusterIndex, ClusterOptions, FeatureClick, MapFeature};
use crisis_map_crisis_models::{Category, Charity, Crisis, CrisisId, LngLat, Severity, Snapshot};
use crisis_map_filter::{CharityIndex, FilterState, filter_indices};
use serde::{Deserialize, Serialize};

pub use selection::Selection;

/// Zoom the map flies to when a crisis is selected.
pub const SELECT_ZOOM: f64 = 5.0;

/// Duration of the fly-to animation on selection.
pub const SELECT_DURATION_MS: u32 = 1500;

/// Duration of the fly-to animation when expanding a cluster.
pub const EXPAND_DURATION_MS: u32 = 500;

/// Page sizes offered for the crisis list.
pub const RESULTS_LIMIT_OPTIONS: [usize; 4] = [25, 50, 100, 200];

/// Default page size for the crisis list.
pub const DEFAULT_RESULTS_LIMIT: usize = 100;

/// Snaps a requested page size down to the nearest offered option, or up to
/// the smallest one.
#[must_use]
pub fn snap_results_limit(limit: usize) -> usize {
    RESULTS_LIMIT_OPTIONS
        .iter()
        .rev()
        .find(|&&option| option <= limit)
        .copied()
        .unwrap_or(RESULTS_LIMIT_OPTIONS[0])
}

/// Map camera position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LngLat,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: LngLat::new(20.0, 20.0),
            zoom: 1.5,
        }
    }
}

/// Progress of the initial data load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Loading,
    Ready,
    /// The load failed; collections are empty.
    Failed(String),
}

/// A user interaction or data event.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The data source delivered a snapshot.
    Loaded(Snapshot),
    /// The data source failed.
    LoadFailed(String),
    SetSearch(String),
    SetCategory(Option<Category>),
    SetSeverity(Option<Severity>),
    /// Chip behavior: selecting the active category clears it.
    ToggleCategory(Category),
    /// Chip behavior: selecting the active severity clears it.
    ToggleSeverity(Severity),
    ClearFilters,
    /// Snapped to [`RESULTS_LIMIT_OPTIONS`].
    SetResultsLimit(usize),
    /// A list entry was clicked.
    SelectCrisis(CrisisId),
    /// A map feature was clicked.
    ClickFeature(FeatureClick),
    /// The details panel was closed.
    CloseDetails,
    /// The map surface reports its current camera.
    ViewportChanged(Viewport),
}

/// A side effect for the map surface to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Effect {
    /// Animate the camera to `center` at `zoom`. A newer fly-to interrupts
    /// one in flight.
    #[serde(rename_all = "camelCase")]
    FlyTo {
        center: LngLat,
        zoom: f64,
        duration_ms: u32,
    },
}

/// The selected crisis with its charities, for the details panel.
#[derive(Debug, Clone, PartialEq)]
pub struct CrisisDetails<'a> {
    pub crisis: &'a Crisis,
    pub charities: Vec<&'a Charity>,
    /// Whether the crisis is part of the current filtered set.
    pub in_view: bool,
}

/// Top-level state container.
pub struct MapStore {
    snapshot: Snapshot,
    charity_index: CharityIndex,
    status: LoadStatus,
    filters: FilterState,
    selection: Selection,
    viewport: Viewport,
    results_limit: usize,
    cluster_options: ClusterOptions,
    filtered: Vec<usize>,
    cluster_index: ClusterIndex,
    features: Vec<MapFeature>,
    feature_level: u8,
}

impl Default for MapStore {
    fn default() -> Self {
        Self::new(ClusterOptions::default())
    }
}

impl MapStore {
    /// Creates an empty store in the [`LoadStatus::Loading`] state.
    #[must_use]
    pub fn new(cluster_options: ClusterOptions) -> Self {
        let viewport = Viewport::default();
        Self {
            snapshot: Snapshot::default(),
            charity_index: CharityIndex::default(),
            status: LoadStatus::Loading,
            filters: FilterState::default(),
            selection: Selection::Unselected,
            viewport,
            results_limit: DEFAULT_RESULTS_LIMIT,
            cluster_options,
            filtered: Vec::new(),
            cluster_index: ClusterIndex::new(Vec::new(), cluster_options),
            features: Vec::new(),
            feature_level: ClusterIndex::zoom_level(viewport.zoom),
        }
    }

    /// Applies `action` and returns the resulting effects.
    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        log::trace!("dispatch {action:?}");

        match action {
            Action::Loaded(snapshot) => {
                log::info!(
                    "Loaded {} crises and {} charities",
                    snapshot.crises.len(),
                    snapshot.charities.len()
                );
                self.charity_index = CharityIndex::build(&snapshot.charities);
                self.snapshot = snapshot;
                self.status = LoadStatus::Ready;
                self.refilter();
            }
            Action::LoadFailed(message) => {
                log::error!("Failed to load crisis data: {message}");
                self.snapshot = Snapshot::default();
                self.charity_index = CharityIndex::default();
                self.status = LoadStatus::Failed(message);
                self.refilter();
            }
            Action::SetSearch(search) => {
                let filters = self.filters.clone().with_search(search);
                self.set_filters(filters);
            }
            Action::SetCategory(category) => {
                let filters = self.filters.clone().with_category(category);
                self.set_filters(filters);
            }
            Action::SetSeverity(severity) => {
                let filters = self.filters.clone().with_severity(severity);
                self.set_filters(filters);
            }
            Action::ToggleCategory(category) => {
                let next = (self.filters.category != Some(category)).then_some(category);
                let filters = self.filters.clone().with_category(next);
                self.set_filters(filters);
            }
            Action::ToggleSeverity(severity) => {
                let next = (self.filters.severity != Some(severity)).then_some(severity);
                let filters = self.filters.clone().with_severity(next);
                self.set_filters(filters);
            }
            Action::ClearFilters => self.set_filters(FilterState::default()),
            Action::SetResultsLimit(limit) => {
                self.results_limit = snap_results_limit(limit);
            }
            Action::SelectCrisis(id) => return self.select(id).into_iter().collect(),
            Action::ClickFeature(click) => {
                return match self.cluster_index.resolve_click(click) {
                    Some(ClickOutcome::Select(id)) => self.select(id).into_iter().collect(),
                    Some(ClickOutcome::Expand { center, zoom }) => vec![Effect::FlyTo {
                        center,
                        zoom: f64::from(zoom),
                        duration_ms: EXPAND_DURATION_MS,
                    }],
                    None => {
                        log::debug!("Ignoring stale feature click {click:?}");
                        Vec::new()
                    }
                };
            }
            Action::CloseDetails => {
                self.selection.close();
            }
            Action::ViewportChanged(viewport) => {
                self.viewport = viewport;
                let level = ClusterIndex::zoom_level(viewport.zoom);
                if level != self.feature_level {
                    self.feature_level = level;
                    self.recluster();
                }
            }
        }

        Vec::new()
    }

    fn select(&mut self, id: CrisisId) -> Option<Effect> {
        let Some(crisis) = self.snapshot.crisis(id) else {
            log::warn!("Ignoring selection of unknown crisis {id}");
            return None;
        };
        let center = crisis.position();
        self.selection.select(id);
        Some(Effect::FlyTo {
            center,
            zoom: SELECT_ZOOM,
            duration_ms: SELECT_DURATION_MS,
        })
    }

    fn set_filters(&mut self, filters: FilterState) {
        if filters != self.filters {
            self.filters = filters;
            self.refilter();
        }
    }

    /// Recomputes the filtered list, then the cluster index and features.
    fn refilter(&mut self) {
        self.filtered = filter_indices(&self.snapshot.crises, &self.filters);
        self.cluster_index = ClusterIndex::from_crises(
            self.filtered.iter().map(|&i| &self.snapshot.crises[i]),
            self.cluster_options,
        );
        self.recluster();
    }

    fn recluster(&mut self) {
        self.features = self.cluster_index.features_at_level(self.feature_level);
    }

    #[must_use]
    pub const fn status(&self) -> &LoadStatus {
        &self.status
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.status, LoadStatus::Loading)
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    #[must_use]
    pub const fn selection(&self) -> Selection {
        self.selection
    }

    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub const fn results_limit(&self) -> usize {
        self.results_limit
    }

    #[must_use]
    pub fn all_crises(&self) -> &[Crisis] {
        &self.snapshot.crises
    }

    /// Crises passing the current filters, in snapshot order.
    #[must_use]
    pub fn filtered_crises(&self) -> Vec<&Crisis> {
        self.filtered
            .iter()
            .map(|&i| &self.snapshot.crises[i])
            .collect()
    }

    /// The filtered list truncated to the results limit. The map is never
    /// truncated.
    #[must_use]
    pub fn visible_list(&self) -> Vec<&Crisis> {
        self.filtered
            .iter()
            .take(self.results_limit)
            .map(|&i| &self.snapshot.crises[i])
            .collect()
    }

    /// Map features for the current filters and zoom level.
    #[must_use]
    pub fn features(&self) -> &[MapFeature] {
        &self.features
    }

    /// The selected crisis, resolved against the full snapshot.
    #[must_use]
    pub fn selected_crisis(&self) -> Option<&Crisis> {
        self.selection
            .crisis_id()
            .and_then(|id| self.snapshot.crisis(id))
    }

    /// Whether the selected crisis is part of the filtered set.
    #[must_use]
    pub fn selection_in_view(&self) -> bool {
        self.selection.crisis_id().is_some_and(|id| {
            self.filtered
                .iter()
                .any(|&i| self.snapshot.crises[i].id == id)
        })
    }

    /// Charities for any crisis id, in collection order.
    #[must_use]
    pub fn charities_for(&self, crisis_id: CrisisId) -> Vec<&Charity> {
        self.charity_index
            .lookup(&self.snapshot.charities, crisis_id)
    }

    /// Data for the details panel, or `None` when nothing resolvable is
    /// selected.
    #[must_use]
    pub fn details(&self) -> Option<CrisisDetails<'_>> {
        let crisis = self.selected_crisis()?;
        Some(CrisisDetails {
            crisis,
            charities: self.charities_for(crisis.id),
            in_view: self.selection_in_view(),
        })
    }
}
