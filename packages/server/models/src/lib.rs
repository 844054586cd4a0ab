#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crisis map server.
//!
//! These types are serialized to JSON for the REST API. Crisis and charity
//! records are returned in their canonical shape; everything else here is
//! specific to the HTTP contract.

use crisis_map_crisis_models::{Category, Charity, Crisis, LngLat, Severity};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// A crisis category with its marker color.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategory {
    pub name: Category,
    /// CSS hex color for unclustered markers.
    pub color: String,
}

impl From<Category> for ApiCategory {
    fn from(category: Category) -> Self {
        Self {
            name: category,
            color: category.color().to_string(),
        }
    }
}

/// A severity level with its rank.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSeverity {
    pub name: Severity,
    /// 1 (Low) to 4 (Critical).
    pub rank: u8,
    /// Whether markers of this severity pulse.
    pub pulses: bool,
}

impl From<Severity> for ApiSeverity {
    fn from(severity: Severity) -> Self {
        Self {
            name: severity,
            rank: severity.rank(),
            pulses: severity.pulses(),
        }
    }
}

/// Response from the categories endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTaxonomy {
    pub categories: Vec<ApiCategory>,
    /// Least severe first.
    pub severities: Vec<ApiSeverity>,
}

/// Order of the crisis list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrisisSort {
    /// Collection order as loaded.
    #[default]
    Collection,
    /// Most severe first, then most recent.
    Priority,
}

/// Query parameters for the crises endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisQueryParams {
    /// Case-insensitive free-text search.
    pub q: Option<String>,
    /// Category name.
    pub category: Option<String>,
    /// Severity name.
    pub severity: Option<String>,
    pub sort: Option<CrisisSort>,
    /// Maximum number of crises returned. `total` is unaffected.
    pub limit: Option<usize>,
}

/// Response from the crises endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisListResponse {
    pub crises: Vec<Crisis>,
    /// Number of crises matching the filters before `limit` is applied.
    pub total: usize,
}

/// Query parameters for the charities endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharityQueryParams {
    /// Restrict to charities supporting this crisis.
    pub crisis_id: Option<i64>,
}

/// Response from the charities endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharityListResponse {
    pub charities: Vec<Charity>,
}

/// Query parameters for the cluster endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterQueryParams {
    /// Current map zoom (fractional zoom is floored).
    pub zoom: Option<f64>,
    /// Clustering radius in pixels (overrides the server default).
    pub radius: Option<f64>,
    /// Case-insensitive free-text search.
    pub q: Option<String>,
    /// Category name.
    pub category: Option<String>,
    /// Severity name.
    pub severity: Option<String>,
}

/// Response from the cluster expansion endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionResponse {
    /// Zoom level at which the cluster splits.
    pub zoom: u8,
    /// Cluster centroid to center the map on.
    pub center: LngLat,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
