#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Crisis and charity record types, category and severity definitions.
//!
//! These are the canonical shapes shared by every other crisis-map crate.
//! Records are produced by a data source once per load and are treated as
//! an immutable snapshot afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Identifier of a [`Crisis`].
pub type CrisisId = i64;

/// Identifier of a [`Charity`].
pub type CharityId = i64;

/// Severity level of a crisis, ordered from least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Severity {
    /// Localized or slow-moving situation
    Low = 1,
    /// Significant but contained situation
    Medium = 2,
    /// Large-scale situation requiring outside assistance
    High = 3,
    /// Catastrophic situation with widespread loss of life
    Critical = 4,
}

impl Severity {
    /// Returns the numeric rank of this severity (1-4).
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Whether markers for this severity are drawn with a pulse animation.
    #[must_use]
    pub const fn pulses(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    /// Returns all variants of this enum, least severe first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High, Self::Critical]
    }
}

/// Crisis category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    /// Armed conflict and political violence
    Conflict,
    /// Earthquakes, floods, storms and other sudden-onset disasters
    Disaster,
    /// Epidemics and public health emergencies
    Health,
    /// Famine, displacement and economic collapse
    Humanitarian,
    /// Climate and environmental degradation
    Climate,
}

impl Category {
    /// Marker color (CSS hex) for unclustered map features of this category.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Conflict => "#ef4444",
            Self::Disaster => "#f97316",
            Self::Health => "#22c55e",
            Self::Humanitarian => "#3b82f6",
            Self::Climate => "#2dd4bf",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Conflict,
            Self::Disaster,
            Self::Health,
            Self::Humanitarian,
            Self::Climate,
        ]
    }
}

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Latitude in decimal degrees.
    pub lat: f64,
}

impl LngLat {
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// One humanitarian or disaster event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crisis {
    /// Unique, stable identifier.
    pub id: CrisisId,
    /// Display title.
    pub title: String,
    /// Crisis category.
    pub category: Category,
    /// Display country name.
    pub country: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Severity level.
    pub severity: Severity,
    /// One-line summary.
    pub summary: String,
    /// Long-form description.
    pub description: String,
    /// Date the crisis began.
    pub start_date: NaiveDate,
    /// Lifecycle flag. Not filtered upon.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl Crisis {
    /// Position of this crisis.
    #[must_use]
    pub const fn position(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }

    /// Checks that the coordinates are finite and within WGS84 bounds.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinatesError`] if latitude is outside −90..=90
    /// or longitude is outside −180..=180.
    pub fn validate(&self) -> Result<(), InvalidCoordinatesError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lng_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);

        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(InvalidCoordinatesError {
                id: self.id,
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// Error returned by [`Crisis::validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidCoordinatesError {
    /// The offending crisis.
    pub id: CrisisId,
    /// The latitude that was provided.
    pub latitude: f64,
    /// The longitude that was provided.
    pub longitude: f64,
}

impl std::fmt::Display for InvalidCoordinatesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "crisis {} has invalid coordinates ({}, {})",
            self.id, self.latitude, self.longitude
        )
    }
}

impl std::error::Error for InvalidCoordinatesError {}

/// A relief organization linked to one crisis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charity {
    /// Unique identifier.
    pub id: CharityId,
    /// Organization name.
    pub name: String,
    /// Short description of the organization's work.
    pub description: String,
    /// External donation page.
    pub donation_url: String,
    /// The crisis this charity supports.
    pub crisis_id: CrisisId,
}

/// The full read-only data set for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// All crises, in source order.
    pub crises: Vec<Crisis>,
    /// All charities, in source order.
    pub charities: Vec<Charity>,
}

impl Snapshot {
    /// Looks up a crisis by id.
    #[must_use]
    pub fn crisis(&self, id: CrisisId) -> Option<&Crisis> {
        self.crises.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.crises.is_empty() && self.charities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syria() -> Crisis {
        Crisis {
            id: 1,
            title: "Syria Civil War".to_string(),
            category: Category::Conflict,
            country: "Syria".to_string(),
            latitude: 34.8,
            longitude: 39.0,
            severity: Severity::Critical,
            summary: String::new(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2011, 3, 15).unwrap(),
            is_active: true,
        }
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        for window in Severity::all().windows(2) {
            assert_eq!(window[0].rank() + 1, window[1].rank());
        }
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("conflict".parse::<Category>().unwrap(), Category::Conflict);
        assert_eq!("CRITICAL".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("Volcano".parse::<Category>().is_err());
    }

    #[test]
    fn enums_display_as_wire_names() {
        assert_eq!(Category::Humanitarian.to_string(), "Humanitarian");
        assert_eq!(Severity::Medium.as_ref(), "Medium");
    }

    #[test]
    fn category_colors_are_distinct() {
        let mut colors: Vec<&str> = Category::all().iter().map(|c| c.color()).collect();
        colors.sort_unstable();
        colors.dedup();
        assert_eq!(colors.len(), Category::all().len());
    }

    #[test]
    fn crisis_deserializes_from_wire_format() {
        let crisis: Crisis = serde_json::from_value(serde_json::json!({
            "id": 2,
            "title": "Yemen Crisis",
            "category": "Humanitarian",
            "country": "Yemen",
            "latitude": 15.6,
            "longitude": 48.5,
            "severity": "Critical",
            "summary": "s",
            "description": "d",
            "start_date": "2014-09-21"
        }))
        .unwrap();

        assert_eq!(crisis.category, Category::Humanitarian);
        assert_eq!(
            crisis.start_date,
            NaiveDate::from_ymd_opt(2014, 9, 21).unwrap()
        );
        assert!(crisis.is_active, "is_active should default to true");
    }

    #[test]
    fn validate_rejects_out_of_range_coordinates() {
        assert!(syria().validate().is_ok());

        let mut bad = syria();
        bad.latitude = 91.0;
        assert!(bad.validate().is_err());

        let mut bad = syria();
        bad.longitude = f64::NAN;
        let err = bad.validate().unwrap_err();
        assert_eq!(err.id, 1);
    }

    #[test]
    fn snapshot_lookup() {
        let snapshot = Snapshot {
            crises: vec![syria()],
            charities: Vec::new(),
        };
        assert!(snapshot.crisis(1).is_some());
        assert!(snapshot.crisis(99).is_none());
        assert!(!snapshot.is_empty());
    }
}
