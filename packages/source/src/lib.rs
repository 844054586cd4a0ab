#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crisis and charity data sources.
//!
//! Each provider implements the [`CrisisSource`] trait. The full crisis and
//! charity collections are fetched once per session; [`load_snapshot`]
//! never fails, it converts any fetch error into an empty snapshot plus an
//! error message so callers are never stuck in a loading state.

pub mod api;
pub mod config;
pub mod fixture;

use async_trait::async_trait;
use crisis_map_crisis_models::{Charity, Crisis, Snapshot};
use serde::de::DeserializeOwned;

pub use api::ApiSource;
pub use config::{SourceConfig, SourceKind};
pub use fixture::FixtureSource;

/// Errors that can occur while loading data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The body was neither an array nor an envelope holding one.
    #[error("Expected a JSON array or an object with a `{field}` array")]
    Envelope {
        /// Envelope field that was looked up.
        field: String,
    },

    /// I/O error (config file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML config parsing failed.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid configuration value.
    #[error("Config error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// A provider of the crisis and charity collections.
#[async_trait]
pub trait CrisisSource: Send + Sync {
    /// Short identifier used in log messages.
    fn name(&self) -> &str;

    /// Fetches every crisis.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the data cannot be fetched or parsed.
    async fn fetch_crises(&self) -> Result<Vec<Crisis>, SourceError>;

    /// Fetches every charity.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the data cannot be fetched or parsed.
    async fn fetch_charities(&self) -> Result<Vec<Charity>, SourceError>;
}

/// Result of [`load_snapshot`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    /// Loaded data. Empty when `error` is set.
    pub snapshot: Snapshot,
    /// Why the load failed, if it did.
    pub error: Option<String>,
}

impl LoadOutcome {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Fetches both collections from `source`.
///
/// Crises with out-of-range coordinates are dropped with a warning. Any
/// fetch failure yields an empty snapshot and the error message.
pub async fn load_snapshot(source: &dyn CrisisSource) -> LoadOutcome {
    log::info!("Loading crises and charities from {} source...", source.name());

    let (crises, charities) =
        futures::future::join(source.fetch_crises(), source.fetch_charities()).await;

    match (crises, charities) {
        (Ok(crises), Ok(charities)) => {
            let total = crises.len();
            let crises: Vec<Crisis> = crises
                .into_iter()
                .filter(|crisis| match crisis.validate() {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("Dropping record: {e}");
                        false
                    }
                })
                .collect();

            log::info!(
                "Loaded {}/{total} crises and {} charities from {}",
                crises.len(),
                charities.len(),
                source.name()
            );

            LoadOutcome {
                snapshot: Snapshot { crises, charities },
                error: None,
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            log::error!("Failed to load from {} source: {e}", source.name());
            LoadOutcome {
                snapshot: Snapshot::default(),
                error: Some(e.to_string()),
            }
        }
    }
}

/// Extracts a record array from a response body.
///
/// Accepts either a bare JSON array or an object whose `field` member is
/// the array (e.g. `{"crises": [...], "total": 15}`).
///
/// # Errors
///
/// Returns [`SourceError::Envelope`] if no array is found, or
/// [`SourceError::Json`] if the records do not deserialize.
pub fn parse_collection<T: DeserializeOwned>(
    body: serde_json::Value,
    field: &str,
) -> Result<Vec<T>, SourceError> {
    let array = match body {
        serde_json::Value::Array(_) => body,
        serde_json::Value::Object(mut map) => match map.remove(field) {
            Some(inner @ serde_json::Value::Array(_)) => inner,
            _ => {
                return Err(SourceError::Envelope {
                    field: field.to_string(),
                });
            }
        },
        _ => {
            return Err(SourceError::Envelope {
                field: field.to_string(),
            });
        }
    };

    Ok(serde_json::from_value(array)?)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crisis_map_crisis_models::{Category, Severity};
    use serde_json::json;

    use super::*;

    fn crisis(id: i64, latitude: f64) -> Crisis {
        Crisis {
            id,
            title: format!("Crisis {id}"),
            category: Category::Health,
            country: "Nowhere".to_string(),
            latitude,
            longitude: 10.0,
            severity: Severity::Low,
            summary: String::new(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            is_active: true,
        }
    }

    struct StaticSource {
        crises: Vec<Crisis>,
        fail_charities: bool,
    }

    #[async_trait]
    impl CrisisSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch_crises(&self) -> Result<Vec<Crisis>, SourceError> {
            Ok(self.crises.clone())
        }

        async fn fetch_charities(&self) -> Result<Vec<Charity>, SourceError> {
            if self.fail_charities {
                Err(SourceError::Status {
                    url: "http://localhost:8000/charities/".to_string(),
                    status: 500,
                })
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[test]
    fn parses_bare_array() {
        let body = json!([{ "id": 1, "name": "A", "description": "", "donation_url": "u", "crisis_id": 3 }]);
        let charities: Vec<Charity> = parse_collection(body, "charities").unwrap();
        assert_eq!(charities.len(), 1);
        assert_eq!(charities[0].crisis_id, 3);
    }

    #[test]
    fn parses_envelope() {
        let body = json!({
            "charities": [{ "id": 1, "name": "A", "description": "", "donation_url": "u", "crisis_id": 3 }],
            "total": 1
        });
        let charities: Vec<Charity> = parse_collection(body, "charities").unwrap();
        assert_eq!(charities[0].id, 1);
    }

    #[test]
    fn rejects_missing_or_wrong_envelope() {
        let missing = parse_collection::<Charity>(json!({ "items": [] }), "charities");
        assert!(matches!(missing, Err(SourceError::Envelope { .. })));

        let not_array = parse_collection::<Charity>(json!({ "charities": 5 }), "charities");
        assert!(matches!(not_array, Err(SourceError::Envelope { .. })));

        let scalar = parse_collection::<Charity>(json!("nope"), "charities");
        assert!(matches!(scalar, Err(SourceError::Envelope { .. })));
    }

    #[test]
    fn bad_records_are_json_errors() {
        let result = parse_collection::<Charity>(json!([{ "id": "x" }]), "charities");
        assert!(matches!(result, Err(SourceError::Json(_))));
    }

    #[tokio::test]
    async fn load_drops_invalid_coordinates() {
        let source = StaticSource {
            crises: vec![crisis(1, 10.0), crisis(2, 120.0), crisis(3, -45.0)],
            fail_charities: false,
        };
        let outcome = load_snapshot(&source).await;

        assert!(outcome.is_ok());
        let ids: Vec<i64> = outcome.snapshot.crises.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn load_failure_becomes_empty_snapshot() {
        let source = StaticSource {
            crises: vec![crisis(1, 10.0)],
            fail_charities: true,
        };
        let outcome = load_snapshot(&source).await;

        assert!(!outcome.is_ok());
        assert!(outcome.snapshot.is_empty());
        assert!(outcome.error.unwrap().contains("HTTP 500"));
    }
}
