//! Sample data set embedded at compile time.

use async_trait::async_trait;
use crisis_map_crisis_models::{Charity, Crisis};

use crate::{CrisisSource, SourceError, parse_collection};

const CRISES_JSON: &str = include_str!("../fixtures/crises.json");
const CHARITIES_JSON: &str = include_str!("../fixtures/charities.json");

/// [`CrisisSource`] serving the embedded sample crises and charities.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureSource;

impl FixtureSource {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CrisisSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn fetch_crises(&self) -> Result<Vec<Crisis>, SourceError> {
        parse_collection(serde_json::from_str(CRISES_JSON)?, "crises")
    }

    async fn fetch_charities(&self) -> Result<Vec<Charity>, SourceError> {
        parse_collection(serde_json::from_str(CHARITIES_JSON)?, "charities")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::load_snapshot;

    #[tokio::test]
    async fn fixture_loads_cleanly() {
        let outcome = load_snapshot(&FixtureSource::new()).await;
        assert!(outcome.is_ok(), "{:?}", outcome.error);
        assert_eq!(outcome.snapshot.crises.len(), 15);
        assert_eq!(outcome.snapshot.charities.len(), 22);
    }

    #[tokio::test]
    async fn fixture_ids_are_unique() {
        let crises = FixtureSource.fetch_crises().await.unwrap();
        let ids: BTreeSet<i64> = crises.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), crises.len());
    }

    #[tokio::test]
    async fn every_fixture_charity_references_a_crisis() {
        let crises = FixtureSource.fetch_crises().await.unwrap();
        let charities = FixtureSource.fetch_charities().await.unwrap();
        for charity in &charities {
            assert!(
                crises.iter().any(|c| c.id == charity.crisis_id),
                "charity {} references missing crisis {}",
                charity.id,
                charity.crisis_id
            );
        }
    }
}
