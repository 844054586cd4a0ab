//! Crisis id → charity lookup.

use std::collections::BTreeMap;

use crisis_map_crisis_models::{Charity, CrisisId};

/// Returns every charity linked to `crisis_id`, in collection order.
///
/// Charities referencing a crisis that does not exist are simply never
/// returned.
#[must_use]
pub fn charities_for_crisis(charities: &[Charity], crisis_id: CrisisId) -> Vec<&Charity> {
    charities
        .iter()
        .filter(|charity| charity.crisis_id == crisis_id)
        .collect()
}

/// Pre-grouped charity positions, built once per snapshot.
#[derive(Debug, Clone, Default)]
pub struct CharityIndex {
    by_crisis: BTreeMap<CrisisId, Vec<usize>>,
}

impl CharityIndex {
    /// Groups `charities` by crisis id.
    ///
    /// The index stores positions, so it must be queried with the same
    /// slice it was built from.
    #[must_use]
    pub fn build(charities: &[Charity]) -> Self {
        let mut by_crisis: BTreeMap<CrisisId, Vec<usize>> = BTreeMap::new();
        for (i, charity) in charities.iter().enumerate() {
            by_crisis.entry(charity.crisis_id).or_default().push(i);
        }
        log::debug!(
            "Indexed {} charities across {} crises",
            charities.len(),
            by_crisis.len()
        );
        Self { by_crisis }
    }

    /// Charities for `crisis_id`, in collection order. Empty when none match.
    #[must_use]
    pub fn lookup<'a>(&self, charities: &'a [Charity], crisis_id: CrisisId) -> Vec<&'a Charity> {
        self.by_crisis
            .get(&crisis_id)
            .map(|positions| {
                positions
                    .iter()
                    .filter_map(|&i| charities.get(i))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of charities linked to `crisis_id`.
    #[must_use]
    pub fn count(&self, crisis_id: CrisisId) -> usize {
        self.by_crisis.get(&crisis_id).map_or(0, Vec::len)
    }
}
