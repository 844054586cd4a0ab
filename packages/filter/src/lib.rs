#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crisis filter engine and charity index.
//!
//! [`filter_crises`] turns the full crisis snapshot plus a [`FilterState`]
//! into the ordered subset shown by the list and fed to the map. It is a
//! pure, stable filter: the output is always a subsequence of the input in
//! its original order. Presentation ordering ([`sort_by_priority`]) is a
//! separate, opt-in step.

pub mod charities;

use std::borrow::Borrow;
use std::cmp::Reverse;

use crisis_map_crisis_models::{Category, Crisis, Severity};
use serde::{Deserialize, Serialize};

pub use charities::{CharityIndex, charities_for_crisis};

/// Current search / category / severity selection.
///
/// The default value (empty search, no category, no severity) applies no
/// filtering at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterState {
    /// Case-insensitive substring matched against title, summary, country
    /// and description. Ignored when empty.
    #[serde(default)]
    pub search: String,
    /// Exact category match, if set.
    pub category: Option<Category>,
    /// Exact severity match, if set.
    pub severity: Option<Severity>,
}

type Predicate<'a> = Box<dyn Fn(&Crisis) -> bool + 'a>;

impl FilterState {
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    #[must_use]
    pub const fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub const fn with_severity(mut self, severity: Option<Severity>) -> Self {
        self.severity = severity;
        self
    }

    /// Whether no predicate is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.category.is_none() && self.severity.is_none()
    }

    /// Resets every predicate.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Builds the list of active predicates. An empty list matches
    /// everything.
    fn predicates(&self) -> Vec<Predicate<'_>> {
        let mut predicates: Vec<Predicate<'_>> = Vec::with_capacity(3);

        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            predicates.push(Box::new(move |crisis: &Crisis| {
                [
                    &crisis.title,
                    &crisis.summary,
                    &crisis.country,
                    &crisis.description,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            }));
        }

        if let Some(category) = self.category {
            predicates.push(Box::new(move |crisis: &Crisis| crisis.category == category));
        }

        if let Some(severity) = self.severity {
            predicates.push(Box::new(move |crisis: &Crisis| crisis.severity == severity));
        }

        predicates
    }

    /// Whether a single crisis satisfies every active predicate.
    #[must_use]
    pub fn matches(&self, crisis: &Crisis) -> bool {
        self.predicates().iter().all(|p| p(crisis))
    }
}

/// Returns the crises matching `filters`, in input order.
#[must_use]
pub fn filter_crises<'a>(crises: &'a [Crisis], filters: &FilterState) -> Vec<&'a Crisis> {
    let predicates = filters.predicates();
    let matched: Vec<&Crisis> = crises
        .iter()
        .filter(|&crisis| predicates.iter().all(|p| p(crisis)))
        .collect();

    log::trace!(
        "Filter {filters:?} matched {}/{} crises",
        matched.len(),
        crises.len()
    );

    matched
}

/// Same as [`filter_crises`] but returns positions into `crises`.
#[must_use]
pub fn filter_indices(crises: &[Crisis], filters: &FilterState) -> Vec<usize> {
    let predicates = filters.predicates();
    crises
        .iter()
        .enumerate()
        .filter(|&(_, crisis)| predicates.iter().all(|p| p(crisis)))
        .map(|(i, _)| i)
        .collect()
}

/// Same as [`filter_crises`] but clones the matches.
#[must_use]
pub fn filter_crises_owned(crises: &[Crisis], filters: &FilterState) -> Vec<Crisis> {
    filter_crises(crises, filters).into_iter().cloned().collect()
}

/// Orders crises most severe first, then most recent first.
///
/// The sort is stable, so crises equal on both keys keep their relative
/// order.
pub fn sort_by_priority<T: Borrow<Crisis>>(crises: &mut [T]) {
    crises.sort_by_key(|c| {
        let c = c.borrow();
        (Reverse(c.severity), Reverse(c.start_date))
    });
}
