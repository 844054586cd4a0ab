//! Single-crisis selection.

use crisis_map_crisis_models::CrisisId;
use serde::{Deserialize, Serialize};

/// Which crisis, if any, is selected.
///
/// A selected id is not guaranteed to be present in the current filtered
/// set, or even in the snapshot; consumers resolve it and render nothing
/// when it does not resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(CrisisId),
}

impl Selection {
    #[must_use]
    pub const fn crisis_id(self) -> Option<CrisisId> {
        match self {
            Self::Unselected => None,
            Self::Selected(id) => Some(id),
        }
    }

    #[must_use]
    pub const fn is_selected(self) -> bool {
        matches!(self, Self::Selected(_))
    }

    /// Selects `id`, replacing any previous selection.
    pub fn select(&mut self, id: CrisisId) {
        *self = Self::Selected(id);
    }

    /// Clears the selection. Returns whether anything was selected.
    pub fn close(&mut self) -> bool {
        let was_selected = self.is_selected();
        *self = Self::Unselected;
        was_selected
    }
}
