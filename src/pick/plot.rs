use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One masterplan plot: a named development parcel grouping building ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlotInfo {
    /// Building ids belonging to the plot.
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ai_tags: Vec<String>,
}

/// The semantic plot map, keyed by plot name.
///
/// Ordered so index rebuilds are deterministic regardless of source JSON
/// key order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Masterplan(pub BTreeMap<String, PlotInfo>);

impl Masterplan {
    /// Looks up a plot by key.
    #[must_use]
    pub fn plot(&self, key: &str) -> Option<&PlotInfo> {
        self.0.get(key)
    }
}

/// Reverse index from building id to owning plot key.
///
/// When an id appears under several plots the last plot in ascending key
/// order wins, so rebuilding from the same masterplan always yields the
/// same mapping.
#[derive(Debug, Clone, Default)]
pub struct PlotIndex {
    by_id: HashMap<String, String>,
}

impl PlotIndex {
    /// Builds the reverse index from a masterplan.
    #[must_use]
    pub fn build(masterplan: &Masterplan) -> Self {
        let mut by_id = HashMap::new();
        for (key, plot) in &masterplan.0 {
            for id in &plot.ids {
                by_id.insert(id.clone(), key.clone());
            }
        }
        Self { by_id }
    }

    /// The plot key owning a building id, if any.
    #[must_use]
    pub fn plot_key(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }
}
