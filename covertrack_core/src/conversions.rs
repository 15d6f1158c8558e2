//! `From` implementations bridging `covertrack_config` types to runtime types.

use crate::config::{Feature, FeatureSet, TravelCfg};
use crate::util::positive_secs;

// ── TravelCfg ────────────────────────────────────────────────────────────────

impl From<&covertrack_config::CoverCfg> for TravelCfg {
    /// Non-positive or non-finite seconds fall back to the defaults; the
    /// loader's `validate()` rejects them before this point.
    fn from(c: &covertrack_config::CoverCfg) -> Self {
        let d = TravelCfg::default();
        Self {
            up: positive_secs(c.travel_time_up).unwrap_or(d.up),
            down: positive_secs(c.travel_time_down).unwrap_or(d.down),
        }
    }
}

// ── FeatureSet ───────────────────────────────────────────────────────────────

impl From<&[Feature]> for FeatureSet {
    fn from(features: &[Feature]) -> Self {
        let mut set = FeatureSet::empty();
        for f in features {
            set.insert(*f);
        }
        set
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        let mut set = FeatureSet::empty();
        for f in iter {
            set.insert(f);
        }
        set
    }
}
