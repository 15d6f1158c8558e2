//! Build covers from a validated `covertrack_config::Config`.

use std::sync::Arc;

use covertrack_config::Config;
use covertrack_traits::TransmitterRegistry;
use covertrack_traits::clock::{Clock, MonotonicClock};

use crate::config::{FeatureSet, TravelCfg};
use crate::cover::Cover;

/// Build every configured cover on the real clock.
///
/// Covers whose transmitter is not in `registry` are logged and skipped;
/// the returned list is in slug order.
pub fn setup_covers(cfg: &Config, registry: &dyn TransmitterRegistry) -> Vec<Cover> {
    setup_covers_with_clock(cfg, registry, Arc::new(MonotonicClock::new()))
}

pub fn setup_covers_with_clock(
    cfg: &Config,
    registry: &dyn TransmitterRegistry,
    clock: Arc<dyn Clock + Send + Sync>,
) -> Vec<Cover> {
    let mut covers = Vec::with_capacity(cfg.covers.len());
    for (slug, c) in &cfg.covers {
        let Some(transmitter) = registry.get(&c.transmitter_serial_number) else {
            tracing::error!(
                cover = %slug,
                serial = %c.transmitter_serial_number,
                "transmitter not found; cover skipped"
            );
            continue;
        };
        let built = Cover::builder()
            .slug(slug.clone())
            .name(c.name.clone())
            .device_class(c.device_class)
            .features(FeatureSet::from(c.supported_features.as_slice()))
            .travel(TravelCfg::from(c))
            .clock(clock.clone())
            .transmitter(transmitter)
            .channel(c.channel)
            .build();
        match built {
            Ok(cover) => covers.push(cover),
            Err(e) => tracing::error!(cover = %slug, error = %e, "cover skipped"),
        }
    }
    covers
}
