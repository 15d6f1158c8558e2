#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Position tracking for radio covers without position feedback.
//!
//! This crate is transmitter-agnostic. All radio interaction goes through
//! `covertrack_traits::Transmitter`, and time comes from an injected
//! `covertrack_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Position**: closure-axis newtype, 0 open and 100 closed (`position` module)
//! - **Estimator**: time-based interpolation between confirmed positions (`estimator`)
//! - **Reconciler**: status code table and normalized state (`reconciler`)
//! - **Cover**: estimator + reconciler behind one lock, commands, type-state builder (`cover`)
//! - **Setup**: covers from a validated config and a transmitter registry (`setup`)
//!
//! ## Time arithmetic
//!
//! Travel times are `Duration`s and the estimate is computed in integer
//! nanoseconds, truncating toward zero. Progress is clamped so an estimate
//! never passes its target.

pub mod config;
pub mod conversions;
pub mod cover;
pub mod error;
pub mod estimator;
pub mod mocks;
pub mod position;
pub mod reconciler;
pub mod setup;
pub mod transmit_error;
pub mod util;

pub use config::{DeviceClass, Feature, FeatureSet, TravelCfg};
pub use cover::{Cover, CoverBuilder, CoverSnapshot};
pub use error::{BuildError, CoverError, Report, Result};
pub use estimator::TravelEstimator;
pub use position::{Position, TravelDirection};
pub use reconciler::{
    CoverState, NormalizedState, Reconciliation, StatusEntry, StatusOutcome, StatusReconciler,
    status_entry,
};
pub use setup::{setup_covers, setup_covers_with_clock};

pub use covertrack_traits::{Channel, Command, StatusCode};
