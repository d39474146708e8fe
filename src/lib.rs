//! Keyize - Keystroke dynamics fingerprints
//!
//! Keyize turns a raw stream of timestamped key-press/release events into a
//! compact statistical fingerprint of a person's typing rhythm, and compares
//! fingerprints to estimate whether they come from the same typist:
//! recording → feature extraction → dynamics → (aggregation) → comparison.
//!
//! ## Modules
//!
//! - **Property**: timing properties (dwell, down-down, up-down) and their canonical names
//! - **Dynamics**: name-keyed property sets and shared-property accounting
//! - **Distance**: scaled Manhattan/Euclidean distances and a bounded match score
//! - **Recording**: raw key events and the Keyize V1 text format
//! - **Features**: derivation of dynamics from a recording
//! - **Aggregate**: averaging of many dynamics into a reference fingerprint
//!
//! The library performs no I/O; everything is synchronous and deterministic.

pub mod aggregate;
pub mod config;
pub mod distance;
pub mod dynamics;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod property;
pub mod recording;

pub use aggregate::avg_dynamics;
pub use config::{ComparisonConfig, ImportConfig};
pub use distance::{KindScaleMap, MatchCalibration};
pub use dynamics::{Dynamics, SharedPropertiesMethod};
pub use error::KeyizeError;
pub use features::DynamicsExtractor;
pub use pipeline::{compare, extract_v1, Comparison, TypistProfile};
pub use property::{DynamicsProperty, PropertyKey, PropertyKind};
pub use recording::{ImportStrictness, RawEventKind, Recording, RecordingEvent};

/// Keyize version
pub const KEYIZE_VERSION: &str = env!("CARGO_PKG_VERSION");
