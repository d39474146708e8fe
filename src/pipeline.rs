//! Pipeline orchestration
//!
//! This module provides the high-level API for Keyize: from a V1 recording to a
//! fingerprint, and from two fingerprints to a comparison report that an
//! accept/reject or ranking layer can consume.

use crate::aggregate::avg_dynamics;
use crate::config::{ComparisonConfig, ImportConfig};
use crate::dynamics::{Dynamics, SharedPropertiesMethod};
use crate::error::KeyizeError;
use crate::recording::{ImportStrictness, Recording};
use serde::{Deserialize, Serialize};

/// Import a V1 recording and derive its dynamics (stateless, one-shot).
///
/// # Example
/// ```
/// use keyize::{extract_v1, ImportStrictness};
///
/// let dynamics = extract_v1("da0ua100db150ub200", ImportStrictness::Strict).unwrap();
/// assert_eq!(dynamics.get("DD.a.b").unwrap().value, 150.0);
/// ```
pub fn extract_v1(input: &str, strictness: ImportStrictness) -> Result<Dynamics, KeyizeError> {
    let recording = Recording::import_v1(input, strictness)?;
    Ok(recording.dynamics())
}

/// Result of comparing a sample against a reference.
///
/// Ratios are `None` (serialized as `null`) when undefined, e.g. when the two
/// sides share nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Manhattan distance over shared properties
    pub manhattan: f64,
    /// Euclidean distance over shared properties
    pub euclidean: f64,
    /// Mean scaled difference per shared property
    pub avg_scaled_diff: Option<f64>,
    /// Number of shared properties
    pub shared: usize,
    /// Shared properties over the union of both sides
    pub confidence: Option<f64>,
    /// Shared properties over the sample's properties
    pub sample_coverage: Option<f64>,
    /// Shared properties over the reference's properties
    pub reference_coverage: Option<f64>,
    /// Bounded match score, 1 = strong match
    pub match_score: Option<f64>,
}

impl Comparison {
    /// Whether the match score reaches `threshold`; false when undefined.
    pub fn accepts(&self, threshold: f64) -> bool {
        self.match_score.is_some_and(|score| score >= threshold)
    }
}

fn defined(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

/// Compare `sample` against `reference`.
///
/// Distances use the configured scale map; the match score always uses the
/// default scales its calibration is fitted against.
pub fn compare(sample: &Dynamics, reference: &Dynamics, config: &ComparisonConfig) -> Comparison {
    let scale_map = Some(&config.scale_map);
    let (shared, _) = sample.shared_properties(reference, SharedPropertiesMethod::Both);

    Comparison {
        manhattan: sample.manhattan_dist(reference, scale_map),
        euclidean: sample.euclidean_dist(reference, scale_map),
        avg_scaled_diff: defined(sample.avg_scaled_prop_diff(reference, scale_map)),
        shared,
        confidence: defined(
            sample.proportion_shared_properties(reference, SharedPropertiesMethod::Both),
        ),
        sample_coverage: defined(
            sample.proportion_shared_properties(reference, SharedPropertiesMethod::Left),
        ),
        reference_coverage: defined(
            sample.proportion_shared_properties(reference, SharedPropertiesMethod::Right),
        ),
        match_score: defined(sample.proportion_match(reference, &config.calibration)),
    }
}

/// Enrolled typing sessions of one person.
///
/// Sessions are averaged into a reference fingerprint that new samples are
/// verified against.
#[derive(Debug, Clone)]
pub struct TypistProfile {
    sessions: Vec<Dynamics>,
    comparison: ComparisonConfig,
    import: ImportConfig,
}

impl TypistProfile {
    /// Create an empty profile
    pub fn new(comparison: ComparisonConfig, import: ImportConfig) -> Self {
        Self {
            sessions: Vec::new(),
            comparison,
            import,
        }
    }

    /// Enroll a session's dynamics
    pub fn enroll(&mut self, session: Dynamics) {
        tracing::debug!(
            properties = session.len(),
            sessions = self.sessions.len() + 1,
            "enrolled session"
        );
        self.sessions.push(session);
    }

    /// Import a V1 recording and enroll its dynamics
    pub fn enroll_v1(&mut self, input: &str) -> Result<(), KeyizeError> {
        let session = extract_v1(input, self.import.strictness)?;
        self.enroll(session);
        Ok(())
    }

    /// Average of all enrolled sessions
    pub fn reference(&self) -> Dynamics {
        avg_dynamics(&self.sessions)
    }

    /// Compare a sample against the reference fingerprint
    pub fn verify(&self, sample: &Dynamics) -> Comparison {
        compare(sample, &self.reference(), &self.comparison)
    }

    /// Import a V1 recording and compare it against the reference fingerprint
    pub fn verify_v1(&self, input: &str) -> Result<Comparison, KeyizeError> {
        let sample = extract_v1(input, self.import.strictness)?;
        Ok(self.verify(&sample))
    }

    pub fn sessions(&self) -> &[Dynamics] {
        &self.sessions
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop all enrolled sessions
    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
