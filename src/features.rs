//! Feature extraction: Recording → Dynamics
//!
//! One left-to-right scan over the events collects timing samples:
//!
//! - key down after a key down: a `DownDown` sample (digraph latency)
//! - key down after a key up: an `UpDown` sample (flight time)
//! - key up of a key that is still held: a `Dwell` sample
//!
//! Samples for the same property are averaged once the scan is complete.

use crate::dynamics::Dynamics;
use crate::property::{DynamicsProperty, PropertyKey};
use crate::recording::{RawEventKind, Recording};
use std::collections::{BTreeMap, HashMap};

/// Subject and time of the latest event of one kind
#[derive(Debug, Clone, Copy)]
struct LastEvent {
    subject: char,
    at: u64,
}

/// Timing samples collected during a scan, grouped by property
#[derive(Debug, Default)]
struct SampleSet {
    samples: BTreeMap<PropertyKey, Vec<f64>>,
}

impl SampleSet {
    fn add(&mut self, key: PropertyKey, from: u64, to: u64) {
        // Out-of-order timestamps clamp to zero instead of wrapping
        let duration = to.saturating_sub(from) as f64;
        self.samples.entry(key).or_default().push(duration);
    }

    fn sample_count(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    /// Mean of every property's samples
    fn reduce(self) -> Dynamics {
        self.samples
            .into_iter()
            .map(|(key, values)| {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                DynamicsProperty::new(key, mean)
            })
            .collect()
    }
}

/// Feature extractor for keystroke recordings
pub struct DynamicsExtractor;

impl DynamicsExtractor {
    /// Derive the dynamics of a recording.
    ///
    /// Each key down pairs with at most one key up of the same subject.
    pub fn extract(recording: &Recording) -> Dynamics {
        let mut samples = SampleSet::default();
        let mut last_down: Option<LastEvent> = None;
        let mut last_up: Option<LastEvent> = None;
        // Most recent key down per subject that has not been released yet
        let mut pending_down: HashMap<char, u64> = HashMap::new();

        for event in recording.events() {
            let (subject, at) = (event.subject, event.at);

            match event.kind {
                RawEventKind::KeyDown => {
                    if let Some(prev) = last_down {
                        samples.add(PropertyKey::DownDown(prev.subject, subject), prev.at, at);
                    }
                    if let Some(prev) = last_up {
                        samples.add(PropertyKey::UpDown(prev.subject, subject), prev.at, at);
                    }
                    last_down = Some(LastEvent { subject, at });
                    pending_down.insert(subject, at);
                }
                RawEventKind::KeyUp => {
                    if let Some(down_at) = pending_down.remove(&subject) {
                        samples.add(PropertyKey::Dwell(subject), down_at, at);
                    } else {
                        tracing::trace!(?subject, at, "key up without a pending key down");
                    }
                    last_up = Some(LastEvent { subject, at });
                }
            }
        }

        let sample_count = samples.sample_count();
        let dynamics = samples.reduce();

        tracing::debug!(
            events = recording.len(),
            samples = sample_count,
            properties = dynamics.len(),
            "extracted dynamics from recording"
        );

        dynamics
    }
}

impl Recording {
    /// Derive the dynamics (timing fingerprint) of this recording
    pub fn dynamics(&self) -> Dynamics {
        DynamicsExtractor::extract(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingEvent;

    fn value(dynamics: &Dynamics, name: &str) -> f64 {
        dynamics
            .get(name)
            .unwrap_or_else(|| panic!("missing {name}"))
            .value
    }

    #[test]
    fn test_basic_extraction() {
        let rec = Recording::from_events(vec![
            RecordingEvent::key_down('a', 0),
            RecordingEvent::key_up('a', 100),
            RecordingEvent::key_down('b', 150),
            RecordingEvent::key_up('b', 200),
        ]);

        let dynamics = rec.dynamics();

        assert_eq!(dynamics.len(), 4);
        assert_eq!(value(&dynamics, "D.a"), 100.0);
        assert_eq!(value(&dynamics, "D.b"), 50.0);
        assert_eq!(value(&dynamics, "DD.a.b"), 150.0);
        assert_eq!(value(&dynamics, "UD.a.b"), 50.0);
    }

    #[test]
    fn test_empty_recording() {
        assert!(Recording::new().dynamics().is_empty());
    }

    #[test]
    fn test_key_downs_only_have_no_dwell() {
        let rec = Recording::from_events(vec![
            RecordingEvent::key_down('a', 0),
            RecordingEvent::key_down('b', 120),
            RecordingEvent::key_down('c', 300),
        ]);

        let dynamics = rec.dynamics();

        assert_eq!(dynamics.len(), 2);
        assert_eq!(value(&dynamics, "DD.a.b"), 120.0);
        assert_eq!(value(&dynamics, "DD.b.c"), 180.0);
    }

    #[test]
    fn test_unmatched_key_up_is_skipped() {
        let rec = Recording::from_events(vec![
            RecordingEvent::key_up('x', 10),
            RecordingEvent::key_down('a', 30),
        ]);

        let dynamics = rec.dynamics();

        assert!(!dynamics.contains("D.x"));
        assert_eq!(value(&dynamics, "UD.x.a"), 20.0);
    }

    #[test]
    fn test_overlapping_keys() {
        // Shift held while typing 'A'
        let rec = Recording::from_events(vec![
            RecordingEvent::key_down('\u{f}', 0),
            RecordingEvent::key_down('A', 80),
            RecordingEvent::key_up('A', 150),
            RecordingEvent::key_up('\u{f}', 200),
        ]);

        let dynamics = rec.dynamics();

        assert_eq!(value(&dynamics, "D.\u{f}"), 200.0);
        assert_eq!(value(&dynamics, "D.A"), 70.0);
        assert_eq!(value(&dynamics, "DD.\u{f}.A"), 80.0);
        assert_eq!(dynamics.len(), 3);
    }

    #[test]
    fn test_repeated_digraph_is_averaged() {
        let rec = Recording::from_events(vec![
            RecordingEvent::key_down('a', 0),
            RecordingEvent::key_up('a', 90),
            RecordingEvent::key_down('b', 100),
            RecordingEvent::key_up('b', 170),
            RecordingEvent::key_down('a', 400),
            RecordingEvent::key_up('a', 510),
            RecordingEvent::key_down('b', 600),
            RecordingEvent::key_up('b', 650),
        ]);

        let dynamics = rec.dynamics();

        assert_eq!(value(&dynamics, "D.a"), 100.0);
        assert_eq!(value(&dynamics, "D.b"), 60.0);
        assert_eq!(value(&dynamics, "DD.a.b"), 150.0);
        assert_eq!(value(&dynamics, "UD.a.b"), 50.0);
        assert_eq!(value(&dynamics, "DD.b.a"), 300.0);
        assert_eq!(value(&dynamics, "UD.b.a"), 230.0);
    }

    #[test]
    fn test_dwell_uses_nearest_key_down() {
        // Auto-repeat: the second key down is the one released
        let rec = Recording::from_events(vec![
            RecordingEvent::key_down('a', 0),
            RecordingEvent::key_down('a', 500),
            RecordingEvent::key_up('a', 540),
        ]);

        assert_eq!(value(&rec.dynamics(), "D.a"), 40.0);
    }

    #[test]
    fn test_key_down_is_consumed_by_its_key_up() {
        let rec = Recording::from_events(vec![
            RecordingEvent::key_down('a', 0),
            RecordingEvent::key_up('a', 100),
            RecordingEvent::key_up('a', 300),
        ]);

        // The second release has no pending press left
        assert_eq!(value(&rec.dynamics(), "D.a"), 100.0);
    }

    #[test]
    fn test_out_of_order_timestamps_clamp_to_zero() {
        let rec = Recording::from_events(vec![
            RecordingEvent::key_down('a', 100),
            RecordingEvent::key_down('b', 40),
        ]);

        assert_eq!(value(&rec.dynamics(), "DD.a.b"), 0.0);
    }
}
