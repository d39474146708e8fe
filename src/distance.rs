//! Distance and match computation between two `Dynamics`
//!
//! Only properties present on both sides are compared; a property missing on
//! either side contributes nothing. Before comparing, each value is multiplied
//! by the scale factor of its kind so that kinds with very different magnitudes
//! (dwell vs. digraph latencies) weigh in comparably.

use crate::dynamics::Dynamics;
use crate::error::KeyizeError;
use crate::property::PropertyKind;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Scale for dwell times in the research-optimized map
pub const DEFAULT_DWELL_SCALE: f64 = 1.0;

/// Scale for down-down latencies in the research-optimized map
pub const DEFAULT_DOWN_DOWN_SCALE: f64 = 1.0 / 19.4;

/// Scale for up-down (flight) times in the research-optimized map
pub const DEFAULT_UP_DOWN_SCALE: f64 = 1.0 / 14.0;

/// Typical average scaled difference between two samples of the same typist
pub const DEFAULT_SAME_TYPIST_DIFF: f64 = 4.0;

/// Typical average scaled difference between samples of different typists
pub const DEFAULT_OTHER_TYPIST_DIFF: f64 = 12.0;

/// Research-optimized scales, shared by every distance computation
static DEFAULT_SCALES: LazyLock<KindScaleMap> = LazyLock::new(KindScaleMap::default);

/// Map of property kind to scale factor.
///
/// A map passed to a distance method may be partial; kinds it lacks are
/// looked up in the default (research-optimized) map. Deserialization
/// rejects non-positive or non-finite scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<PropertyKind, f64>",
    into = "BTreeMap<PropertyKind, f64>"
)]
pub struct KindScaleMap {
    scales: BTreeMap<PropertyKind, f64>,
}

impl Default for KindScaleMap {
    fn default() -> Self {
        Self {
            scales: BTreeMap::from([
                (PropertyKind::Dwell, DEFAULT_DWELL_SCALE),
                (PropertyKind::DownDown, DEFAULT_DOWN_DOWN_SCALE),
                (PropertyKind::UpDown, DEFAULT_UP_DOWN_SCALE),
            ]),
        }
    }
}

impl KindScaleMap {
    /// Map with no entries; every lookup falls back to the default map.
    pub fn empty() -> Self {
        Self {
            scales: BTreeMap::new(),
        }
    }

    /// Set the scale for `kind`.
    pub fn with_scale(mut self, kind: PropertyKind, scale: f64) -> Result<Self, KeyizeError> {
        check_scale(kind, scale)?;
        self.scales.insert(kind, scale);
        Ok(self)
    }

    pub fn get(&self, kind: PropertyKind) -> Option<f64> {
        self.scales.get(&kind).copied()
    }

    /// Check every entry is positive and finite
    pub fn validate(&self) -> Result<(), KeyizeError> {
        self.scales
            .iter()
            .try_for_each(|(&kind, &scale)| check_scale(kind, scale))
    }

    /// Scale for `kind` from this map, else from `fallback`.
    ///
    /// # Panics
    /// If neither map has an entry for `kind`. That is a configuration defect;
    /// continuing would produce meaningless scaled values.
    pub fn resolve(&self, kind: PropertyKind, fallback: &KindScaleMap) -> f64 {
        match self.get(kind).or_else(|| fallback.get(kind)) {
            Some(scale) => scale,
            None => panic!("no scale configured for property kind {kind}"),
        }
    }
}

impl From<KindScaleMap> for BTreeMap<PropertyKind, f64> {
    fn from(map: KindScaleMap) -> Self {
        map.scales
    }
}

impl TryFrom<BTreeMap<PropertyKind, f64>> for KindScaleMap {
    type Error = KeyizeError;

    fn try_from(scales: BTreeMap<PropertyKind, f64>) -> Result<Self, Self::Error> {
        let map = Self { scales };
        map.validate()?;
        Ok(map)
    }
}

fn check_scale(kind: PropertyKind, scale: f64) -> Result<(), KeyizeError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(KeyizeError::InvalidScale { kind, scale })
    }
}

/// Calibration that maps an average scaled difference onto a 0-1 match score.
///
/// Both points are empirical fits and should be tuned to the population at hand.
/// `same < other` holds for every value, including deserialized ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchCalibration {
    same: f64,
    other: f64,
}

impl Default for MatchCalibration {
    fn default() -> Self {
        Self {
            same: DEFAULT_SAME_TYPIST_DIFF,
            other: DEFAULT_OTHER_TYPIST_DIFF,
        }
    }
}

impl MatchCalibration {
    pub fn new(same: f64, other: f64) -> Result<Self, KeyizeError> {
        let calibration = Self { same, other };
        calibration.validate()?;
        Ok(calibration)
    }

    /// Difference at or below which samples count as a certain match
    pub fn same(&self) -> f64 {
        self.same
    }

    /// Difference at or above which samples count as a certain non-match
    pub fn other(&self) -> f64 {
        self.other
    }

    pub fn validate(&self) -> Result<(), KeyizeError> {
        if self.same.is_finite() && self.other.is_finite() && self.same < self.other {
            Ok(())
        } else {
            Err(KeyizeError::InvalidCalibration {
                same: self.same,
                other: self.other,
            })
        }
    }

    /// Linear map: 1 at or below `same`, 0 at or above `other`.
    pub fn score(&self, avg_diff: f64) -> f64 {
        if avg_diff.is_nan() {
            return f64::NAN;
        }
        1.0 - ((avg_diff - self.same) / (self.other - self.same)).clamp(0.0, 1.0)
    }
}

impl<'de> Deserialize<'de> for MatchCalibration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Points {
            same: f64,
            other: f64,
        }

        let points = Points::deserialize(deserializer)?;
        MatchCalibration::new(points.same, points.other).map_err(serde::de::Error::custom)
    }
}

/// Accumulated difference over shared properties
struct Accumulated {
    total: f64,
    shared: usize,
}

impl Dynamics {
    fn intermediate_dist(
        &self,
        other: &Dynamics,
        square: bool,
        scale_map: Option<&KindScaleMap>,
    ) -> Accumulated {
        let defaults: &KindScaleMap = &DEFAULT_SCALES;
        let overrides = scale_map.unwrap_or(defaults);

        let mut total = 0.0;
        let mut shared = 0;

        for (name, p1) in self.properties() {
            let Some(p2) = other.get(name) else {
                continue;
            };

            let scale = overrides.resolve(p1.kind(), defaults);
            let diff = p1.value * scale - p2.value * scale;

            total += if square { diff * diff } else { diff.abs() };
            shared += 1;
        }

        Accumulated { total, shared }
    }

    /// Manhattan distance over shared properties.
    ///
    /// Pass `None` for `scale_map` to use the research-optimized scales.
    pub fn manhattan_dist(&self, other: &Dynamics, scale_map: Option<&KindScaleMap>) -> f64 {
        self.intermediate_dist(other, false, scale_map).total
    }

    /// Euclidean distance over shared properties.
    ///
    /// Pass `None` for `scale_map` to use the research-optimized scales.
    pub fn euclidean_dist(&self, other: &Dynamics, scale_map: Option<&KindScaleMap>) -> f64 {
        self.intermediate_dist(other, true, scale_map).total.sqrt()
    }

    /// Manhattan distance divided by the number of shared properties.
    ///
    /// NaN when nothing is shared.
    pub fn avg_scaled_prop_diff(&self, other: &Dynamics, scale_map: Option<&KindScaleMap>) -> f64 {
        let acc = self.intermediate_dist(other, false, scale_map);
        if acc.shared == 0 {
            return f64::NAN;
        }
        acc.total / acc.shared as f64
    }

    /// Bounded match score in `[0, 1]`, 1 being a strong match.
    ///
    /// Uses the default scale map, which the calibration points are fitted
    /// against. NaN when nothing is shared.
    pub fn proportion_match(&self, other: &Dynamics, calibration: &MatchCalibration) -> f64 {
        calibration.score(self.avg_scaled_prop_diff(other, None))
    }
}
