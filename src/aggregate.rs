//! Aggregation of many `Dynamics` into one representative average
//!
//! Each property is averaged over only the samples that contain it; a property
//! missing from a sample is not treated as zero.

use crate::dynamics::Dynamics;
use crate::property::{DynamicsProperty, PropertyKey};
use std::collections::BTreeMap;

/// Running sum of one property across samples
struct PropertySum {
    key: PropertyKey,
    total: f64,
    count: usize,
}

/// Average several dynamics into a new, independent `Dynamics`.
///
/// An empty input yields an empty `Dynamics`.
pub fn avg_dynamics<'a, I>(samples: I) -> Dynamics
where
    I: IntoIterator<Item = &'a Dynamics>,
{
    let mut sums: BTreeMap<&str, PropertySum> = BTreeMap::new();
    let mut sample_count = 0;

    for sample in samples {
        sample_count += 1;
        for (name, property) in sample.properties() {
            let sum = sums.entry(name.as_str()).or_insert(PropertySum {
                key: property.key,
                total: 0.0,
                count: 0,
            });
            debug_assert_eq!(sum.key, property.key, "name {name} maps to two keys");
            sum.total += property.value;
            sum.count += 1;
        }
    }

    let averaged: Dynamics = sums
        .into_values()
        .map(|sum| DynamicsProperty::new(sum.key, sum.total / sum.count as f64))
        .collect();

    tracing::debug!(
        samples = sample_count,
        properties = averaged.len(),
        "averaged dynamics"
    );

    averaged
}
