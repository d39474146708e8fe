//! Dynamics: a named set of timing properties
//!
//! A `Dynamics` is the fingerprint of one typing sample (a session or an
//! aggregate). Properties are keyed by canonical name, computed once when the
//! property is inserted. The map is ordered by name so every reduction over it
//! visits properties in the same order.

use crate::error::KeyizeError;
use crate::property::DynamicsProperty;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which side's properties are considered when counting shared properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedPropertiesMethod {
    /// Union of both sides
    Both,
    /// Properties of the receiver only
    Left,
    /// Properties of the argument only
    Right,
}

impl SharedPropertiesMethod {
    /// Method that yields the same counts with the operands swapped
    pub fn mirrored(self) -> Self {
        match self {
            SharedPropertiesMethod::Both => SharedPropertiesMethod::Both,
            SharedPropertiesMethod::Left => SharedPropertiesMethod::Right,
            SharedPropertiesMethod::Right => SharedPropertiesMethod::Left,
        }
    }
}

/// Group of dynamics properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct Dynamics {
    properties: BTreeMap<String, DynamicsProperty>,
}

impl Dynamics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the properties, keyed by canonical name
    pub fn properties(&self) -> &BTreeMap<String, DynamicsProperty> {
        &self.properties
    }

    /// Insert a property, replacing any property with the same name.
    pub fn add_property(&mut self, property: DynamicsProperty) {
        self.properties.insert(property.name(), property);
    }

    /// Parse `name`, set its value and insert it.
    pub fn add_property_by_name(&mut self, name: &str, value: f64) -> Result<(), KeyizeError> {
        let mut property = DynamicsProperty::from_name(name)?;
        property.value = value;
        // The validated name is already canonical
        self.properties.insert(name.to_string(), property);
        Ok(())
    }

    /// Remove the property with the same name as `property`, if present.
    pub fn remove_property(&mut self, property: &DynamicsProperty) {
        self.properties.remove(&property.name());
    }

    pub fn get(&self, name: &str) -> Option<&DynamicsProperty> {
        self.properties.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Count shared properties and the total considered under `method`.
    ///
    /// Returns `(shared, total)`.
    pub fn shared_properties(
        &self,
        other: &Dynamics,
        method: SharedPropertiesMethod,
    ) -> (usize, usize) {
        match method {
            SharedPropertiesMethod::Left => count_present(self, other),
            SharedPropertiesMethod::Right => count_present(other, self),
            SharedPropertiesMethod::Both => {
                let (shared, own) = count_present(self, other);
                // Everything of `other` not matched above is unshared
                let total = own + (other.len() - shared);
                (shared, total)
            }
        }
    }

    /// Proportion of shared properties under `method`.
    ///
    /// NaN when no properties are considered (both sides empty, or the
    /// considered side is empty).
    pub fn proportion_shared_properties(
        &self,
        other: &Dynamics,
        method: SharedPropertiesMethod,
    ) -> f64 {
        let (shared, total) = self.shared_properties(other, method);
        if total == 0 {
            return f64::NAN;
        }
        shared as f64 / total as f64
    }
}

/// `(shared, total)` where total is the size of `from` and shared counts the
/// names of `from` also present in `against`.
fn count_present(from: &Dynamics, against: &Dynamics) -> (usize, usize) {
    let shared = from.names().filter(|name| against.contains(name)).count();
    (shared, from.len())
}

impl From<Dynamics> for BTreeMap<String, f64> {
    fn from(dynamics: Dynamics) -> Self {
        dynamics
            .properties
            .into_iter()
            .map(|(name, property)| (name, property.value))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, f64>> for Dynamics {
    type Error = KeyizeError;

    fn try_from(values: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut dynamics = Dynamics::new();
        for (name, value) in values {
            dynamics.add_property_by_name(&name, value)?;
        }
        Ok(dynamics)
    }
}

impl FromIterator<DynamicsProperty> for Dynamics {
    fn from_iter<I: IntoIterator<Item = DynamicsProperty>>(iter: I) -> Self {
        let mut dynamics = Dynamics::new();
        for property in iter {
            dynamics.add_property(property);
        }
        dynamics
    }
}

impl Extend<DynamicsProperty> for Dynamics {
    fn extend<I: IntoIterator<Item = DynamicsProperty>>(&mut self, iter: I) {
        for property in iter {
            self.add_property(property);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyKind;

    fn shared_fixture() -> (Dynamics, Dynamics) {
        let mut dyn_a = Dynamics::new();
        dyn_a.add_property(DynamicsProperty::down_down('a', 'b', 4.55));
        dyn_a.add_property(DynamicsProperty::up_down('b', 'd', 8.88));

        let mut dyn_b = Dynamics::new();
        dyn_b.add_property(DynamicsProperty::down_down('a', 'b', 6.77));
        dyn_b.add_property(DynamicsProperty::up_down('b', 'c', 3.33));
        dyn_b.add_property(DynamicsProperty::up_down('c', 'd', 7.33));

        (dyn_a, dyn_b)
    }

    #[test]
    fn test_add_property_by_name() {
        let mut d = Dynamics::new();
        d.add_property_by_name("D.H", 5.0).unwrap();
        d.add_property_by_name("DD.j.W", 4.0).unwrap();
        d.add_property_by_name("UD.o.E", 3.0).unwrap();

        let props = d.properties();
        assert_eq!(props["D.H"].value, 5.0);
        assert_eq!(props["DD.j.W"].value, 4.0);
        assert_eq!(props["UD.o.E"].value, 3.0);

        assert_eq!(props["D.H"].key_a(), 'H');
        assert_eq!(props["DD.j.W"].key_a(), 'j');
        assert_eq!(props["DD.j.W"].key_b(), Some('W'));
        assert_eq!(props["UD.o.E"].kind(), PropertyKind::UpDown);
        assert_eq!(props["UD.o.E"].key_b(), Some('E'));
    }

    #[test]
    fn test_add_property_by_name_rejects_malformed() {
        let mut d = Dynamics::new();
        assert!(d.add_property_by_name("H.a", 1.0).is_err());
        assert!(d.add_property_by_name("DD.Shift.a", 1.0).is_err());
        assert!(d.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let mut d = Dynamics::new();
        d.add_property(DynamicsProperty::dwell('a', 1.0));
        d.add_property_by_name("D.a", 2.0).unwrap();

        assert_eq!(d.len(), 1);
        assert_eq!(d.get("D.a").unwrap().value, 2.0);
    }

    #[test]
    fn test_remove_property() {
        let mut d = Dynamics::new();
        d.add_property(DynamicsProperty::dwell('a', 1.0));
        d.add_property(DynamicsProperty::up_down('a', 'b', 3.0));

        // Value does not matter, only the name
        d.remove_property(&DynamicsProperty::dwell('a', 99.0));
        assert!(!d.contains("D.a"));
        assert!(d.contains("UD.a.b"));

        // Absent property is a no-op
        d.remove_property(&DynamicsProperty::dwell('z', 0.0));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_proportion_shared_properties() {
        let (dyn_a, dyn_b) = shared_fixture();

        for method in [
            SharedPropertiesMethod::Both,
            SharedPropertiesMethod::Left,
            SharedPropertiesMethod::Right,
        ] {
            let forward = dyn_a.proportion_shared_properties(&dyn_b, method);
            let backward = dyn_b.proportion_shared_properties(&dyn_a, method.mirrored());
            assert_eq!(forward, backward, "{method:?} is not mirrored");
        }

        assert_eq!(
            dyn_a.proportion_shared_properties(&dyn_b, SharedPropertiesMethod::Both),
            0.25
        );
        let right = dyn_a.proportion_shared_properties(&dyn_b, SharedPropertiesMethod::Right);
        assert!((right - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(
            dyn_a.proportion_shared_properties(&dyn_b, SharedPropertiesMethod::Left),
            0.5
        );
    }

    #[test]
    fn test_shared_properties_counts() {
        let (dyn_a, dyn_b) = shared_fixture();

        assert_eq!(dyn_a.shared_properties(&dyn_b, SharedPropertiesMethod::Both), (1, 4));
        assert_eq!(dyn_a.shared_properties(&dyn_b, SharedPropertiesMethod::Left), (1, 2));
        assert_eq!(dyn_a.shared_properties(&dyn_b, SharedPropertiesMethod::Right), (1, 3));
    }

    #[test]
    fn test_proportion_shared_properties_empty_is_nan() {
        let empty = Dynamics::new();
        let (dyn_a, _) = shared_fixture();

        assert!(empty
            .proportion_shared_properties(&empty, SharedPropertiesMethod::Both)
            .is_nan());
        assert!(empty
            .proportion_shared_properties(&dyn_a, SharedPropertiesMethod::Left)
            .is_nan());
        assert_eq!(
            empty.proportion_shared_properties(&dyn_a, SharedPropertiesMethod::Both),
            0.0
        );
    }

    #[test]
    fn test_json_round_trip_as_name_map() {
        let (dyn_a, _) = shared_fixture();

        let json = serde_json::to_string(&dyn_a).unwrap();
        assert_eq!(json, r#"{"DD.a.b":4.55,"UD.b.d":8.88}"#);

        let parsed: Dynamics = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, dyn_a);
    }

    #[test]
    fn test_json_rejects_malformed_names() {
        let result: Result<Dynamics, _> = serde_json::from_str(r#"{"H.a": 1.0}"#);
        assert!(result.is_err());
    }
}
