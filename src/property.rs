//! Dynamics properties and their canonical names
//!
//! A property is one timing measurement: a kind, one or two subject keys and a
//! value in milliseconds. Every property has a canonical name that identifies
//! it inside a [`Dynamics`](crate::dynamics::Dynamics):
//!
//! - `D.<a>` for [`PropertyKind::Dwell`]
//! - `DD.<a>.<b>` for [`PropertyKind::DownDown`]
//! - `UD.<a>.<b>` for [`PropertyKind::UpDown`]
//!
//! Keys are exactly one Unicode scalar value. Parsing splits the kind code at
//! the first `.` and then reads the keys by position, so a `.` key stays
//! unambiguous (`D..` is the dwell of `.`, `DD.a..` the down-down from `a` to `.`).
//! Multi-character key tokens such as `Shift` are rejected.

use crate::error::{KeyizeError, NameError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of timing measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Time a single key stays down
    Dwell,
    /// Time between two consecutive key-down events
    DownDown,
    /// Time between a key-up and the next key-down
    UpDown,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 3] = [
        PropertyKind::Dwell,
        PropertyKind::DownDown,
        PropertyKind::UpDown,
    ];

    /// Code used as the first segment of a canonical name
    pub fn code(self) -> &'static str {
        match self {
            PropertyKind::Dwell => "D",
            PropertyKind::DownDown => "DD",
            PropertyKind::UpDown => "UD",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "D" => Some(PropertyKind::Dwell),
            "DD" => Some(PropertyKind::DownDown),
            "UD" => Some(PropertyKind::UpDown),
            _ => None,
        }
    }

    /// Number of subject keys a property of this kind carries
    pub fn arity(self) -> usize {
        match self {
            PropertyKind::Dwell => 1,
            PropertyKind::DownDown | PropertyKind::UpDown => 2,
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PropertyKind::Dwell => "Dwell",
            PropertyKind::DownDown => "DownDown",
            PropertyKind::UpDown => "UpDown",
        };
        f.write_str(label)
    }
}

/// Kind and subject keys of a property, i.e. everything its name encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    Dwell(char),
    DownDown(char, char),
    UpDown(char, char),
}

impl PropertyKey {
    /// Build a key from its parts, checking the number of keys against the kind.
    pub fn new(kind: PropertyKind, key_a: char, key_b: Option<char>) -> Result<Self, KeyizeError> {
        match (kind, key_b) {
            (PropertyKind::Dwell, None) => Ok(PropertyKey::Dwell(key_a)),
            (PropertyKind::DownDown, Some(b)) => Ok(PropertyKey::DownDown(key_a, b)),
            (PropertyKind::UpDown, Some(b)) => Ok(PropertyKey::UpDown(key_a, b)),
            _ => {
                let mut rendered = format!("{}.{}", kind.code(), key_a);
                if let Some(b) = key_b {
                    rendered.push('.');
                    rendered.push(b);
                }
                Err(KeyizeError::name(
                    &rendered,
                    NameError::ArityMismatch {
                        kind,
                        expected: kind.arity(),
                    },
                ))
            }
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyKey::Dwell(_) => PropertyKind::Dwell,
            PropertyKey::DownDown(..) => PropertyKind::DownDown,
            PropertyKey::UpDown(..) => PropertyKind::UpDown,
        }
    }

    pub fn key_a(&self) -> char {
        match *self {
            PropertyKey::Dwell(a) | PropertyKey::DownDown(a, _) | PropertyKey::UpDown(a, _) => a,
        }
    }

    /// Second key; `None` for dwell properties
    pub fn key_b(&self) -> Option<char> {
        match *self {
            PropertyKey::Dwell(_) => None,
            PropertyKey::DownDown(_, b) | PropertyKey::UpDown(_, b) => Some(b),
        }
    }

    /// Canonical name of the property
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Parse a canonical name.
    pub fn parse(name: &str) -> Result<Self, KeyizeError> {
        let (code, rest) = name
            .split_once('.')
            .ok_or_else(|| KeyizeError::name(name, NameError::MissingSeparator))?;

        let kind = PropertyKind::from_code(code)
            .ok_or_else(|| KeyizeError::name(name, NameError::UnknownKind(code.to_string())))?;

        let keys: Vec<char> = rest.chars().collect();

        match (kind, keys.as_slice()) {
            (PropertyKind::Dwell, [a]) => Ok(PropertyKey::Dwell(*a)),
            (PropertyKind::DownDown, [a, '.', b]) => Ok(PropertyKey::DownDown(*a, *b)),
            (PropertyKind::UpDown, [a, '.', b]) => Ok(PropertyKey::UpDown(*a, *b)),
            _ => Err(KeyizeError::name(name, classify_key_error(kind, rest, &keys))),
        }
    }
}

/// Pick the most useful explanation for a remainder that did not tokenize.
fn classify_key_error(kind: PropertyKind, rest: &str, keys: &[char]) -> NameError {
    let arity = NameError::ArityMismatch {
        kind,
        expected: kind.arity(),
    };

    match kind {
        PropertyKind::Dwell => match keys {
            [_, '.', _] => arity,
            _ => NameError::MalformedKey(rest.to_string()),
        },
        PropertyKind::DownDown | PropertyKind::UpDown => match keys {
            [_] => arity,
            [_, '.', _, '.', ..] => arity,
            [_, '.', second @ ..] => NameError::MalformedKey(second.iter().collect()),
            _ => NameError::MalformedKey(rest.split('.').next().unwrap_or(rest).to_string()),
        },
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Dwell(a) => write!(f, "D.{a}"),
            PropertyKey::DownDown(a, b) => write!(f, "DD.{a}.{b}"),
            PropertyKey::UpDown(a, b) => write!(f, "UD.{a}.{b}"),
        }
    }
}

impl FromStr for PropertyKey {
    type Err = KeyizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyKey::parse(s)
    }
}

/// A single named timing measurement (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsProperty {
    pub key: PropertyKey,
    pub value: f64,
}

impl DynamicsProperty {
    pub fn new(key: PropertyKey, value: f64) -> Self {
        Self { key, value }
    }

    pub fn dwell(key: char, value: f64) -> Self {
        Self::new(PropertyKey::Dwell(key), value)
    }

    pub fn down_down(key_a: char, key_b: char, value: f64) -> Self {
        Self::new(PropertyKey::DownDown(key_a, key_b), value)
    }

    pub fn up_down(key_a: char, key_b: char, value: f64) -> Self {
        Self::new(PropertyKey::UpDown(key_a, key_b), value)
    }

    /// Parse a canonical name into a property with a value of 0.
    pub fn from_name(name: &str) -> Result<Self, KeyizeError> {
        Ok(Self::new(PropertyKey::parse(name)?, 0.0))
    }

    pub fn kind(&self) -> PropertyKind {
        self.key.kind()
    }

    pub fn key_a(&self) -> char {
        self.key.key_a()
    }

    pub fn key_b(&self) -> Option<char> {
        self.key.key_b()
    }

    /// Canonical name; also the property's identity within a `Dynamics`
    pub fn name(&self) -> String {
        self.key.name()
    }
}

impl FromStr for DynamicsProperty {
    type Err = KeyizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DynamicsProperty::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(name: &str) -> NameError {
        match PropertyKey::parse(name) {
            Err(KeyizeError::InvalidPropertyName { reason, .. }) => reason,
            other => panic!("expected name error for {name:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_format_names() {
        assert_eq!(PropertyKey::Dwell('a').name(), "D.a");
        assert_eq!(PropertyKey::DownDown('B', 'C').name(), "DD.B.C");
        assert_eq!(PropertyKey::UpDown('D', 'e').name(), "UD.D.e");
    }

    #[test]
    fn test_parse_round_trip() {
        let keys = ['a', 'Z', '5', ' ', '.', '\n', 'é', '\u{f}', '🦀'];

        for kind in PropertyKind::ALL {
            for &a in &keys {
                for &b in &keys {
                    let key_b = if kind.arity() == 2 { Some(b) } else { None };
                    let key = PropertyKey::new(kind, a, key_b).unwrap();
                    let parsed = PropertyKey::parse(&key.name()).unwrap();

                    assert_eq!(parsed, key);
                    assert_eq!(parsed.kind(), kind);
                    assert_eq!(parsed.key_a(), a);
                    assert_eq!(parsed.key_b(), key_b);
                }
            }
        }
    }

    #[test]
    fn test_parse_period_keys() {
        assert_eq!(PropertyKey::parse("D..").unwrap(), PropertyKey::Dwell('.'));
        assert_eq!(
            PropertyKey::parse("DD.a..").unwrap(),
            PropertyKey::DownDown('a', '.')
        );
        assert_eq!(
            PropertyKey::parse("UD....").unwrap(),
            PropertyKey::UpDown('.', '.')
        );
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert_eq!(reason("X.a"), NameError::UnknownKind("X".to_string()));
        assert_eq!(reason("dd.a.b"), NameError::UnknownKind("dd".to_string()));
        assert_eq!(reason(".a"), NameError::UnknownKind(String::new()));
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert_eq!(reason("D"), NameError::MissingSeparator);
        assert_eq!(reason(""), NameError::MissingSeparator);
    }

    #[test]
    fn test_parse_rejects_arity_mismatch() {
        assert!(matches!(
            reason("D.a.b"),
            NameError::ArityMismatch {
                kind: PropertyKind::Dwell,
                expected: 1
            }
        ));
        assert!(matches!(
            reason("DD.a"),
            NameError::ArityMismatch {
                kind: PropertyKind::DownDown,
                expected: 2
            }
        ));
        assert!(matches!(reason("UD.a.b.c"), NameError::ArityMismatch { .. }));
    }

    #[test]
    fn test_parse_rejects_multi_character_keys() {
        assert_eq!(reason("D.Shift"), NameError::MalformedKey("Shift".to_string()));
        assert_eq!(reason("D."), NameError::MalformedKey(String::new()));
        assert_eq!(reason("DD.period.t"), NameError::MalformedKey("period".to_string()));
        assert_eq!(reason("UD.a.bc"), NameError::MalformedKey("bc".to_string()));
        assert_eq!(reason("DD.a:b"), NameError::MalformedKey("a:b".to_string()));
    }

    #[test]
    fn test_new_rejects_wrong_arity() {
        assert!(PropertyKey::new(PropertyKind::Dwell, 'a', Some('b')).is_err());
        assert!(PropertyKey::new(PropertyKind::UpDown, 'a', None).is_err());
    }

    #[test]
    fn test_from_name_sets_zero_value() {
        let prop: DynamicsProperty = "DD.j.W".parse().unwrap();
        assert_eq!(prop.kind(), PropertyKind::DownDown);
        assert_eq!(prop.key_a(), 'j');
        assert_eq!(prop.key_b(), Some('W'));
        assert_eq!(prop.value, 0.0);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&PropertyKind::DownDown).unwrap();
        assert_eq!(json, "\"down_down\"");

        let parsed: PropertyKind = serde_json::from_str("\"up_down\"").unwrap();
        assert_eq!(parsed, PropertyKind::UpDown);
    }
}
