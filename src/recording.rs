//! Raw keystroke recordings
//!
//! A recording is the ordered list of key-down / key-up events captured while a
//! person types. Recordings arrive from capture tools in the Keyize V1 text
//! format: a run of tokens `<kind><subject><timestamp>` where the kind is `d`
//! (key down) or `u` (key up), the subject is the key's character and the
//! timestamp is an absolute, non-negative integer (e.g. `da0ua100db150ub200`).

use crate::error::{KeyizeError, TokenError};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Backspace subject, removes the previous character in [`Recording::text`]
pub const BACKSPACE: char = '\u{8}';

/// Raw event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawEventKind {
    KeyDown,
    KeyUp,
}

impl RawEventKind {
    /// Letter used for this kind in the V1 format
    pub fn v1_code(self) -> char {
        match self {
            RawEventKind::KeyDown => 'd',
            RawEventKind::KeyUp => 'u',
        }
    }

    pub fn from_v1_code(code: char) -> Option<Self> {
        match code {
            'd' => Some(RawEventKind::KeyDown),
            'u' => Some(RawEventKind::KeyUp),
            _ => None,
        }
    }
}

/// A single event which took place during a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingEvent {
    /// Absolute timestamp, same unit (milliseconds) throughout a recording
    pub at: u64,
    pub kind: RawEventKind,
    pub subject: char,
}

impl RecordingEvent {
    pub fn key_down(subject: char, at: u64) -> Self {
        Self {
            at,
            kind: RawEventKind::KeyDown,
            subject,
        }
    }

    pub fn key_up(subject: char, at: u64) -> Self {
        Self {
            at,
            kind: RawEventKind::KeyUp,
            subject,
        }
    }
}

/// How the V1 importer treats timestamps that go backwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStrictness {
    /// Reject the import when a timestamp is lower than the previous one
    Strict,
    /// Accept any parseable timestamp order
    Lenient,
}

/// A user's raw typing recording
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    events: Vec<RecordingEvent>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<RecordingEvent>) -> Self {
        Self { events }
    }

    /// Append an event.
    pub fn push(&mut self, event: RecordingEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[RecordingEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Import a recording in the Keyize V1 format.
    ///
    /// ASCII whitespace between tokens is ignored. Nothing is returned if any
    /// token is malformed.
    pub fn import_v1(input: &str, strictness: ImportStrictness) -> Result<Self, KeyizeError> {
        let mut events: Vec<RecordingEvent> = Vec::new();
        let mut chars = input.char_indices().peekable();

        while let Some(&(offset, kind_code)) = chars.peek() {
            if kind_code.is_ascii_whitespace() {
                chars.next();
                continue;
            }
            chars.next();

            let kind = RawEventKind::from_v1_code(kind_code).ok_or(KeyizeError::InvalidToken {
                offset,
                reason: TokenError::UnknownEventKind(kind_code),
            })?;

            let (_, subject) = chars.next().ok_or(KeyizeError::InvalidToken {
                offset,
                reason: TokenError::MissingSubject,
            })?;

            let digits_start = match chars.peek() {
                Some(&(start, c)) if c.is_ascii_digit() => start,
                Some(&(start, c)) => {
                    return Err(KeyizeError::InvalidTimestamp {
                        offset: start,
                        value: c.to_string(),
                    })
                }
                None => {
                    return Err(KeyizeError::InvalidToken {
                        offset,
                        reason: TokenError::MissingTimestamp,
                    })
                }
            };

            let mut digits_end = digits_start;
            while let Some(&(index, c)) = chars.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                digits_end = index + c.len_utf8();
                chars.next();
            }

            let digits = &input[digits_start..digits_end];
            let at: u64 = digits.parse().map_err(|_| KeyizeError::InvalidTimestamp {
                offset: digits_start,
                value: digits.to_string(),
            })?;

            if strictness == ImportStrictness::Strict {
                if let Some(previous) = events.last().map(|e| e.at) {
                    if at < previous {
                        return Err(KeyizeError::TimestampOutOfOrder {
                            index: events.len(),
                            previous,
                            current: at,
                        });
                    }
                }
            }

            events.push(RecordingEvent { at, kind, subject });
        }

        tracing::debug!(events = events.len(), ?strictness, "imported V1 recording");

        Ok(Self { events })
    }

    /// Export the recording in the Keyize V1 format.
    pub fn to_v1(&self) -> String {
        let mut out = String::with_capacity(self.events.len() * 6);
        for event in &self.events {
            // Writing to a String cannot fail
            let _ = write!(out, "{}{}{}", event.kind.v1_code(), event.subject, event.at);
        }
        out
    }

    /// Reconstruct the typed text from key-down events.
    ///
    /// A backspace key-down removes the previous character.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for event in self.events.iter().filter(|e| e.kind == RawEventKind::KeyDown) {
            if event.subject == BACKSPACE {
                text.pop();
            } else {
                text.push(event.subject);
            }
        }
        text
    }
}
