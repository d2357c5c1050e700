//! Transition event and its wire payload.

use crate::error::Result;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;
use std::io;

/// Wall-clock time of an event, or `Unknown` when the clock is not synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    At(NaiveDateTime),
    Unknown,
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::At(time) => write!(f, "{}", time.format("%Y-%m-%d %H:%M:%S")),
            Timestamp::Unknown => f.write_str("N/A"),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A detected occupancy transition, published once and then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionEvent {
    /// Baseline reading the change was measured against.
    #[serde(rename = "situacao")]
    pub prior_value: i32,
    #[serde(rename = "distancia_atual")]
    pub current_value: i32,
    #[serde(rename = "diferenca")]
    pub delta: i32,
    pub timestamp: Timestamp,
}

impl TransitionEvent {
    pub fn new(prior_value: i32, current_value: i32, timestamp: Timestamp) -> Self {
        Self {
            prior_value,
            current_value,
            delta: current_value.saturating_sub(prior_value),
            timestamp,
        }
    }

    /// Render the payload consumed by the dashboard backend.
    ///
    /// Layout: `{ "situacao": 4000, "distancia_atual": 1000, "diferenca": -3000, "timestamp": "..." }`
    pub fn to_payload(&self) -> Result<String> {
        let mut buf = Vec::with_capacity(128);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PayloadFormatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// JSON formatter producing the spaced single-line object layout.
struct PayloadFormatter;

impl serde_json::ser::Formatter for PayloadFormatter {
    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b"{ ")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b" }")
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}
