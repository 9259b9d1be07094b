//! Dotted paths into decoded JSON documents.
//!
//! A path such as `items.0.id` is split on `.`; every segment made only of
//! ASCII digits selects an array element, every other segment selects an
//! object field. The classification is purely syntactic, so `0` applied to an
//! object is a mismatch rather than a lookup of the field `"0"`.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path '{path}' contains empty part after {position} parts")]
    EmptySegment { path: String, position: usize },
}

/// One step of a [`JsonPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Field(String),
    Index(usize),
}

impl Selector {
    fn classify(segment: &str) -> Self {
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = segment.parse() {
                return Selector::Index(index);
            }
        }
        Selector::Field(segment.to_string())
    }

    fn select<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match (self, value) {
            (Selector::Field(name), Value::Object(map)) => map.get(name),
            (Selector::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        }
    }
}

/// Where a path stopped resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMiss {
    /// Segments that resolved, joined with `.`.
    pub resolved: String,
    /// The first failing segment and everything after it.
    pub unresolved: String,
}

impl fmt::Display for PathMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON object only contains path '{}', not '...{}'", self.resolved, self.unresolved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<String>,
    selectors: Vec<Selector>,
}

impl JsonPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        let mut selectors = Vec::with_capacity(segments.len());
        for (position, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(PathError::EmptySegment { path: path.to_string(), position });
            }
            selectors.push(Selector::classify(segment));
        }
        Ok(Self { segments, selectors })
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Walk `value` and return whatever the full path points at.
    pub fn resolve<'v>(&self, value: &'v Value) -> Result<&'v Value, PathMiss> {
        let mut current = value;
        for (i, selector) in self.selectors.iter().enumerate() {
            current = selector.select(current).ok_or_else(|| PathMiss {
                resolved: self.segments[..i].join("."),
                unresolved: self.segments[i..].join("."),
            })?;
        }
        Ok(current)
    }
}

impl FromStr for JsonPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
