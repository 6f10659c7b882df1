//! Identifier classification.
//!
//! # Responsibility
//! - Parse path-style identifiers into the closed `ResourceId` variant.
//! - Render `ResourceId` back to its canonical path form.
//!
//! # Invariants
//! - Parsing is the only place raw identifier strings are inspected.
//! - An item id always fits a non-negative `i64`.

use crate::model::contract::{CONTENT_AUTHORITY, PATH_RECORDS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Address of either the whole collection or one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceId {
    Collection,
    Item(i64),
}

impl ResourceId {
    pub fn item_id(self) -> Option<i64> {
        match self {
            Self::Collection => None,
            Self::Item(id) => Some(id),
        }
    }

    /// Returns whether a change at `changed` concerns this identifier.
    ///
    /// A collection change reaches every identifier. An item change reaches
    /// the same item, and the collection only when `descendants` is set.
    pub fn is_affected_by(self, changed: ResourceId, descendants: bool) -> bool {
        match (self, changed) {
            (_, Self::Collection) => true,
            (Self::Item(own), Self::Item(other)) => own == other,
            (Self::Collection, Self::Item(_)) => descendants,
        }
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collection => f.write_str(PATH_RECORDS),
            Self::Item(id) => write!(f, "{PATH_RECORDS}/{id}"),
        }
    }
}

/// Immutable identifier matcher, built once per provider.
#[derive(Debug, Clone)]
pub struct UriMatcher {
    pattern: Regex,
}

impl UriMatcher {
    /// Builds a matcher accepting `records`, `records/<digits>` and their
    /// `content://<authority>/` qualified forms.
    pub fn new() -> Self {
        let source = format!(
            r"^(?:content://{}/)?{}(?:/([0-9]+))?$",
            regex::escape(CONTENT_AUTHORITY),
            regex::escape(PATH_RECORDS)
        );
        let pattern = Regex::new(&source).expect("identifier pattern is built from constants");
        Self { pattern }
    }

    /// Classifies `raw`, or returns `None` for any unsupported shape.
    pub fn classify(&self, raw: &str) -> Option<ResourceId> {
        let captures = self.pattern.captures(raw)?;
        match captures.get(1) {
            None => Some(ResourceId::Collection),
            Some(digits) => digits.as_str().parse::<i64>().ok().map(ResourceId::Item),
        }
    }
}

impl Default for UriMatcher {
    fn default() -> Self {
        Self::new()
    }
}
