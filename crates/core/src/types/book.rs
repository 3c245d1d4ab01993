//! Book and key point domain models

use crate::types::Validator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(u64);

impl BookId {
    /// Creates a BookId from its numeric value
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a key point
///
/// The player tags every track with this id rendered as a string, so the id
/// must survive a `to_string` / `parse` round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPointId(u64);

impl KeyPointId {
    /// Creates a KeyPointId from its numeric value
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for KeyPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KeyPointId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

/// Reference to a cover image (URI or path understood by the front end)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverRef(String);

impl CoverRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoverRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to the audio source of one key point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioRef(String);

impl AudioRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One narrated chapter of a book summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub id: KeyPointId,
    /// 0-based index within the book
    pub position: u32,
    pub title: String,
    pub audio: AudioRef,
}

impl KeyPoint {
    /// Creates a new key point
    pub fn new(id: KeyPointId, position: u32, title: impl Into<String>, audio: AudioRef) -> Self {
        Self {
            id,
            position,
            title: title.into(),
            audio,
        }
    }
}

/// A book summary and its ordered key points
///
/// The key point set is fixed once a playback session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub cover: CoverRef,
    pub key_points: Vec<KeyPoint>,
}

impl Book {
    /// Creates a new book
    pub fn new(
        id: BookId,
        title: impl Into<String>,
        cover: CoverRef,
        key_points: Vec<KeyPoint>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            cover,
            key_points,
        }
    }

    /// Number of key points in the book
    pub fn total_key_points(&self) -> usize {
        self.key_points.len()
    }

    /// Returns true if the book has nothing to play
    pub fn is_empty(&self) -> bool {
        self.key_points.is_empty()
    }

    /// First key point in list order
    pub fn first_key_point(&self) -> Option<&KeyPoint> {
        self.key_points.first()
    }

    /// Finds a key point by id
    pub fn key_point_by_id(&self, id: KeyPointId) -> Option<&KeyPoint> {
        self.key_points.iter().find(|kp| kp.id == id)
    }

    /// Finds the list index of the key point with the given `position`
    pub fn index_of_position(&self, position: u32) -> Option<usize> {
        self.key_points.iter().position(|kp| kp.position == position)
    }

    /// Finds the key point with the given `position`
    pub fn key_point_at_position(&self, position: u32) -> Option<&KeyPoint> {
        self.index_of_position(position)
            .map(|index| &self.key_points[index])
    }

    /// Returns the 1-based number of a key point in list order
    pub fn number_of(&self, id: KeyPointId) -> Option<usize> {
        self.key_points
            .iter()
            .position(|kp| kp.id == id)
            .map(|index| index + 1)
    }
}

impl Validator for Book {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        if self.key_points.is_empty() {
            errors.push("Book must contain at least one key point".to_string());
        }

        let mut ids = HashSet::new();
        for (index, key_point) in self.key_points.iter().enumerate() {
            if !ids.insert(key_point.id) {
                errors.push(format!("Duplicate key point id {}", key_point.id));
            }
            if key_point.position as usize != index {
                errors.push(format!(
                    "Key point {} has position {} but is at index {}",
                    key_point.id, key_point.position, index
                ));
            }
            if key_point.title.trim().is_empty() {
                errors.push(format!("Key point {} has an empty title", key_point.id));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
