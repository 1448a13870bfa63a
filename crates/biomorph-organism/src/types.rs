//! Common types for organisms
//!
//! Ids are issued by the world collaborator, never by a global counter, so
//! a seeded run always numbers its organisms the same way.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Unique identifier for organisms in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganismId(u64);

impl OrganismId {
    /// Get the raw u64 value (useful for debugging/serialization)
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Create an OrganismId from a raw u64
    pub fn from_raw(id: u64) -> Self {
        OrganismId(id)
    }
}

impl std::fmt::Display for OrganismId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Organism({})", self.0)
    }
}

/// Identifier of a migration corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorridorId(pub u32);

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Rect {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Rectangle from origin with the given size
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(DVec2::ZERO, DVec2::new(width, height))
    }

    /// Smallest rectangle holding every point, or a point rectangle at the
    /// origin when there are none
    pub fn enclosing(points: impl IntoIterator<Item = DVec2>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::new(DVec2::ZERO, DVec2::ZERO);
        };
        iter.fold(Self::new(first, first), |rect, p| {
            Self::new(rect.min.min(p), rect.max.max(p))
        })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Whether `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
    }

    pub fn translated(&self, offset: DVec2) -> Rect {
        Rect::new(self.min + offset, self.max + offset)
    }
}
