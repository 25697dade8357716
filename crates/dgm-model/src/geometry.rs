#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A point in diagram coordinates.
///
/// Equality is exact on both components. Move detection relies on this:
/// any nonzero delta on either axis is a relocation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The origin `{0, 0}`.
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `to`; `t = 0` is `self`, `t = 1` is `to`.
    #[inline]
    #[must_use]
    pub fn lerp(self, to: Point, t: f64) -> Point {
        Point {
            x: (1.0 - t) * self.x + t * to.x,
            y: (1.0 - t) * self.y + t * to.y,
        }
    }
}

/// Width and height of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

impl Dimension {
    /// Sentinel for "not measured yet".
    pub const EMPTY: Dimension = Dimension {
        width: -1.0,
        height: -1.0,
    };

    /// Create a new dimension.
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both extents are non-negative.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width >= 0.0 && self.height >= 0.0
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::EMPTY
    }
}
