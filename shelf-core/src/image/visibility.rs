//! Viewport visibility gate for deferred image loading

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Grow the rectangle by `margin` on every side
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Overlap with `other`, if the two touch at all
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

/// Gate tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateOptions {
    /// Lookahead added around the viewport, in pixels
    pub root_margin: f64,

    /// Fraction of the element that must fall inside the expanded viewport
    pub threshold: f64,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            root_margin: 50.0,
            threshold: 0.1,
        }
    }
}

/// Defers loading until the element nears the viewport.
///
/// A priority gate starts open. Otherwise the first qualifying observation
/// opens it, and it stays open from then on.
#[derive(Debug, Clone)]
pub struct VisibilityGate {
    options: GateOptions,
    open: bool,
}

impl VisibilityGate {
    pub fn new(priority: bool, options: GateOptions) -> Self {
        Self {
            options,
            open: priority,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Report the element's position. Returns `true` only for the
    /// observation that opened the gate.
    pub fn observe(&mut self, element: Rect, viewport: Rect) -> bool {
        if self.open {
            return false;
        }
        if self.is_visible(&element, &viewport) {
            self.open = true;
            return true;
        }
        false
    }

    fn is_visible(&self, element: &Rect, viewport: &Rect) -> bool {
        let root = viewport.expand(self.options.root_margin.max(0.0));
        let Some(overlap) = element.intersection(&root) else {
            return false;
        };

        let area = element.area();
        if area <= 0.0 {
            // Degenerate elements count as visible once they touch the root
            return true;
        }
        overlap.area() / area >= self.options.threshold.clamp(0.0, 1.0)
    }
}
