//! Geometry types for terminal sizing.

use serde::{Deserialize, Serialize};

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    /// Number of columns
    pub cols: u16,
    /// Number of rows
    pub rows: u16,
}

impl Geometry {
    /// Create a new geometry.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Whether the geometry is well-formed (both dimensions positive).
    ///
    /// A remote PTY must never be told it has zero columns or rows; callers
    /// reject ill-formed geometry instead of forwarding it.
    pub fn is_valid(&self) -> bool {
        self.cols > 0 && self.rows > 0
    }

    /// Total cell count (cols * rows).
    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Pixel size of the rendered viewport hosting a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Create a new viewport size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether the viewport has no visible area.
    ///
    /// Hidden or minimized tabs report a zero-area viewport; resizing against
    /// one would corrupt the remote PTY's last valid geometry.
    pub fn is_zero_area(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Pixel size of a single character cell in the rendering font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    /// Cell width in pixels
    pub width: f32,
    /// Cell height in pixels
    pub height: f32,
}

impl CellMetrics {
    /// Create new cell metrics.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for CellMetrics {
    /// Metrics for a typical monospace font at default size.
    fn default() -> Self {
        Self::new(8.0, 16.0)
    }
}
