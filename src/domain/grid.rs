//! Recursive grid navigation model
//!
//! This module keeps the navigation stack for the 3x3 grid: the monitor
//! region at the root and one subdivision cell per level below it.
//! It enforces the depth limit and the minimum usable cell size.

use thiserror::Error;

use crate::domain::core::Region;
use crate::domain::keyboard::NumpadKey;

/// Errors that can occur during grid operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Region bounds have zero or negative extent
    #[error("invalid region ({left}, {top}, {right}, {bottom}): extent must be positive")]
    InvalidRegion {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    },
    /// Digit outside 1..=9
    #[error("invalid grid key {0}: expected a digit between 1 and 9")]
    InvalidKey(u8),
    /// Region queried before the grid was reset onto a monitor
    #[error("grid has not been initialized with a root region")]
    NotInitialized,
    /// Selected cell would be smaller than the minimum usable size
    #[error("cell {width}x{height} is below the minimum size of {min}px")]
    RegionTooSmall { width: i32, height: i32, min: u32 },
}

/// Navigation stack over recursively subdivided regions
///
/// `stack[0]` is the root (monitor bounds); every following entry is one
/// of the nine cells of the entry before it. Depth is `stack.len() - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridModel {
    stack: Vec<Region>,
    /// 0 means unlimited
    max_depth: u32,
    min_cell_size: u32,
    last_selected_key: Option<NumpadKey>,
}

impl GridModel {
    /// Default minimum width and height of a selectable cell in pixels
    pub const DEFAULT_MIN_CELL_SIZE: u32 = 3;

    /// Creates an uninitialized model
    ///
    /// `min_cell_size` is clamped to at least one pixel so a degenerate
    /// cell can never enter the stack.
    pub fn new(max_depth: u32, min_cell_size: u32) -> Self {
        Self {
            stack: Vec::new(),
            max_depth,
            min_cell_size: min_cell_size.max(1),
            last_selected_key: None,
        }
    }

    /// Restarts navigation from `root`
    pub fn reset(&mut self, root: Region) {
        self.stack.clear();
        self.stack.push(root);
        self.last_selected_key = None;
    }

    /// Discards all navigation state
    pub fn clear(&mut self) {
        self.stack.clear();
        self.last_selected_key = None;
    }

    pub fn is_initialized(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn min_cell_size(&self) -> u32 {
        self.min_cell_size
    }

    pub fn last_selected_key(&self) -> Option<NumpadKey> {
        self.last_selected_key
    }

    pub fn root_region(&self) -> Result<Region, GridError> {
        self.stack.first().copied().ok_or(GridError::NotInitialized)
    }

    pub fn current_region(&self) -> Result<Region, GridError> {
        self.stack.last().copied().ok_or(GridError::NotInitialized)
    }

    /// The nine cells of the current region in display order
    pub fn cells(&self) -> Result<[Region; 9], GridError> {
        Ok(self.current_region()?.subdivide())
    }

    /// Zooms into the cell for `key`
    ///
    /// At the depth limit the call is a no-op returning the current
    /// region: a model with `max_depth = N` reaches depth `N` and only the
    /// push beyond it is dropped.
    ///
    /// # Example
    /// ```rust
    /// use numgrid::domain::{core::Region, grid::GridModel};
    ///
    /// let mut grid = GridModel::new(0, 3);
    /// grid.reset(Region::new(0, 0, 1920, 1080).unwrap());
    /// let region = grid.select(5).unwrap();
    /// assert_eq!(region, Region::new(640, 360, 1280, 720).unwrap());
    /// ```
    pub fn select(&mut self, key: u8) -> Result<Region, GridError> {
        let key = NumpadKey::new(key)?;
        self.select_key(key)
    }

    fn select_key(&mut self, key: NumpadKey) -> Result<Region, GridError> {
        let current = self.current_region()?;

        if self.at_depth_limit() {
            return Ok(current);
        }

        let cell = current.subdivide()[key.cell_index()];
        let min = self.min_cell_size as i32;
        if cell.width() < min || cell.height() < min || cell == current {
            return Err(GridError::RegionTooSmall {
                width: cell.width(),
                height: cell.height(),
                min: self.min_cell_size,
            });
        }

        self.stack.push(cell);
        self.last_selected_key = Some(key);
        Ok(cell)
    }

    /// Subdivides again with the most recently selected key
    pub fn drill_repeat(&mut self) -> Result<Region, GridError> {
        match self.last_selected_key {
            Some(key) => self.select_key(key),
            None => self.current_region(),
        }
    }

    /// Goes up one level; the root is never popped
    pub fn back(&mut self) -> Result<Region, GridError> {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self.current_region()
    }

    /// Goes back to the root region
    pub fn reset_to_root(&mut self) -> Result<Region, GridError> {
        let root = self.root_region()?;
        self.stack.truncate(1);
        Ok(root)
    }

    /// Applies new limits, truncating the stack if it is now too deep
    pub fn set_limits(&mut self, max_depth: u32, min_cell_size: u32) {
        self.max_depth = max_depth;
        self.min_cell_size = min_cell_size.max(1);

        if max_depth > 0 && self.stack.len() > max_depth as usize + 1 {
            self.stack.truncate(max_depth as usize + 1);
        }
    }

    fn at_depth_limit(&self) -> bool {
        self.max_depth > 0 && self.depth() + 1 > self.max_depth as usize
    }
}
