//! Keyboard-driven pointer navigation
//!
//! The screen is split into a 3x3 grid labelled like a numeric keypad.
//! Each digit zooms into one cell until the user moves, clicks or scrolls
//! at the center of the selected region.
//!
//! ```
//! use numgrid::domain::core::Region;
//! use numgrid::domain::grid::GridModel;
//!
//! let mut grid = GridModel::new(0, 1);
//! grid.reset(Region::new(0, 0, 900, 900).unwrap());
//! let cell = grid.select(9).unwrap();
//! assert_eq!(cell, Region::new(600, 0, 900, 300).unwrap());
//! ```

pub mod app;
pub mod config;
pub mod domain;
pub mod input;
pub mod platform;
pub mod ui;
