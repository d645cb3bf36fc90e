//! # MALDI output grouping
//!
//! Spot runs can be written as one combined file, one file per spot or one
//! file per sample. The last two read sample labels from a plate map, a
//! header-less CSV laid out like the target plate.

mod grouping;
mod plate_map;


pub use grouping::{plan_groups, OutputGroup};
pub use plate_map::{is_sample_label, spot_name, PlateMap, PlateMapError, MAX_ROWS};
