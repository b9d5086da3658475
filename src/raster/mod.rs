//! # Raster Input
//!
//! This module handles the bitmap side of a print job: reading pages from
//! a CUPS raster stream and packing 8-bit grayscale rows into the 1-bit
//! format the printer consumes.
//!
//! ## Modules
//!
//! - [`stream`]: CUPS raster stream reader (page headers, line data)
//! - [`pack`]: grayscale-to-1-bit row packing
//!
//! Anything beyond simple thresholding (scaling, dithering, color
//! management) is the raster source's job, not ours.

pub mod pack;
pub mod stream;

pub use pack::pack_row;
pub use stream::{PageHeader, RasterReader};
