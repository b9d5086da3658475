//! # Phomemo Protocol Implementation
//!
//! This module provides low-level command builders and the per-page
//! encoder for the binary protocol spoken by Phomemo thermal label
//! printers (M02, M110, M120, M220, M421, T02, D30).
//!
//! ## Module Structure
//!
//! - [`commands`]: byte-exact frame builders (speed, density, media type,
//!   raster header, footers)
//! - [`encoder`]: the per-page state machine that emits frames in the
//!   order the printer expects
//!
//! ## Protocol Overview
//!
//! The protocol is a small ESC/POS dialect. Every page is the same fixed
//! sequence of frames:
//!
//! ```text
//! Speed      ESC N 0x0D <speed>
//! Density    ESC N 0x04 <density>
//! MediaType  0x1F 0x11 <code>
//! Raster     GS v 0 0x00 <width_bytes LE16> <height LE16> <bitmap>
//! Footer A   0x1F 0xF0 0x05 0x00
//! Footer B   0x1F 0xF0 0x03 0x00
//! ```
//!
//! Multi-byte integers are **little-endian**. The raster bitmap is packed
//! MSB-first, 1 = print (see [`crate::raster::pack`]).

pub mod commands;
pub mod encoder;

pub use encoder::{FrameSink, PageEncoder};
