//! # Phomemo - CUPS Backend for Phomemo Label Printers
//!
//! Phomemo is a Rust library and CUPS backend for Phomemo thermal label
//! printers (M02, M110, M120, M220, M421, T02, D30) over Bluetooth RFCOMM
//! and USB. It provides:
//!
//! - **Protocol implementation**: ESC/POS-style frame builders and a page
//!   encoder enforcing the header / raster / footer order
//! - **Raster handling**: CUPS raster stream reader (v1/v2/v3) and
//!   MSB-first 1-bit packing
//! - **Transport**: Bluetooth RFCOMM and usblp device-node backends
//! - **Discovery**: paired-device and sysfs enumeration in CUPS
//!   `direct ...` line format
//!
//! ## Quick Start
//!
//! ```no_run
//! use phomemo::{
//!     profile::{Model, ModelProfile},
//!     protocol::PageEncoder,
//!     raster::pack_row,
//!     transport::DeviceTransport,
//!     uri::DeviceUri,
//! };
//!
//! // Open connection to printer
//! let uri = DeviceUri::parse("phomemo://AABBCCDDEEFF")?;
//! let mut transport = DeviceTransport::open(&uri)?;
//!
//! // Pick the model profile
//! let profile = ModelProfile::for_model(Model::M220);
//!
//! // Pack one all-black line and repeat it for a 64-dot rule
//! let line = pack_row(&vec![0u8; 576], 576);
//! let mut raster = Vec::new();
//! for _ in 0..64 {
//!     raster.extend_from_slice(&line);
//! }
//!
//! // Encode and send the page
//! let mut encoder = PageEncoder::new(&profile);
//! encoder.begin_page(&mut transport, profile.media_type_code)?;
//! encoder.send_raster(&mut transport, &raster, 576, 64)?;
//! encoder.end_page(&mut transport)?;
//!
//! # Ok::<(), phomemo::PhomemoError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Frame builders and page encoder |
//! | [`raster`] | CUPS raster reader and bit packing |
//! | [`transport`] | Bluetooth and USB byte transports |
//! | [`discovery`] | Printer enumeration |
//! | [`profile`] | Model classification and capabilities |
//! | [`uri`] | Device URI and Bluetooth address parsing |
//! | [`job`] | Raster-to-frames job runner |
//! | [`backend`] | CUPS argv/stderr contract |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Currently tested with:
//! - Phomemo M220 (80mm labels, 203 DPI, Bluetooth and USB)
//! - Phomemo M110 (Bluetooth)

pub mod backend;
pub mod discovery;
pub mod error;
pub mod job;
pub mod profile;
pub mod protocol;
pub mod raster;
pub mod transport;
pub mod uri;

pub use error::PhomemoError;
