//! # Page Encoder
//!
//! The encoder frames one page of packed raster data into the command
//! sequence the printer expects, enforcing frame order with a small state
//! machine:
//!
//! ```text
//! Idle → HeaderSent → RasterStreaming → FooterSent → Idle
//!        begin_page    send_raster       end_page
//! ```
//!
//! Frames are built whole and handed to the sink in a single call, so a
//! write failure never leaves a partially transmitted frame boundary to
//! resume from. The job aborts instead.
//!
//! ## Example
//!
//! ```
//! use phomemo::profile::ModelProfile;
//! use phomemo::protocol::PageEncoder;
//!
//! let profile = ModelProfile::default();
//! let mut out: Vec<u8> = Vec::new();
//!
//! let mut encoder = PageEncoder::new(&profile);
//! encoder.begin_page(&mut out, 10)?;
//! encoder.send_raster(&mut out, &[0x80], 1, 1)?; // 1x1 black pixel
//! encoder.end_page(&mut out)?;
//!
//! // 4 + 4 + 3 header bytes, 8 + 1 raster bytes, 4 + 4 footer bytes
//! assert_eq!(out.len(), 28);
//! # Ok::<(), phomemo::PhomemoError>(())
//! ```

use crate::error::PhomemoError;
use crate::profile::ModelProfile;
use crate::protocol::commands;

/// A destination for complete protocol frames.
///
/// Implemented by the device transport (writes go to the printer) and by
/// `Vec<u8>` (frames are captured, used by tests and dry runs). Each call
/// carries exactly one frame.
pub trait FrameSink {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), PhomemoError>;
}

impl FrameSink for Vec<u8> {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), PhomemoError> {
        self.extend_from_slice(frame);
        Ok(())
    }
}

/// Encoder state; one full cycle per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    HeaderSent,
    RasterStreaming,
}

/// # Page Encoder
///
/// Emits the fixed per-page frame sequence: Speed, Density, MediaType,
/// Raster, Footer A, Footer B. Speed and density come from the
/// [`ModelProfile`] selected for the job.
pub struct PageEncoder<'a> {
    profile: &'a ModelProfile,
    state: State,
}

impl<'a> PageEncoder<'a> {
    pub fn new(profile: &'a ModelProfile) -> Self {
        Self {
            profile,
            state: State::Idle,
        }
    }

    /// Emit the three header frames (speed, density, media type).
    pub fn begin_page<S: FrameSink + ?Sized>(
        &mut self,
        sink: &mut S,
        media_type: u8,
    ) -> Result<(), PhomemoError> {
        if self.state != State::Idle {
            return Err(PhomemoError::Protocol(format!(
                "begin_page called in state {:?}",
                self.state
            )));
        }

        sink.send_frame(&commands::speed(self.profile.speed))?;
        sink.send_frame(&commands::density(self.profile.density))?;
        sink.send_frame(&commands::media_type(media_type))?;

        self.state = State::HeaderSent;
        Ok(())
    }

    /// Emit the raster frame for the whole page.
    ///
    /// `packed` holds the MSB-first packed rows, concatenated; its length
    /// must be exactly `ceil(width/8) * height`.
    pub fn send_raster<S: FrameSink + ?Sized>(
        &mut self,
        sink: &mut S,
        packed: &[u8],
        width: u32,
        height: u32,
    ) -> Result<(), PhomemoError> {
        if self.state != State::HeaderSent {
            return Err(PhomemoError::Protocol(format!(
                "send_raster called in state {:?}",
                self.state
            )));
        }

        // The wire format carries 16-bit dimensions. Checked first so the
        // payload-length product below stays within u32.
        let width_bytes = width.div_ceil(8);
        if width_bytes > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(PhomemoError::Protocol(format!(
                "page {}x{} exceeds 16-bit raster dimensions",
                width, height
            )));
        }
        if packed.len() != (width_bytes * height) as usize {
            return Err(PhomemoError::Protocol(format!(
                "raster payload is {} bytes, declared {}x{} needs {}",
                packed.len(),
                width_bytes,
                height,
                width_bytes * height
            )));
        }

        sink.send_frame(&commands::raster(width_bytes as u16, height as u16, packed))?;

        self.state = State::RasterStreaming;
        Ok(())
    }

    /// Emit the two footer frames and return to idle.
    pub fn end_page<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), PhomemoError> {
        if self.state != State::RasterStreaming {
            return Err(PhomemoError::Protocol(format!(
                "end_page called in state {:?}",
                self.state
            )));
        }

        sink.send_frame(&commands::FOOTER_A)?;
        sink.send_frame(&commands::FOOTER_B)?;

        self.state = State::Idle;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
