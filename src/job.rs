//! # Print Job Runner
//!
//! Streams every page of a raster stream through the bit packer and the
//! page encoder onto a frame sink. Strictly single-threaded and
//! sequential: a page is fully read and packed, then its frames go out in
//! order, then the buffers are dropped before the next page starts.
//!
//! There is no retry anywhere in here: the first failed write kills the
//! job and the spooler decides about resubmission.

use std::io::Read;

use crate::error::PhomemoError;
use crate::profile::{DEFAULT_MEDIA_TYPE, ModelProfile};
use crate::protocol::{FrameSink, PageEncoder};
use crate::raster::{RasterReader, pack_row};

/// # Job Options
///
/// Knobs that come from the spooler environment rather than the model
/// profile.
#[derive(Debug, Clone, Copy)]
pub struct JobOptions {
    /// Media type code used when the page header leaves it unset. The
    /// observed vendor default is 10 (gap labels); its exact semantics
    /// vary per model, which is why this is a setting and not a constant
    /// in the encoder.
    pub media_type_default: u8,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            media_type_default: DEFAULT_MEDIA_TYPE,
        }
    }
}

/// Stream all pages of `reader` onto `sink`. Returns the number of pages
/// actually printed (skipped empty pages are not counted).
pub fn run_print_job<R: Read, S: FrameSink + ?Sized>(
    reader: &mut RasterReader<R>,
    sink: &mut S,
    profile: &ModelProfile,
    options: &JobOptions,
) -> Result<u32, PhomemoError> {
    let mut encoder = PageEncoder::new(profile);
    let mut printed = 0u32;
    let mut page_number = 0u32;

    while let Some(header) = reader.next_page()? {
        page_number += 1;
        log::debug!(
            "page {}: {}x{} px, {} bpp, colorspace {}, media {}",
            page_number,
            header.width,
            header.height,
            header.bits_per_pixel,
            header.color_space,
            header.media_type
        );

        // Zero-sized pages are skipped, not failed; the job continues.
        if header.is_empty() {
            log::info!("page {} is empty, skipping", page_number);
            continue;
        }

        if header.bits_per_pixel != 8 {
            return Err(PhomemoError::InvalidRasterHeader(format!(
                "page {} has {} bits per pixel; the PPD must produce 8-bit grayscale",
                page_number, header.bits_per_pixel
            )));
        }

        if header.width > profile.max_width_px as u32 {
            log::warn!(
                "page {} is {} px wide, {} supports {}; the printer will clip",
                page_number,
                header.width,
                profile.model.label(),
                profile.max_width_px
            );
        }

        // Read and pack the whole page before emitting any frame, so a
        // truncated input stream never leaves a half-sent raster frame.
        let width = header.width as usize;
        let width_bytes = width.div_ceil(8);
        let mut line = vec![0u8; header.bytes_per_line as usize];
        let mut packed = Vec::with_capacity(width_bytes * header.height as usize);

        for _ in 0..header.height {
            reader.read_line(&header, &mut line)?;
            packed.extend_from_slice(&pack_row(&line, width));
        }

        let media_type = if header.media_type != 0 {
            header.media_type.min(u8::MAX as u32) as u8
        } else {
            options.media_type_default
        };

        encoder.begin_page(sink, media_type)?;
        encoder.send_raster(sink, &packed, header.width, header.height)?;
        encoder.end_page(sink)?;

        printed += 1;
        log::debug!("page {} sent ({} raster bytes)", page_number, packed.len());
    }

    Ok(printed)
}

// ============================================================================
// TESTS
// ============================================================================
