//! # Bit Packing
//!
//! Converts rows of 8-bit grayscale samples into the printer's 1-bit
//! packed format.
//!
//! ## Bit Layout
//!
//! Bits are packed MSB-first: pixel 0 lands in bit 7 of byte 0.
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0x80 = 10000000 = █░░░░░░░
//! ```
//!
//! A sample below the luminance threshold is dark paper: bit 1, print.
//! Bits past the row width in the final byte stay zero.

/// Samples below this value print as black.
pub const LUMINANCE_THRESHOLD: u8 = 128;

/// Pack one row of grayscale samples into `ceil(width/8)` bytes.
///
/// `samples` must hold at least `width` values; extra trailing bytes
/// (line padding from the raster source) are ignored. Pure and
/// deterministic.
///
/// ## Example
///
/// ```
/// use phomemo::raster::pack_row;
///
/// // 4 black pixels, 4 white pixels
/// assert_eq!(pack_row(&[0, 0, 0, 0, 255, 255, 255, 255], 8), vec![0xF0]);
///
/// // 1x1 black pixel: only the top bit set
/// assert_eq!(pack_row(&[0], 1), vec![0x80]);
/// ```
pub fn pack_row(samples: &[u8], width: usize) -> Vec<u8> {
    debug_assert!(samples.len() >= width);

    let mut packed = vec![0u8; width.div_ceil(8)];
    for (x, &sample) in samples.iter().take(width).enumerate() {
        if sample < LUMINANCE_THRESHOLD {
            packed[x / 8] |= 1 << (7 - (x % 8)); // MSB first
        }
    }
    packed
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_packed_length_is_ceil_width_over_8() {
        for width in 0..=40 {
            let samples = vec![0u8; width.max(1)];
            assert_eq!(pack_row(&samples, width).len(), width.div_ceil(8));
        }
    }

    #[test]
    fn test_white_row_packs_to_zero() {
        assert_eq!(pack_row(&[255], 1), vec![0x00]);
        assert_eq!(pack_row(&[255; 16], 16), vec![0x00, 0x00]);
    }

    #[test]
    fn test_black_row_sets_all_bits() {
        assert_eq!(pack_row(&[0], 1), vec![0x80]);
        assert_eq!(pack_row(&[0; 8], 8), vec![0xFF]);
    }

    #[test]
    fn test_threshold_boundary() {
        // 127 is ink, 128 is paper
        assert_eq!(pack_row(&[127], 1), vec![0x80]);
        assert_eq!(pack_row(&[128], 1), vec![0x00]);
    }

    #[test]
    fn test_msb_first_ordering() {
        // alternating black/white starting black
        let row = [0, 255, 0, 255, 0, 255, 0, 255];
        assert_eq!(pack_row(&row, 8), vec![0xAA]);
    }

    #[test]
    fn test_trailing_bits_are_zero() {
        // 9 black pixels: second byte has only the top bit set
        assert_eq!(pack_row(&[0; 9], 9), vec![0xFF, 0x80]);
        // 12 black pixels: low nibble of second byte stays clear
        assert_eq!(pack_row(&[0; 12], 12), vec![0xFF, 0xF0]);
    }

    #[test]
    fn test_padding_beyond_width_ignored() {
        // bytes_per_line > width: padding must not leak into the output
        let row = [0u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(pack_row(&row, 4), vec![0xF0]);
    }

    #[test]
    fn test_deterministic() {
        let row: Vec<u8> = (0..=255u8).collect();
        assert_eq!(pack_row(&row, 256), pack_row(&row, 256));
    }
}
