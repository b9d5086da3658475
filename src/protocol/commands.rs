//! # Phomemo Command Frames
//!
//! Byte-exact builders for every frame in the Phomemo label protocol.
//! Each builder returns the complete frame so callers can hand it to a
//! transport in a single write.
//!
//! ## Frame Reference
//!
//! | Frame     | Bytes |
//! |-----------|-------|
//! | Speed     | `1B 4E 0D <speed>` |
//! | Density   | `1B 4E 04 <density>` |
//! | MediaType | `1F 11 <code>` |
//! | Raster    | `1D 76 30 00 <wbytes LE16> <height LE16> <data>` |
//! | Footer A  | `1F F0 05 00` |
//! | Footer B  | `1F F0 03 00` |
//!
//! The raster frame is the classic ESC/POS `GS v 0` raster command; the
//! rest are Phomemo-specific configuration frames.

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - prefix for the speed and density frames
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - prefix for the raster frame
pub const GS: u8 = 0x1D;

/// US (Unit Separator) - prefix for media type and footer frames
pub const US: u8 = 0x1F;

// ============================================================================
// HEADER FRAMES
// ============================================================================

/// # Set Print Speed (ESC N 0x0D n)
///
/// ## Example
///
/// ```
/// use phomemo::protocol::commands;
///
/// assert_eq!(commands::speed(5), [0x1B, 0x4E, 0x0D, 0x05]);
/// ```
#[inline]
pub const fn speed(speed: u8) -> [u8; 4] {
    [ESC, 0x4E, 0x0D, speed]
}

/// # Set Print Density (ESC N 0x04 n)
///
/// Higher values burn darker. The vendor apps send 10.
///
/// ## Example
///
/// ```
/// use phomemo::protocol::commands;
///
/// assert_eq!(commands::density(10), [0x1B, 0x4E, 0x04, 0x0A]);
/// ```
#[inline]
pub const fn density(density: u8) -> [u8; 4] {
    [ESC, 0x4E, 0x04, density]
}

/// # Set Media Type (US 0x11 n)
///
/// Observed codes: 10 = gap labels, 11 = continuous paper. Per-model
/// semantics of other values are undocumented; the code is passed through
/// from the page header or the job default.
#[inline]
pub const fn media_type(code: u8) -> [u8; 3] {
    [US, 0x11, code]
}

// ============================================================================
// RASTER FRAME
// ============================================================================

/// # Raster Header (GS v 0 0x00 xL xH yL yH)
///
/// Declares a bitmap of `width_bytes` × `height` bytes; the bitmap bytes
/// follow immediately. Mode byte is always 0 (normal scale).
///
/// ## Example
///
/// ```
/// use phomemo::protocol::commands;
///
/// // 48 bytes wide (384 dots), 600 lines tall
/// assert_eq!(
///     commands::raster_header(48, 600),
///     [0x1D, 0x76, 0x30, 0x00, 48, 0x00, 0x58, 0x02]
/// );
/// ```
#[inline]
pub const fn raster_header(width_bytes: u16, height: u16) -> [u8; 8] {
    let w = u16_le(width_bytes);
    let h = u16_le(height);
    [GS, b'v', b'0', 0x00, w[0], w[1], h[0], h[1]]
}

/// Build a complete raster frame: header plus packed bitmap data.
///
/// `data.len()` must equal `width_bytes * height`; the encoder checks this
/// before calling.
pub fn raster(width_bytes: u16, height: u16, data: &[u8]) -> Vec<u8> {
    debug_assert_eq!(data.len(), width_bytes as usize * height as usize);

    let mut frame = Vec::with_capacity(8 + data.len());
    frame.extend_from_slice(&raster_header(width_bytes, height));
    frame.extend_from_slice(data);
    frame
}

// ============================================================================
// FOOTER FRAMES
// ============================================================================

/// # Footer A (US 0xF0 0x05 0x00)
///
/// First of the two fixed end-of-page frames. Feeds the label to the tear
/// position.
pub const FOOTER_A: [u8; 4] = [US, 0xF0, 0x05, 0x00];

/// # Footer B (US 0xF0 0x03 0x00)
///
/// Second end-of-page frame; returns the printer to idle.
pub const FOOTER_B: [u8; 4] = [US, 0xF0, 0x03, 0x00];

// ============================================================================
// HELPERS
// ============================================================================

/// Encode a u16 as little-endian bytes.
///
/// ## Example
///
/// ```
/// use phomemo::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// assert_eq!(u16_le(576), [0x40, 0x02]); // 576 = 0x0240
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [(value & 0xFF) as u8, (value >> 8) as u8]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_u16_le() {
        assert_eq!(u16_le(0x0000), [0x00, 0x00]);
        assert_eq!(u16_le(0x00FF), [0xFF, 0x00]);
        assert_eq!(u16_le(0xFF00), [0x00, 0xFF]);
        assert_eq!(u16_le(0x1234), [0x34, 0x12]);
        assert_eq!(u16_le(384), [0x80, 0x01]); // M110 width
    }

    #[test]
    fn test_speed_frame() {
        assert_eq!(speed(5), [0x1B, 0x4E, 0x0D, 0x05]);
        assert_eq!(speed(0), [0x1B, 0x4E, 0x0D, 0x00]);
    }

    #[test]
    fn test_density_frame() {
        assert_eq!(density(10), [0x1B, 0x4E, 0x04, 0x0A]);
        assert_eq!(density(15), [0x1B, 0x4E, 0x04, 0x0F]);
    }

    #[test]
    fn test_media_type_frame() {
        assert_eq!(media_type(10), [0x1F, 0x11, 0x0A]);
        assert_eq!(media_type(11), [0x1F, 0x11, 0x0B]);
    }

    #[test]
    fn test_raster_header_little_endian() {
        // 300 bytes wide = 0x012C, 1000 lines = 0x03E8
        assert_eq!(
            raster_header(300, 1000),
            [0x1D, 0x76, 0x30, 0x00, 0x2C, 0x01, 0xE8, 0x03]
        );
    }

    #[test]
    fn test_raster_frame_layout() {
        let data = vec![0xAA; 2 * 3];
        let frame = raster(2, 3, &data);
        assert_eq!(&frame[0..8], &[0x1D, 0x76, 0x30, 0x00, 2, 0, 3, 0]);
        assert_eq!(&frame[8..], &data[..]);
        assert_eq!(frame.len(), 8 + 6);
    }

    #[test]
    fn test_footer_frames() {
        assert_eq!(FOOTER_A, [0x1F, 0xF0, 0x05, 0x00]);
        assert_eq!(FOOTER_B, [0x1F, 0xF0, 0x03, 0x00]);
    }
}
