//! # CUPS Raster Stream Reader
//!
//! Reads the raster stream a CUPS filter chain delivers on stdin: a
//! 4-byte sync word, then one fixed-layout header block plus pixel data
//! per page.
//!
//! ## Stream Layout
//!
//! ```text
//! ┌──────────┬────────────┬────────────┬────────────┬─────────┬─ ...
//! │ sync (4) │ header pg1 │ pixels pg1 │ header pg2 │ pixels  │
//! └──────────┴────────────┴────────────┴────────────┴─────────┴─ ...
//! ```
//!
//! The sync word identifies both the format version and the byte order of
//! every integer in the headers:
//!
//! | Bytes   | Version | Integers      | Pixel data |
//! |---------|---------|---------------|------------|
//! | `RaSt` / `tSaR` | v1 | BE / LE | unencoded |
//! | `RaS2` / `2SaR` | v2 | BE / LE | per-line RLE |
//! | `RaS3` / `3SaR` | v3 | BE / LE | unencoded |
//!
//! The header block is the C `cups_page_header2_t` struct written
//! verbatim: 420 bytes for v1, 1796 bytes for v2/v3. We only decode the
//! handful of fields the backend needs; everything else is skipped.
//!
//! ## v2 Line Encoding
//!
//! Each encoded line starts with a repeat byte (`n` = line repeats n+1
//! times), followed by runs until `bytes_per_line` bytes are produced:
//! a run byte ≤ 127 repeats the next pixel `run+1` times; a run byte
//! ≥ 128 is followed by `257-run` literal pixels.

use std::io::{self, Read};

use crate::error::PhomemoError;

/// v1 header block size (through cupsRowStep)
const HEADER_SIZE_V1: usize = 420;

/// v2/v3 header block size (through cupsPageSizeName)
const HEADER_SIZE_V2: usize = 1796;

// Byte offsets of the fields we decode, within the header block.
const OFFSET_WIDTH: usize = 372;
const OFFSET_HEIGHT: usize = 376;
const OFFSET_MEDIA_TYPE: usize = 380;
const OFFSET_BITS_PER_PIXEL: usize = 388;
const OFFSET_BYTES_PER_LINE: usize = 392;
const OFFSET_COLOR_SPACE: usize = 400;

/// Raster stream format version, from the sync word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    V1,
    V2,
    V3,
}

/// # Page Header
///
/// The per-page metadata the backend cares about, decoded from the raster
/// header block. Read-only to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Page width in pixels
    pub width: u32,
    /// Page height in pixels
    pub height: u32,
    /// Bits per pixel (8 = grayscale)
    pub bits_per_pixel: u32,
    /// CUPS colorspace code (0 = luminance/white)
    pub color_space: u32,
    /// Media type code from the job ticket (0 = unset)
    pub media_type: u32,
    /// Bytes per line as delivered, including padding
    pub bytes_per_line: u32,
}

impl PageHeader {
    /// Whether this page carries no printable area and should be skipped.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// # Raster Reader
///
/// Pulls page headers and pixel lines off a raster stream. Pages must be
/// consumed in order: call [`next_page`](Self::next_page), then
/// [`read_line`](Self::read_line) exactly `height` times.
pub struct RasterReader<R: Read> {
    input: R,
    version: Version,
    big_endian: bool,
    /// v2 state: decoded line waiting to be replayed, and how many times.
    line_repeat: u32,
    repeated_line: Vec<u8>,
}

impl<R: Read> RasterReader<R> {
    /// Open a raster stream, consuming and validating the sync word.
    pub fn new(mut input: R) -> Result<Self, PhomemoError> {
        let mut sync = [0u8; 4];
        input.read_exact(&mut sync).map_err(|e| {
            PhomemoError::InvalidRasterHeader(format!("cannot read sync word: {}", e))
        })?;

        let (version, big_endian) = match &sync {
            b"RaSt" => (Version::V1, true),
            b"tSaR" => (Version::V1, false),
            b"RaS2" => (Version::V2, true),
            b"2SaR" => (Version::V2, false),
            b"RaS3" => (Version::V3, true),
            b"3SaR" => (Version::V3, false),
            other => {
                return Err(PhomemoError::InvalidRasterHeader(format!(
                    "unrecognized sync word {:02X?}",
                    other
                )));
            }
        };

        Ok(Self {
            input,
            version,
            big_endian,
            line_repeat: 0,
            repeated_line: Vec::new(),
        })
    }

    /// Read the next page header, or `None` at clean end of stream.
    pub fn next_page(&mut self) -> Result<Option<PageHeader>, PhomemoError> {
        let size = match self.version {
            Version::V1 => HEADER_SIZE_V1,
            Version::V2 | Version::V3 => HEADER_SIZE_V2,
        };

        let mut block = vec![0u8; size];
        if !read_exact_or_eof(&mut self.input, &mut block)? {
            return Ok(None); // clean EOF before a new page
        }

        let header = PageHeader {
            width: self.field(&block, OFFSET_WIDTH),
            height: self.field(&block, OFFSET_HEIGHT),
            bits_per_pixel: self.field(&block, OFFSET_BITS_PER_PIXEL),
            color_space: self.field(&block, OFFSET_COLOR_SPACE),
            media_type: self.field(&block, OFFSET_MEDIA_TYPE),
            bytes_per_line: self.field(&block, OFFSET_BYTES_PER_LINE),
        };

        // Empty pages skip all validation; the job drops them without
        // reading any lines.
        if !header.is_empty() {
            let min_line = (header.width as u64 * header.bits_per_pixel as u64).div_ceil(8);
            if (header.bytes_per_line as u64) < min_line {
                return Err(PhomemoError::InvalidRasterHeader(format!(
                    "bytes_per_line {} < {} required for width {} at {} bpp",
                    header.bytes_per_line, min_line, header.width, header.bits_per_pixel
                )));
            }
        }

        // Line-repeat state never crosses a page boundary.
        self.line_repeat = 0;
        self.repeated_line.clear();

        Ok(Some(header))
    }

    /// Read one line of pixel data into `line`, whose length must be the
    /// page's `bytes_per_line`.
    pub fn read_line(&mut self, header: &PageHeader, line: &mut [u8]) -> Result<(), PhomemoError> {
        debug_assert_eq!(line.len(), header.bytes_per_line as usize);

        match self.version {
            Version::V1 | Version::V3 => self.input.read_exact(line).map_err(PhomemoError::Io),
            Version::V2 => self.read_line_rle(header, line),
        }
    }

    /// Decode one v2 RLE line (or replay a repeated one).
    fn read_line_rle(&mut self, header: &PageHeader, line: &mut [u8]) -> Result<(), PhomemoError> {
        if self.line_repeat > 0 {
            line.copy_from_slice(&self.repeated_line);
            self.line_repeat -= 1;
            return Ok(());
        }

        let repeat = self.read_byte()?;

        // Pixels narrower than a byte are run-length coded per byte.
        let pixel_size = (header.bits_per_pixel as usize / 8).max(1);

        let mut produced = 0;
        let total = header.bytes_per_line as usize;
        while produced < total {
            let run = self.read_byte()?;
            if run <= 127 {
                // repeated pixel
                let mut pixel = vec![0u8; pixel_size];
                self.input.read_exact(&mut pixel)?;
                for _ in 0..=run {
                    if produced + pixel_size > total {
                        return Err(PhomemoError::InvalidRasterHeader(
                            "RLE run overflows line".to_string(),
                        ));
                    }
                    line[produced..produced + pixel_size].copy_from_slice(&pixel);
                    produced += pixel_size;
                }
            } else {
                // literal pixels
                let count = (257 - run as usize) * pixel_size;
                if produced + count > total {
                    return Err(PhomemoError::InvalidRasterHeader(
                        "RLE literal overflows line".to_string(),
                    ));
                }
                self.input.read_exact(&mut line[produced..produced + count])?;
                produced += count;
            }
        }

        self.repeated_line.clear();
        self.repeated_line.extend_from_slice(line);
        self.line_repeat = repeat as u32;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, PhomemoError> {
        let mut b = [0u8; 1];
        self.input.read_exact(&mut b)?;
        Ok(b[0])
    }

    /// Decode a u32 header field in the stream's byte order.
    fn field(&self, block: &[u8], offset: usize) -> u32 {
        let bytes = [
            block[offset],
            block[offset + 1],
            block[offset + 2],
            block[offset + 3],
        ];
        if self.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        }
    }
}

/// Like `read_exact`, but a clean EOF before the first byte returns
/// `Ok(false)` instead of an error. EOF mid-block is still an error.
fn read_exact_or_eof<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<bool, PhomemoError> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => {
                if filled == 0 {
                    return Ok(false);
                }
                return Err(PhomemoError::InvalidRasterHeader(format!(
                    "truncated page header ({} of {} bytes)",
                    filled,
                    buf.len()
                )));
            }
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PhomemoError::Io(e)),
        }
    }
    Ok(true)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    /// Build a little-endian v2/v3-sized header block.
    fn header_block(width: u32, height: u32, bpp: u32, media: u32, bpl: u32) -> Vec<u8> {
        let mut block = vec![0u8; HEADER_SIZE_V2];
        block[OFFSET_WIDTH..OFFSET_WIDTH + 4].copy_from_slice(&width.to_le_bytes());
        block[OFFSET_HEIGHT..OFFSET_HEIGHT + 4].copy_from_slice(&height.to_le_bytes());
        block[OFFSET_BITS_PER_PIXEL..OFFSET_BITS_PER_PIXEL + 4].copy_from_slice(&bpp.to_le_bytes());
        block[OFFSET_MEDIA_TYPE..OFFSET_MEDIA_TYPE + 4].copy_from_slice(&media.to_le_bytes());
        block[OFFSET_BYTES_PER_LINE..OFFSET_BYTES_PER_LINE + 4].copy_from_slice(&bpl.to_le_bytes());
        block
    }

    #[test]
    fn test_rejects_garbage_sync() {
        let err = RasterReader::new(Cursor::new(b"XXXX".to_vec()));
        assert!(matches!(err, Err(PhomemoError::InvalidRasterHeader(_))));
    }

    #[test]
    fn test_empty_stream_yields_no_pages() {
        let mut stream = b"3SaR".to_vec();
        stream.extend_from_slice(&[]);
        let mut reader = RasterReader::new(Cursor::new(stream)).unwrap();
        assert!(reader.next_page().unwrap().is_none());
    }

    #[test]
    fn test_v3_single_page_roundtrip() {
        let mut stream = b"3SaR".to_vec();
        stream.extend_from_slice(&header_block(2, 2, 8, 10, 2));
        stream.extend_from_slice(&[0, 255, 255, 0]); // two lines

        let mut reader = RasterReader::new(Cursor::new(stream)).unwrap();
        let header = reader.next_page().unwrap().unwrap();
        assert_eq!(header.width, 2);
        assert_eq!(header.height, 2);
        assert_eq!(header.bits_per_pixel, 8);
        assert_eq!(header.media_type, 10);
        assert_eq!(header.bytes_per_line, 2);

        let mut line = vec![0u8; 2];
        reader.read_line(&header, &mut line).unwrap();
        assert_eq!(line, vec![0, 255]);
        reader.read_line(&header, &mut line).unwrap();
        assert_eq!(line, vec![255, 0]);

        assert!(reader.next_page().unwrap().is_none());
    }

    #[test]
    fn test_v3_multiple_pages() {
        let mut stream = b"3SaR".to_vec();
        stream.extend_from_slice(&header_block(1, 1, 8, 0, 1));
        stream.push(0x00);
        stream.extend_from_slice(&header_block(1, 1, 8, 0, 1));
        stream.push(0xFF);

        let mut reader = RasterReader::new(Cursor::new(stream)).unwrap();
        let mut line = vec![0u8; 1];

        let h1 = reader.next_page().unwrap().unwrap();
        reader.read_line(&h1, &mut line).unwrap();
        assert_eq!(line, vec![0x00]);

        let h2 = reader.next_page().unwrap().unwrap();
        reader.read_line(&h2, &mut line).unwrap();
        assert_eq!(line, vec![0xFF]);

        assert!(reader.next_page().unwrap().is_none());
    }

    #[test]
    fn test_big_endian_header_fields() {
        let mut block = vec![0u8; HEADER_SIZE_V2];
        block[OFFSET_WIDTH..OFFSET_WIDTH + 4].copy_from_slice(&384u32.to_be_bytes());
        block[OFFSET_HEIGHT..OFFSET_HEIGHT + 4].copy_from_slice(&1u32.to_be_bytes());
        block[OFFSET_BITS_PER_PIXEL..OFFSET_BITS_PER_PIXEL + 4]
            .copy_from_slice(&8u32.to_be_bytes());
        block[OFFSET_BYTES_PER_LINE..OFFSET_BYTES_PER_LINE + 4]
            .copy_from_slice(&384u32.to_be_bytes());

        let mut stream = b"RaS3".to_vec();
        stream.extend_from_slice(&block);
        stream.extend_from_slice(&[0u8; 384]);

        let mut reader = RasterReader::new(Cursor::new(stream)).unwrap();
        let header = reader.next_page().unwrap().unwrap();
        assert_eq!(header.width, 384);
        assert_eq!(header.bytes_per_line, 384);
    }

    #[test]
    fn test_empty_page_skips_validation() {
        // width 0 with nonsense bytes_per_line must pass through so the
        // job can skip it
        let mut stream = b"3SaR".to_vec();
        stream.extend_from_slice(&header_block(0, 5, 8, 0, 0));

        let mut reader = RasterReader::new(Cursor::new(stream)).unwrap();
        let header = reader.next_page().unwrap().unwrap();
        assert!(header.is_empty());
    }

    #[test]
    fn test_line_invariant_violation_rejected() {
        // width 16 at 8 bpp needs 16 bytes/line, header claims 8
        let mut stream = b"3SaR".to_vec();
        stream.extend_from_slice(&header_block(16, 1, 8, 0, 8));

        let mut reader = RasterReader::new(Cursor::new(stream)).unwrap();
        assert!(matches!(
            reader.next_page(),
            Err(PhomemoError::InvalidRasterHeader(_))
        ));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let mut stream = b"3SaR".to_vec();
        stream.extend_from_slice(&[0u8; 100]); // far short of a header

        let mut reader = RasterReader::new(Cursor::new(stream)).unwrap();
        assert!(matches!(
            reader.next_page(),
            Err(PhomemoError::InvalidRasterHeader(_))
        ));
    }

    #[test]
    fn test_v2_rle_repeated_and_literal_runs() {
        let mut stream = b"2SaR".to_vec();
        stream.extend_from_slice(&header_block(4, 1, 8, 0, 4));
        // line repeat 0 (one line); run: repeat 0x00 twice; literal 2 px
        stream.push(0x00); // line repeat byte
        stream.push(0x01); // run byte: repeat next pixel 2x
        stream.push(0x00); // pixel
        stream.push(0xFF); // run byte: 257-255 = 2 literal pixels
        stream.extend_from_slice(&[0x10, 0x20]);

        let mut reader = RasterReader::new(Cursor::new(stream)).unwrap();
        let header = reader.next_page().unwrap().unwrap();
        let mut line = vec![0u8; 4];
        reader.read_line(&header, &mut line).unwrap();
        assert_eq!(line, vec![0x00, 0x00, 0x10, 0x20]);
    }

    #[test]
    fn test_v2_line_repeat_replays_line() {
        let mut stream = b"2SaR".to_vec();
        stream.extend_from_slice(&header_block(2, 3, 8, 0, 2));
        // one encoded line repeated 3 times (repeat byte 2)
        stream.push(0x02);
        stream.push(0x01); // repeat pixel 2x
        stream.push(0xAB);

        let mut reader = RasterReader::new(Cursor::new(stream)).unwrap();
        let header = reader.next_page().unwrap().unwrap();
        let mut line = vec![0u8; 2];
        for _ in 0..3 {
            reader.read_line(&header, &mut line).unwrap();
            assert_eq!(line, vec![0xAB, 0xAB]);
        }
    }

    #[test]
    fn test_v2_overflowing_run_rejected() {
        let mut stream = b"2SaR".to_vec();
        stream.extend_from_slice(&header_block(2, 1, 8, 0, 2));
        stream.push(0x00); // line repeat
        stream.push(0x7F); // repeat next pixel 128x into a 2-byte line
        stream.push(0xAA);

        let mut reader = RasterReader::new(Cursor::new(stream)).unwrap();
        let header = reader.next_page().unwrap().unwrap();
        let mut line = vec![0u8; 2];
        assert!(matches!(
            reader.read_line(&header, &mut line),
            Err(PhomemoError::InvalidRasterHeader(_))
        ));
    }
}
