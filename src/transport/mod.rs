//! # Printer Transport Layer
//!
//! One byte-sink contract over the two channels a Phomemo printer can be
//! reached on:
//!
//! - [`bluetooth`]: RFCOMM socket (Linux kernel Bluetooth stack)
//! - [`usb`]: the usblp printer device node
//!
//! ## Chunked Writes
//!
//! Label printers have tiny receive buffers and no flow control worth the
//! name. All writes go out in chunks of at most [`CHUNK_SIZE`] bytes with
//! a [`CHUNK_DELAY`] pause between chunks; overrunning the buffer silently
//! drops bytes and ruins the label.
//!
//! ## Lifecycle
//!
//! Exactly one transport is open per job. `close` is idempotent and also
//! runs on drop, so the channel is released on every exit path including
//! failures mid-page.

pub mod bluetooth;
pub mod usb;

use std::thread;
use std::time::Duration;

use crate::error::PhomemoError;
use crate::protocol::FrameSink;
use crate::uri::DeviceUri;

pub use bluetooth::BluetoothTransport;
pub use usb::UsbTransport;

/// Maximum bytes per write call
pub const CHUNK_SIZE: usize = 512;

/// Pacing delay between successive chunks
pub const CHUNK_DELAY: Duration = Duration::from_millis(10);

/// Default bound on connection establishment
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// # Device Transport
///
/// Tagged union over the two channel kinds; everything above this layer
/// sees a single open/write/close contract.
pub enum DeviceTransport {
    Bluetooth(BluetoothTransport),
    Usb(UsbTransport),
}

impl DeviceTransport {
    /// Open a transport for the given target with the default timeout.
    pub fn open(uri: &DeviceUri) -> Result<Self, PhomemoError> {
        Self::open_with_timeout(uri, OPEN_TIMEOUT)
    }

    /// Open a transport, bounding connection establishment by `timeout`.
    ///
    /// Bluetooth open completes asynchronously in the kernel; the call
    /// blocks in a poll loop until the channel is up, the connect fails,
    /// or the timeout elapses. USB open is synchronous.
    pub fn open_with_timeout(uri: &DeviceUri, timeout: Duration) -> Result<Self, PhomemoError> {
        match uri {
            DeviceUri::Bluetooth(addr) => {
                Ok(Self::Bluetooth(BluetoothTransport::open(addr, timeout)?))
            }
            DeviceUri::Usb(path) => Ok(Self::Usb(UsbTransport::open(path)?)),
        }
    }

    /// Write all of `data`, chunked and paced.
    ///
    /// The first write error aborts; there is no partial-frame resume,
    /// the job is dead anyway.
    pub fn write_all(&mut self, data: &[u8]) -> Result<(), PhomemoError> {
        let mut chunks = data.chunks(CHUNK_SIZE).peekable();
        while let Some(chunk) = chunks.next() {
            self.write_chunk(chunk)?;
            if chunks.peek().is_some() {
                thread::sleep(CHUNK_DELAY);
            }
        }
        Ok(())
    }

    /// Write one chunk (at most [`CHUNK_SIZE`] bytes) to the channel.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), PhomemoError> {
        debug_assert!(chunk.len() <= CHUNK_SIZE);
        match self {
            Self::Bluetooth(t) => t.write(chunk),
            Self::Usb(t) => t.write(chunk),
        }
    }

    /// Best-effort wait for the printer's completion status after the
    /// last page. Bluetooth printers send a short status reply when the
    /// label finishes; closing the channel before it arrives can stop the
    /// print mid-label. Never fails the job.
    pub fn wait_for_completion(&mut self) {
        if let Self::Bluetooth(t) = self {
            match t.read_status() {
                Ok(Some(reply)) => log::debug!("printer status reply: {:02X?}", reply),
                Ok(None) => log::debug!("no status reply before timeout"),
                Err(e) => log::debug!("status read failed (non-fatal): {}", e),
            }
        }
    }

    /// Release the channel. Idempotent; also safe after a failed write.
    pub fn close(&mut self) {
        match self {
            Self::Bluetooth(t) => t.close(),
            Self::Usb(t) => t.close(),
        }
    }
}

impl FrameSink for DeviceTransport {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), PhomemoError> {
        self.write_all(frame)
    }
}

impl Drop for DeviceTransport {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_constants() {
        // The printer-side receive buffer tolerates 512-byte bursts;
        // these values are load-bearing, not tuning knobs.
        assert_eq!(CHUNK_SIZE, 512);
        assert_eq!(CHUNK_DELAY, Duration::from_millis(10));
        assert_eq!(OPEN_TIMEOUT, Duration::from_secs(10));
    }

    #[test]
    fn test_open_unreachable_usb_target_not_found() {
        let uri = DeviceUri::parse("phomemo-usb:///dev/usb/lp-does-not-exist").unwrap();
        match DeviceTransport::open(&uri) {
            Err(PhomemoError::DeviceNotFound(_)) => {}
            other => panic!("expected DeviceNotFound, got {:?}", other.err()),
        }
    }
}
