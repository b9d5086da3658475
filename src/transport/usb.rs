//! # USB Transport
//!
//! Writes to the usblp printer device node (`/dev/usb/lp0` and friends).
//! The kernel's usblp driver owns the bulk-out endpoint and exposes it as
//! a character device, so the transport is a plain synchronous file
//! write, with no async completion to wait for, unlike Bluetooth.
//!
//! Access normally requires membership in the `lp` group; a permission
//! error here is an udev/group problem, not a printer problem.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::error::PhomemoError;

/// # USB Printer Transport
///
/// Owns the open device node for one job. Closed on drop.
#[derive(Debug)]
pub struct UsbTransport {
    file: Option<File>,
}

impl UsbTransport {
    /// Open the printer device node. Synchronous; no settle delay needed.
    ///
    /// ## Errors
    ///
    /// - [`PhomemoError::DeviceNotFound`] if the node does not exist
    ///   (printer unplugged or usblp not bound)
    /// - [`PhomemoError::PermissionDenied`] if the node is not writable
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PhomemoError> {
        let path = path.as_ref();
        let file = OpenOptions::new().write(true).open(path).map_err(|e| {
            let target = path.display().to_string();
            match e.kind() {
                io::ErrorKind::NotFound => PhomemoError::DeviceNotFound(target),
                io::ErrorKind::PermissionDenied => PhomemoError::PermissionDenied(target),
                _ => PhomemoError::Io(e),
            }
        })?;

        Ok(Self { file: Some(file) })
    }

    /// Write one chunk to the device node.
    pub fn write(&mut self, data: &[u8]) -> Result<(), PhomemoError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| PhomemoError::WriteFailure("device is closed".to_string()))?;

        file.write_all(data)
            .and_then(|_| file.flush())
            .map_err(|e| PhomemoError::WriteFailure(format!("usblp write: {}", e)))
    }

    /// Close the device node. Idempotent.
    pub fn close(&mut self) {
        self.file.take();
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// TESTS
// ============================================================================
