//! # Error Types
//!
//! This module defines error types used throughout the phomemo library.
//!
//! The taxonomy mirrors what a print spooler needs to distinguish: whether
//! the device could be reached at all, whether the OS blocked us, whether
//! the connection timed out, or whether an individual write failed. Raster
//! problems get their own variant because a malformed header aborts the job
//! while a zero-sized page is merely skipped.

use std::time::Duration;
use thiserror::Error;

/// Main error type for phomemo operations
#[derive(Debug, Error)]
pub enum PhomemoError {
    /// The address or device path does not resolve to a reachable printer
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// OS access control blocked the transport (permissions, udev rules)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Connection did not complete within the configured bound
    #[error("Connection timeout after {0:?}")]
    ConnectionTimeout(Duration),

    /// A write to the device returned a non-success status
    #[error("Write failed: {0}")]
    WriteFailure(String),

    /// The raster stream or page header is malformed (bad sync word,
    /// inconsistent dimensions, unsupported pixel format)
    #[error("Invalid raster header: {0}")]
    InvalidRasterHeader(String),

    /// An explicitly requested printer model is not in the profile table
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    /// Device URI could not be parsed
    #[error("Invalid device URI: {0}")]
    InvalidUri(String),

    /// Encoder operations called out of order or with mismatched sizes
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
