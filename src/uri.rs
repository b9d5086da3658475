//! # Device URIs
//!
//! The spooler hands the backend a device URI selected at queue setup.
//! Two schemes exist, one per transport:
//!
//! | Scheme | Form | Target |
//! |--------|------|--------|
//! | `phomemo://` | `phomemo://AABBCCDDEEFF` | Bluetooth RFCOMM, compact address |
//! | `phomemo-usb://` | `phomemo-usb:///dev/usb/lp0` | USB printer device node |
//!
//! Bluetooth addresses are accepted in compact (12 hex digits) or
//! colon-separated form; discovery always emits the compact form because
//! CUPS URIs travel better without separators.

use std::fmt;
use std::path::PathBuf;

use crate::error::PhomemoError;

/// URI scheme for Bluetooth targets
pub const SCHEME_BLUETOOTH: &str = "phomemo";

/// URI scheme for USB targets
pub const SCHEME_USB: &str = "phomemo-usb";

/// # Bluetooth Device Address
///
/// Six bytes, stored in display order (`AA:BB:CC:DD:EE:FF` keeps `AA`
/// first). The RFCOMM socket address wants them reversed; see
/// [`BdAddr::socket_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BdAddr(pub [u8; 6]);

impl BdAddr {
    /// Parse a compact (`AABBCCDDEEFF`) or colon-separated
    /// (`AA:BB:CC:DD:EE:FF`) address.
    pub fn parse(s: &str) -> Result<Self, PhomemoError> {
        let compact: String = match s.len() {
            12 => s.to_string(),
            17 if s.as_bytes().iter().skip(2).step_by(3).all(|&b| b == b':') => {
                s.split(':').collect()
            }
            _ => return Err(PhomemoError::InvalidUri(format!("bad Bluetooth address: {}", s))),
        };

        if compact.len() != 12 || !compact.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PhomemoError::InvalidUri(format!("bad Bluetooth address: {}", s)));
        }

        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            // the digits were just validated
            *byte = u8::from_str_radix(&compact[i * 2..i * 2 + 2], 16)
                .map_err(|_| PhomemoError::InvalidUri(format!("bad Bluetooth address: {}", s)))?;
        }
        Ok(Self(bytes))
    }

    /// Address without separators, uppercase (`AABBCCDDEEFF`).
    pub fn compact(&self) -> String {
        self.0.iter().map(|b| format!("{:02X}", b)).collect()
    }

    /// Address bytes in `bdaddr_t` order (reversed, least significant
    /// byte first) as the kernel socket address expects.
    pub fn socket_bytes(&self) -> [u8; 6] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// # Device URI
///
/// A parsed print target: the transport kind plus its address or path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceUri {
    /// Bluetooth RFCOMM target
    Bluetooth(BdAddr),
    /// USB printer device node
    Usb(PathBuf),
}

impl DeviceUri {
    /// Parse a device URI string (typically the `DEVICE_URI` environment
    /// variable).
    pub fn parse(uri: &str) -> Result<Self, PhomemoError> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| PhomemoError::InvalidUri(format!("missing scheme: {}", uri)))?;

        match scheme {
            SCHEME_BLUETOOTH => Ok(Self::Bluetooth(BdAddr::parse(rest)?)),
            SCHEME_USB => {
                if !rest.starts_with('/') {
                    return Err(PhomemoError::InvalidUri(format!(
                        "USB target must be an absolute device path: {}",
                        uri
                    )));
                }
                Ok(Self::Usb(PathBuf::from(rest)))
            }
            other => Err(PhomemoError::InvalidUri(format!("unsupported scheme: {}", other))),
        }
    }
}

impl fmt::Display for DeviceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bluetooth(addr) => write!(f, "{}://{}", SCHEME_BLUETOOTH, addr.compact()),
            Self::Usb(path) => write!(f, "{}://{}", SCHEME_USB, path.display()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
