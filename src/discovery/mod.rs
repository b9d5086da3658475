//! # Device Discovery
//!
//! Enumerates candidate Phomemo printers without touching any of them:
//! paired Bluetooth devices classified by name, and attached USB devices
//! classified by vendor/product id. Discovery never opens a transport and
//! never writes; it runs on every spooler poll, so it has to be safe to
//! repeat.
//!
//! Absence of printers is a valid empty result. Enumeration failures
//! (no Bluetooth stack, no sysfs) are logged and swallowed; a backend
//! that errors out of discovery gets disabled by the spooler.
//!
//! ## Output Format
//!
//! Each candidate becomes one stdout line in the CUPS device-list format:
//!
//! ```text
//! direct phomemo://AABBCCDDEEFF "Phomemo M220" "M220-1234 (AA:BB:CC:DD:EE:FF)" ""
//! ```

pub mod bluetooth;
pub mod usb;

/// # Discovery Record
///
/// One candidate printer, produced fresh on every discovery invocation
/// and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    /// Device URI the spooler should store (`phomemo://...` or
    /// `phomemo-usb://...`)
    pub uri: String,
    /// Make-and-model label (e.g. "Phomemo M220")
    pub model: String,
    /// Display name as reported by the device
    pub name: String,
    /// Bluetooth address or USB serial
    pub address: String,
}

impl DiscoveryRecord {
    /// Render the CUPS device-list line for this record.
    pub fn device_line(&self) -> String {
        format!(
            "direct {} \"{}\" \"{} ({})\" \"\"",
            self.uri, self.model, self.name, self.address
        )
    }
}

/// Run both enumeration strategies and collect every candidate.
pub fn discover() -> Vec<DiscoveryRecord> {
    let mut records = bluetooth::discover();
    records.extend(usb::discover());
    records
}

// ============================================================================
// TESTS
// ============================================================================
