//! # Bluetooth Discovery
//!
//! Enumerates paired Bluetooth devices through `bluetoothctl` and keeps
//! the ones whose name classifies as a Phomemo printer.
//!
//! Only *paired* devices are listed: inquiry scans take ~10 seconds and
//! the spooler calls discovery often. Pairing happens once, out of band.
//!
//! `bluetoothctl devices Paired` is current BlueZ; older releases spell
//! it `bluetoothctl paired-devices`, so that is the fallback.

use std::process::Command;

use crate::discovery::DiscoveryRecord;
use crate::profile::Model;
use crate::uri::BdAddr;

/// Enumerate paired Phomemo printers. Empty on any enumeration failure.
pub fn discover() -> Vec<DiscoveryRecord> {
    let Some(listing) = paired_device_listing() else {
        return Vec::new();
    };
    parse_paired_devices(&listing)
        .into_iter()
        .filter_map(|(address, name)| record_for(&address, &name))
        .collect()
}

/// Look up the paired-device name for `addr`, for classifying a printer
/// the spooler already addresses by URI.
pub fn device_name(addr: &BdAddr) -> Option<String> {
    let listing = paired_device_listing()?;
    parse_paired_devices(&listing)
        .into_iter()
        .find(|(address, _)| {
            BdAddr::parse(address).map(|a| a == *addr).unwrap_or(false)
        })
        .map(|(_, name)| name)
}

/// Run bluetoothctl, trying the current syntax first.
fn paired_device_listing() -> Option<String> {
    for args in [&["devices", "Paired"][..], &["paired-devices"][..]] {
        match Command::new("bluetoothctl").args(args).output() {
            Ok(output) if output.status.success() => {
                return Some(String::from_utf8_lossy(&output.stdout).into_owned());
            }
            Ok(output) => {
                log::debug!(
                    "bluetoothctl {:?} exited {}: {}",
                    args,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Err(e) => {
                log::warn!("cannot run bluetoothctl: {}", e);
                return None;
            }
        }
    }
    None
}

/// Parse `bluetoothctl` device listing output.
///
/// Lines look like `Device AA:BB:CC:DD:EE:FF Some Device Name`; anything
/// else (controller banners, agent chatter) is ignored.
fn parse_paired_devices(listing: &str) -> Vec<(String, String)> {
    listing
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Device ")?;
            let (address, name) = rest.split_once(' ')?;
            Some((address.to_string(), name.to_string()))
        })
        .collect()
}

/// Classify one paired device; `None` if it is not a Phomemo printer or
/// its address does not parse.
fn record_for(address: &str, name: &str) -> Option<DiscoveryRecord> {
    let model = Model::from_device_name(name)?;
    let addr = match BdAddr::parse(address) {
        Ok(addr) => addr,
        Err(e) => {
            log::debug!("skipping {} with unparseable address: {}", name, e);
            return None;
        }
    };

    Some(DiscoveryRecord {
        uri: format!("phomemo://{}", addr.compact()),
        model: model.make_and_model(),
        name: name.to_string(),
        address: addr.to_string(),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_listing_extracts_devices() {
        let listing = "\
Device AA:BB:CC:DD:EE:FF M220-1234
Device 11:22:33:44:55:66 Office Printer
Device 01:02:03:04:05:06 Q198G43S2490044
";
        let devices = parse_paired_devices(listing);
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0], ("AA:BB:CC:DD:EE:FF".to_string(), "M220-1234".to_string()));
        assert_eq!(devices[2].1, "Q198G43S2490044");
    }

    #[test]
    fn test_parse_listing_ignores_chatter() {
        let listing = "\
Agent registered
[NEW] Controller 00:00:00:00:00:00 host [default]
Device AA:BB:CC:DD:EE:FF T02
";
        let devices = parse_paired_devices(listing);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].1, "T02");
    }

    #[test]
    fn test_record_classification() {
        let record = record_for("AA:BB:CC:DD:EE:FF", "PHOMEMO M220-1234").unwrap();
        assert_eq!(record.model, "Phomemo M220");
        assert_eq!(record.uri, "phomemo://AABBCCDDEEFF");
        assert_eq!(record.address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(
            record.device_line(),
            r#"direct phomemo://AABBCCDDEEFF "Phomemo M220" "PHOMEMO M220-1234 (AA:BB:CC:DD:EE:FF)" """#
        );
    }

    #[test]
    fn test_non_printer_yields_no_record() {
        assert_eq!(record_for("AA:BB:CC:DD:EE:FF", "Office Printer"), None);
    }

    #[test]
    fn test_serial_named_printer_is_generic() {
        let record = record_for("AA:BB:CC:DD:EE:FF", "A123B45C6789").unwrap();
        assert_eq!(record.model, "Phomemo");
    }

    #[test]
    fn test_bad_address_is_skipped_not_fatal() {
        assert_eq!(record_for("not-an-address", "M110"), None);
    }
}
