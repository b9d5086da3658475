//! # USB Discovery
//!
//! Walks sysfs for attached USB devices whose vendor id is on the
//! Phomemo allowlist and resolves each to the usblp node the transport
//! would open.
//!
//! ## Sysfs Layout
//!
//! ```text
//! /sys/bus/usb/devices/1-4/          ← one directory per device
//! ├── idVendor                       ← "0493"
//! ├── idProduct                      ← "8760"
//! ├── product                        ← "M110"
//! ├── serial                         ← "Q198G43S2490044"
//! └── 1-4:1.0/                       ← interface
//!     └── usbmisc/
//!         └── lp0                    ← usblp bound here → /dev/usb/lp0
//! ```
//!
//! A matching device without a usblp node (driver not bound) is skipped;
//! there is nothing a transport could open.

use std::fs;
use std::path::Path;

use crate::discovery::DiscoveryRecord;
use crate::profile::{Model, USB_VENDOR_IDS};

/// Where sysfs lists USB devices
const SYSFS_USB_DEVICES: &str = "/sys/bus/usb/devices";

/// Enumerate attached Phomemo USB printers.
pub fn discover() -> Vec<DiscoveryRecord> {
    scan_sysfs(Path::new(SYSFS_USB_DEVICES))
}

/// Walk a sysfs usb-devices directory. Split out so tests can point it
/// at a synthetic tree.
fn scan_sysfs(root: &Path) -> Vec<DiscoveryRecord> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("cannot read {}: {}", root.display(), e);
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for entry in entries.flatten() {
        if let Some(record) = record_for_device(&entry.path()) {
            records.push(record);
        }
    }
    records
}

/// Classify one sysfs device directory.
fn record_for_device(dir: &Path) -> Option<DiscoveryRecord> {
    let vendor_id = read_hex_id(&dir.join("idVendor"))?;
    if !USB_VENDOR_IDS.contains(&vendor_id) {
        return None;
    }

    let product_id = read_hex_id(&dir.join("idProduct"))?;
    let product = read_string(&dir.join("product"));

    // Product id first; fall back to matching the descriptor string.
    let model = Model::from_usb_product_id(product_id)
        .or_else(|| product.as_deref().and_then(Model::from_device_name))?;

    let node = find_usblp_node(dir)?;
    let serial = read_string(&dir.join("serial")).unwrap_or_else(|| "unknown".to_string());
    let name = product.unwrap_or_else(|| model.label().to_string());

    Some(DiscoveryRecord {
        uri: format!("phomemo-usb://{}", node),
        model: model.make_and_model(),
        name,
        address: serial,
    })
}

/// Find the usblp device node for a sysfs device directory by looking
/// for an `<interface>/usbmisc/lpN` entry.
fn find_usblp_node(dir: &Path) -> Option<String> {
    for interface in fs::read_dir(dir).ok()?.flatten() {
        if !interface.file_name().to_string_lossy().contains(':') {
            continue;
        }
        let usbmisc = interface.path().join("usbmisc");
        let Ok(nodes) = fs::read_dir(&usbmisc) else {
            continue;
        };
        for node in nodes.flatten() {
            let name = node.file_name().to_string_lossy().into_owned();
            if name.starts_with("lp") {
                return Some(format!("/dev/usb/{}", name));
            }
        }
    }
    None
}

/// Read a sysfs hex id file ("0493\n" → 0x0493).
fn read_hex_id(path: &Path) -> Option<u16> {
    let contents = fs::read_to_string(path).ok()?;
    u16::from_str_radix(contents.trim(), 16).ok()
}

fn read_string(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    /// Build a synthetic sysfs device directory.
    fn fake_device(
        root: &Path,
        name: &str,
        vendor: &str,
        product_id: &str,
        product: &str,
        serial: &str,
        lp: Option<&str>,
    ) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("idVendor"), format!("{}\n", vendor)).unwrap();
        fs::write(dir.join("idProduct"), format!("{}\n", product_id)).unwrap();
        fs::write(dir.join("product"), format!("{}\n", product)).unwrap();
        fs::write(dir.join("serial"), format!("{}\n", serial)).unwrap();
        if let Some(lp) = lp {
            fs::create_dir_all(dir.join(format!("{}:1.0/usbmisc/{}", name, lp))).unwrap();
        }
    }

    #[test]
    fn test_scan_finds_phomemo_printer() {
        let root = tempfile::tempdir().unwrap();
        fake_device(root.path(), "1-4", "0493", "8760", "M110", "Q198G43S2490044", Some("lp0"));

        let records = scan_sysfs(root.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uri, "phomemo-usb:///dev/usb/lp0");
        assert_eq!(records[0].model, "Phomemo M110");
        assert_eq!(records[0].name, "M110");
        assert_eq!(records[0].address, "Q198G43S2490044");
    }

    #[test]
    fn test_foreign_vendor_is_ignored() {
        let root = tempfile::tempdir().unwrap();
        fake_device(root.path(), "1-1", "04b8", "0202", "EPSON TM-T88", "X1", Some("lp0"));

        assert!(scan_sysfs(root.path()).is_empty());
    }

    #[test]
    fn test_unknown_product_id_falls_back_to_descriptor() {
        let root = tempfile::tempdir().unwrap();
        fake_device(root.path(), "2-1", "0493", "ffff", "Phomemo M220 Label Printer", "S2", Some("lp1"));

        let records = scan_sysfs(root.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model, "Phomemo M220");
        assert_eq!(records[0].uri, "phomemo-usb:///dev/usb/lp1");
    }

    #[test]
    fn test_device_without_usblp_node_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        fake_device(root.path(), "3-1", "0493", "8763", "M220", "S3", None);

        assert!(scan_sysfs(root.path()).is_empty());
    }

    #[test]
    fn test_missing_root_is_empty_not_error() {
        assert!(scan_sysfs(Path::new("/nonexistent/sysfs")).is_empty());
    }
}
