//! # Printer Model Profiles
//!
//! This module defines hardware constants for supported Phomemo thermal
//! label printers, plus the device-name and USB-id classification rules
//! that discovery uses to recognize one.
//!
//! ## Supported Printers
//!
//! | Model | Max width (dots) | Paper |
//! |-------|------------------|-------|
//! | M02   | 384              | 53mm continuous |
//! | M110  | 384              | 20-50mm labels |
//! | M120  | 384              | 20-50mm labels |
//! | M220  | 576              | up to 80mm labels |
//! | M421  | 832              | 4" labels |
//! | T02   | 384              | 53mm continuous |
//! | D30   | 96               | 12mm tape |
//!
//! Speed and density defaults come straight from what the vendor apps send
//! (speed 5, density 10); all current models accept the same command set,
//! so the profiles differ only in geometry.
//!
//! ## Device Names
//!
//! Phomemo printers advertise Bluetooth names that contain the model token
//! (e.g. `"M220-1234"`, `"Phomemo M02"`). Some units instead advertise
//! their serial number (e.g. `"Q198G43S2490044"`); those are recognized by
//! shape and classified as [`Model::Generic`].

use crate::error::PhomemoError;

/// Default media type code sent when a page does not specify one.
///
/// Observed values: 10 = gap labels, 11 = continuous paper. The vendor
/// default is 10; jobs can override it (see [`crate::job::JobOptions`]).
pub const DEFAULT_MEDIA_TYPE: u8 = 10;

/// Phomemo USB vendor IDs: MAG Technology and Jieli (used by some M220s).
pub const USB_VENDOR_IDS: &[u16] = &[0x0493, 0x0483];

/// Known USB product ID → model assignments.
pub const USB_PRODUCT_IDS: &[(u16, Model)] = &[
    (0xb002, Model::M02),
    (0x8760, Model::M110),
    (0x8761, Model::M110),
    (0x8762, Model::M120),
    (0x8763, Model::M220),
    (0x8764, Model::M421),
    (0x5740, Model::M220),
];

/// A recognized Phomemo printer model.
///
/// `Generic` covers printers recognized only by their serial-number-shaped
/// Bluetooth name; they get conservative defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    M02,
    M110,
    M120,
    M220,
    M421,
    T02,
    D30,
    Generic,
}

/// Model name tokens searched for (case-insensitively) in device names.
const MODEL_TOKENS: &[(&str, Model)] = &[
    ("M02", Model::M02),
    ("M110", Model::M110),
    ("M120", Model::M120),
    ("M220", Model::M220),
    ("M421", Model::M421),
    ("T02", Model::T02),
    ("D30", Model::D30),
];

impl Model {
    /// Model label as shown in discovery output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::M02 => "M02",
            Self::M110 => "M110",
            Self::M120 => "M120",
            Self::M220 => "M220",
            Self::M421 => "M421",
            Self::T02 => "T02",
            Self::D30 => "D30",
            Self::Generic => "Phomemo",
        }
    }

    /// Make-and-model string for discovery output (e.g. `"Phomemo M220"`).
    pub fn make_and_model(&self) -> String {
        match self {
            Self::Generic => "Phomemo".to_string(),
            other => format!("Phomemo {}", other.label()),
        }
    }

    /// Classify a Bluetooth device name.
    ///
    /// The name is matched case-insensitively against the known model
    /// tokens; if none match, a serial-number-shaped name still qualifies
    /// as [`Model::Generic`]. Returns `None` for anything else.
    ///
    /// ## Example
    ///
    /// ```
    /// use phomemo::profile::Model;
    ///
    /// assert_eq!(Model::from_device_name("PHOMEMO M220-1234"), Some(Model::M220));
    /// assert_eq!(Model::from_device_name("Q198G43S2490044"), Some(Model::Generic));
    /// assert_eq!(Model::from_device_name("Office Printer"), None);
    /// ```
    pub fn from_device_name(name: &str) -> Option<Self> {
        let upper = name.to_uppercase();
        for (token, model) in MODEL_TOKENS {
            if upper.contains(token) {
                return Some(*model);
            }
        }
        if is_serial_number(&upper) {
            return Some(Self::Generic);
        }
        None
    }

    /// Look up a model by USB product ID.
    pub fn from_usb_product_id(product_id: u16) -> Option<Self> {
        USB_PRODUCT_IDS
            .iter()
            .find(|(id, _)| *id == product_id)
            .map(|(_, model)| *model)
    }

    /// Parse an explicitly requested model name (e.g. from an environment
    /// override). Unlike [`Model::from_device_name`] this is strict: an
    /// unknown name is an error, not a generic fallback.
    pub fn parse(name: &str) -> Result<Self, PhomemoError> {
        let upper = name.to_uppercase();
        MODEL_TOKENS
            .iter()
            .find(|(token, _)| *token == upper)
            .map(|(_, model)| *model)
            .ok_or_else(|| PhomemoError::UnsupportedModel(name.to_string()))
    }
}

/// Some printers advertise their serial number as the Bluetooth name,
/// e.g. `Q198G43S2490044`: a letter, 3 digits, a letter, 2 digits, a
/// letter, then the remaining digits.
fn is_serial_number(name: &str) -> bool {
    let b = name.as_bytes();
    if b.len() < 8 {
        return false;
    }
    b[0].is_ascii_uppercase()
        && b[1..4].iter().all(u8::is_ascii_digit)
        && b[4].is_ascii_uppercase()
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7].is_ascii_uppercase()
        && b.len() > 8
        && b[8..].iter().all(u8::is_ascii_digit)
}

/// # Model Profile
///
/// Per-model constants used to build the page header frames. Immutable;
/// selected once per job from the resolved device or model.
#[derive(Debug, Clone, Copy)]
pub struct ModelProfile {
    /// The printer model this profile describes
    pub model: Model,

    /// Print speed (ESC N 0x0D argument)
    pub speed: u8,

    /// Print density (ESC N 0x04 argument)
    pub density: u8,

    /// Media type code sent when the page header carries none
    pub media_type_code: u8,

    /// Maximum printable width in pixels
    pub max_width_px: u16,
}

impl ModelProfile {
    /// Resolve the profile for a model.
    pub fn for_model(model: Model) -> Self {
        let max_width_px = match model {
            Model::M02 | Model::T02 => 384,
            Model::M110 | Model::M120 => 384,
            Model::M220 => 576,
            Model::M421 => 832,
            Model::D30 => 96,
            Model::Generic => 384,
        };
        Self {
            model,
            speed: 5,
            density: 10,
            media_type_code: DEFAULT_MEDIA_TYPE,
            max_width_px,
        }
    }
}

impl Default for ModelProfile {
    fn default() -> Self {
        Self::for_model(Model::Generic)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_token_match_is_case_insensitive() {
        assert_eq!(Model::from_device_name("PHOMEMO M220-1234"), Some(Model::M220));
        assert_eq!(Model::from_device_name("phomemo m220-1234"), Some(Model::M220));
        assert_eq!(Model::from_device_name("Mr.in_M02"), Some(Model::M02));
        assert_eq!(Model::from_device_name("T02"), Some(Model::T02));
        assert_eq!(Model::from_device_name("d30 label maker"), Some(Model::D30));
    }

    #[test]
    fn test_unrelated_names_do_not_match() {
        assert_eq!(Model::from_device_name("Office Printer"), None);
        assert_eq!(Model::from_device_name(""), None);
        assert_eq!(Model::from_device_name("JBL Speaker"), None);
    }

    #[test]
    fn test_serial_number_names_are_generic() {
        assert_eq!(Model::from_device_name("Q198G43S2490044"), Some(Model::Generic));
        assert_eq!(Model::from_device_name("A123B45C6789"), Some(Model::Generic));
    }

    #[test]
    fn test_serial_pattern_shape() {
        assert!(is_serial_number("Q198G43S2490044"));
        assert!(is_serial_number("A123B45C6789"));
        assert!(!is_serial_number("A123B45C")); // no trailing digits
        assert!(!is_serial_number("1123B45C6789")); // starts with digit
        assert!(!is_serial_number("A123B45C67X9")); // letter in digit run
        assert!(!is_serial_number("short"));
    }

    #[test]
    fn test_usb_product_lookup() {
        assert_eq!(Model::from_usb_product_id(0xb002), Some(Model::M02));
        assert_eq!(Model::from_usb_product_id(0x8763), Some(Model::M220));
        assert_eq!(Model::from_usb_product_id(0xffff), None);
    }

    #[test]
    fn test_strict_parse() {
        assert_eq!(Model::parse("m110").unwrap(), Model::M110);
        assert!(matches!(
            Model::parse("M999"),
            Err(PhomemoError::UnsupportedModel(_))
        ));
    }

    #[test]
    fn test_profile_defaults() {
        let profile = ModelProfile::for_model(Model::M110);
        assert_eq!(profile.speed, 5);
        assert_eq!(profile.density, 10);
        assert_eq!(profile.media_type_code, DEFAULT_MEDIA_TYPE);
        assert_eq!(profile.max_width_px, 384);

        assert_eq!(ModelProfile::for_model(Model::M220).max_width_px, 576);
        assert_eq!(ModelProfile::default().model, Model::Generic);
    }
}
