//! Electronic control module reference table
//!
//! Diagnostic frames carry the target module in their second payload byte.
//! The low-speed table is what the decoder annotates; the hi-speed list is
//! reference text only.

/// A known electronic control module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Module code as found in the payload
    pub code: u8,
    /// Three-letter mnemonic
    pub mnemonic: &'static str,
    /// Long name
    pub description: &'static str,
    /// Diagnostic address the module answers on, if documented
    pub address: Option<[u8; 4]>,
}

const fn module(
    code: u8,
    mnemonic: &'static str,
    description: &'static str,
    address: Option<[u8; 4]>,
) -> ModuleInfo {
    ModuleInfo {
        code,
        mnemonic,
        description,
        address,
    }
}

/// Modules decoded from the second payload byte
pub const LOW_SPEED_MODULES: &[ModuleInfo] = &[
    module(0x40, "CEM", "Central Electronic Module", Some([0x00, 0x80, 0x00, 0x03])),
    module(0x51, "DIM", "Driver Information Module", Some([0x00, 0x80, 0x00, 0x09])),
    module(0x48, "SWM", "Steering Wheel Module", Some([0x00, 0x80, 0x08, 0x01])),
    module(0x29, "CCM", "Climate Control Module", Some([0x00, 0x80, 0x10, 0x01])),
    module(0x43, "DDM", "Driver Door Module", Some([0x00, 0x80, 0x00, 0x11])),
    module(0x45, "PDM", "Passenger Door Module", Some([0x00, 0x80, 0x00, 0x81])),
    module(0x2e, "PSM", "Power Seat Module", Some([0x00, 0x80, 0x01, 0x01])),
    module(0x46, "REM", "Rear Electronic Module", Some([0x00, 0x80, 0x04, 0x01])),
    module(0x58, "SRS", "Air bag", Some([0x00, 0x80, 0x02, 0x01])),
    module(0x47, "UEM", "Upper Electronic Module", Some([0x00, 0x80, 0x20, 0x01])),
    module(0x60, "AUM", "Audio Module", Some([0x00, 0x80, 0x00, 0x05])),
    module(0x64, "PHM", "Phone Module", Some([0x00, 0x80, 0x00, 0x21])),
    module(0x1b, "MUM", "", None),
];

/// Modules on the hi-speed network (not decoded, printed for reference)
pub const HIGH_SPEED_MODULES: &[ModuleInfo] = &[
    module(0x50, "CEM", "Central Electronic Module (Hi-speed interface)", None),
    module(0x01, "BCM", "Break Control Module (hi-speed network)", None),
    module(0x52, "AEM", "Accessory Electronic Module", None),
    module(0x11, "ECM", "Engine Control Module (hi-speed network)", None),
    module(0x28, "SAS", "Steering Angle Sensor (hi-speed network)", None),
    module(0x6e, "TCM", "Transmission Control Module (hi-speed network)", None),
    module(0x62, "RTI", "Road Traffic Information module", None),
];

/// Find a low-speed module by code
pub fn lookup(code: u8) -> Option<&'static ModuleInfo> {
    LOW_SPEED_MODULES.iter().find(|m| m.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<u8> = LOW_SPEED_MODULES.iter().map(|m| m.code).collect();
        assert_eq!(codes.len(), LOW_SPEED_MODULES.len());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(0x40).map(|m| m.mnemonic), Some("CEM"));
        assert_eq!(lookup(0x1b).map(|m| m.mnemonic), Some("MUM"));
        // Hi-speed codes are not part of the decode table
        assert!(lookup(0x50).is_none());
        assert!(lookup(0x11).is_none());
    }
}
