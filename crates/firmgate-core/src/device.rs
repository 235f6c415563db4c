//! Device types the requirements engine reads

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::guid;
use crate::version::VersionFormat;

/// Unique identifier for a device
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    /// Create a new DeviceId from a hardware ID string
    pub fn from_hwid(hwid: &str) -> Self {
        Self(hwid.to_string())
    }

    /// Create a new DeviceId from raw bytes (e.g., chip unique ID)
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Stable id derived from a physical id such as a sysfs path
    pub fn from_physical_id(physical_id: &str) -> Self {
        Self::from_bytes(&Sha256::digest(physical_id.as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Device state relevant to update admission
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DeviceFlags: u32 {
        /// Device can be updated
        const UPDATABLE = 1 << 0;
        /// Updatable, but not shown to the user until a problem is fixed
        const UPDATABLE_HIDDEN = 1 << 1;
        /// Internal to the machine rather than removable
        const INTERNAL = 1 << 2;
        /// Loaded from an emulation recording
        const EMULATED = 1 << 3;
        const ONLY_OFFLINE = 1 << 4;
        const ONLY_VERSION_UPGRADE = 1 << 5;
        /// Generic GUIDs only; releases must carry a specific requirement
        const ENFORCE_REQUIRES = 1 << 6;
        const LOCKED = 1 << 7;
        /// Releases must check the installed version
        const VERSION_CHECK_REQUIRED = 1 << 8;
    }
}

/// A device as seen by the requirements engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Current firmware version
    pub version: Option<String>,
    pub version_format: VersionFormat,
    /// Lowest version the device may be downgraded to
    pub version_lowest: Option<String>,
    pub version_bootloader: Option<String>,
    /// Firmware branch; `None` is the default branch
    pub branch: Option<String>,
    /// Vendor identifiers such as `USB:0x273F`
    pub vendor_ids: Vec<String>,
    pub guids: Vec<String>,
    pub instance_ids: Vec<String>,
    /// Update protocols the device speaks
    pub protocols: Vec<String>,
    pub flags: DeviceFlags,
    /// Reason the device cannot currently be updated
    pub update_error: Option<String>,
}

impl Device {
    /// Create a new device with minimal information
    pub fn new(id: DeviceId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn has_flag(&self, flag: DeviceFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn add_flag(&mut self, flag: DeviceFlags) {
        self.flags.insert(flag);
    }

    pub fn is_updatable(&self) -> bool {
        self.flags
            .intersects(DeviceFlags::UPDATABLE | DeviceFlags::UPDATABLE_HIDDEN)
    }

    pub fn set_version(&mut self, version: &str, format: VersionFormat) {
        self.version = Some(version.to_string());
        self.version_format = format;
    }

    pub fn has_guid(&self, guid: &str) -> bool {
        self.guids.iter().any(|g| g.eq_ignore_ascii_case(guid))
    }

    pub fn has_guids_any(&self, guids: &[String]) -> bool {
        guids.iter().any(|g| self.has_guid(g))
    }

    pub fn add_guid(&mut self, guid: &str) {
        if !self.has_guid(guid) {
            self.guids.push(guid.to_ascii_lowercase());
        }
    }

    /// Add an instance id and the GUID derived from it
    ///
    /// A value that already is a GUID is added as-is.
    pub fn add_instance_id(&mut self, instance_id: &str) {
        if guid::is_valid(instance_id) {
            self.add_guid(instance_id);
            return;
        }
        if !self.instance_ids.iter().any(|i| i == instance_id) {
            self.instance_ids.push(instance_id.to_string());
        }
        self.add_guid(&guid::from_instance_id(instance_id));
    }

    pub fn add_vendor_id(&mut self, vendor_id: &str) {
        if !self.vendor_ids.iter().any(|v| v == vendor_id) {
            self.vendor_ids.push(vendor_id.to_string());
        }
    }

    pub fn add_protocol(&mut self, protocol: &str) {
        if !self.has_protocol(protocol) {
            self.protocols.push(protocol.to_string());
        }
    }

    pub fn has_protocol(&self, protocol: &str) -> bool {
        self.protocols.iter().any(|p| p == protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_from_hwid() {
        let id = DeviceId::from_hwid("0x12345678");
        assert_eq!(id.as_str(), "0x12345678");
    }

    #[test]
    fn test_device_id_from_bytes() {
        let id = DeviceId::from_bytes(&[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(id.as_str(), "12345678");
    }

    #[test]
    fn test_device_id_from_physical_id() {
        let a = DeviceId::from_physical_id("/sys/devices/pci0000:00/0000:00:14.0");
        let b = DeviceId::from_physical_id("/sys/devices/pci0000:00/0000:00:14.0");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert_ne!(a, DeviceId::from_physical_id("usb:01:00"));
    }

    #[test]
    fn test_add_instance_id() {
        let mut device = Device::new(DeviceId::from_hwid("dev"), "Device");
        device.add_instance_id("1FF60AB2-3905-06A1-B476-0371F00C9E9B");
        assert!(device.has_guid("1ff60ab2-3905-06a1-b476-0371f00c9e9b"));
        assert!(device.instance_ids.is_empty());

        device.add_instance_id("USB\\VID_273F&PID_1004");
        device.add_instance_id("USB\\VID_273F&PID_1004");
        assert_eq!(device.instance_ids.len(), 1);
        assert!(device.has_guid(&guid::from_instance_id("USB\\VID_273F&PID_1004")));
        assert_eq!(device.guids.len(), 2);
    }

    #[test]
    fn test_updatable_flags() {
        let mut device = Device::new(DeviceId::from_hwid("dev"), "Device");
        assert!(!device.is_updatable());
        device.add_flag(DeviceFlags::UPDATABLE_HIDDEN);
        assert!(device.is_updatable());
        assert!(!device.has_flag(DeviceFlags::LOCKED));
    }
}
