//! Device fleet description loaded from TOML

use firmgate_core::{Device, DeviceFlags, DeviceId, DeviceList, VersionFormat};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Failed to read fleet: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse fleet: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Unknown device flag '{flag}' on {device}")]
    UnknownFlag { device: String, flag: String },
    #[error("Invalid device graph: {0}")]
    Topology(#[from] firmgate_core::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FleetFile {
    #[serde(default, rename = "device")]
    pub devices: Vec<FleetDevice>,
}

/// One `[[device]]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FleetDevice {
    pub id: String,
    pub name: Option<String>,
    /// Id of the parent device
    pub parent: Option<String>,
    pub version: Option<String>,
    pub version_format: VersionFormat,
    pub version_lowest: Option<String>,
    pub version_bootloader: Option<String>,
    pub branch: Option<String>,
    pub guids: Vec<String>,
    pub instance_ids: Vec<String>,
    pub vendor_ids: Vec<String>,
    pub protocols: Vec<String>,
    /// Flag names such as `updatable` or `enforce-requires`
    pub flags: Vec<String>,
    pub update_error: Option<String>,
}

fn parse_flag(name: &str) -> Option<DeviceFlags> {
    DeviceFlags::from_name(&name.replace('-', "_").to_ascii_uppercase())
}

impl FleetDevice {
    fn to_device(&self) -> Result<Device, FleetError> {
        let mut device = Device::new(
            DeviceId::from_hwid(&self.id),
            self.name.as_deref().unwrap_or(&self.id),
        );
        if let Some(version) = &self.version {
            device.set_version(version, self.version_format);
        } else {
            device.version_format = self.version_format;
        }
        device.version_lowest = self.version_lowest.clone();
        device.version_bootloader = self.version_bootloader.clone();
        device.branch = self.branch.clone();
        device.update_error = self.update_error.clone();
        for guid in &self.guids {
            device.add_guid(guid);
        }
        for instance_id in &self.instance_ids {
            device.add_instance_id(instance_id);
        }
        for vendor_id in &self.vendor_ids {
            device.add_vendor_id(vendor_id);
        }
        for protocol in &self.protocols {
            device.add_protocol(protocol);
        }
        for name in &self.flags {
            let flag = parse_flag(name).ok_or_else(|| FleetError::UnknownFlag {
                device: self.id.clone(),
                flag: name.clone(),
            })?;
            device.add_flag(flag);
        }
        Ok(device)
    }
}

impl FleetFile {
    pub fn from_toml(content: &str) -> Result<Self, FleetError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, FleetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Build the device graph; parents may be listed after their children
    pub fn into_device_list(self) -> Result<DeviceList, FleetError> {
        let mut list = DeviceList::new();
        for entry in &self.devices {
            list.add(entry.to_device()?);
        }
        for entry in &self.devices {
            if let Some(parent) = &entry.parent {
                list.add_child(&DeviceId::from_hwid(parent), &DeviceId::from_hwid(&entry.id))?;
            }
        }
        debug!(devices = list.len(), "loaded fleet");
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FLEET: &str = r#"
[[device]]
id = "dock-ec"
name = "Dock EC"
parent = "dock"
version = "1.2.3"
version_format = "triplet"
instance_ids = ["USB\\VID_273F&PID_1004"]
flags = ["updatable", "enforce-requires"]

[[device]]
id = "dock"
name = "Dock"
version = "4.5.6"
guids = ["1FF60AB2-3905-06A1-B476-0371F00C9E9B"]
vendor_ids = ["USB:0x273F"]
protocols = ["com.acme.dfu"]
"#;

    #[test]
    fn test_load_fleet() {
        let list = FleetFile::from_toml(FLEET)
            .unwrap()
            .into_device_list()
            .unwrap();
        assert_eq!(list.len(), 2);

        let ec = DeviceId::from_hwid("dock-ec");
        let device = list.get(&ec).unwrap();
        assert_eq!(device.name, "Dock EC");
        assert_eq!(device.version_format, VersionFormat::Triplet);
        assert!(device.has_flag(DeviceFlags::UPDATABLE | DeviceFlags::ENFORCE_REQUIRES));
        assert_eq!(device.guids.len(), 1);
        assert_eq!(list.parent(&ec).unwrap().name, "Dock");

        let dock = list.get(&DeviceId::from_hwid("dock")).unwrap();
        assert!(dock.has_guid("1ff60ab2-3905-06a1-b476-0371f00c9e9b"));
        assert!(!dock.is_updatable());
    }

    #[test]
    fn test_unknown_flag() {
        let err = FleetFile::from_toml("[[device]]\nid = \"a\"\nflags = [\"shiny\"]\n")
            .unwrap()
            .into_device_list()
            .unwrap_err();
        assert!(matches!(err, FleetError::UnknownFlag { .. }));
    }

    #[test]
    fn test_missing_parent() {
        let err = FleetFile::from_toml("[[device]]\nid = \"a\"\nparent = \"ghost\"\n")
            .unwrap()
            .into_device_list()
            .unwrap_err();
        assert!(matches!(err, FleetError::Topology(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", FLEET).unwrap();
        let fleet = FleetFile::from_file(file.path()).unwrap();
        assert_eq!(fleet.devices.len(), 2);
    }
}
