//! Finds the device a GUID-list firmware requirement refers to

use crate::device::Device;
use crate::error::{Error, Result};
use crate::topology::DeviceList;

/// Where a GUID-list requirement landed
#[derive(Debug)]
pub enum Resolved<'a> {
    /// Compare against this device
    Device(&'a Device),
    /// Root device carrying the GUID itself; nothing further to compare
    SelfMatched,
}

pub struct TopologyResolver<'a> {
    devices: &'a DeviceList,
}

impl<'a> TopologyResolver<'a> {
    pub fn new(devices: &'a DeviceList) -> Self {
        Self { devices }
    }

    /// Resolve `guids` relative to `device`
    ///
    /// `device` is the requirement's device, already moved up by any
    /// positive depth.
    /// - no depth: first device anywhere carrying one of the GUIDs
    /// - `-1`: first child carrying one of the GUIDs
    /// - `0`: first sibling carrying one; a root device must carry one itself
    /// - `> 0`: the ancestor itself must carry one
    pub fn resolve<'b>(
        &self,
        device: &'b Device,
        guids: &[String],
        depth: Option<i64>,
    ) -> Result<Resolved<'b>>
    where
        'a: 'b,
    {
        let list = guids.join("|");
        match depth {
            None => guids
                .iter()
                .find_map(|g| self.devices.find_by_guid(g))
                .map(Resolved::Device)
                .ok_or_else(|| Error::NotSupported(format!("No other device {} found", list))),
            Some(d) if d < 0 => self
                .devices
                .children(&device.id)
                .into_iter()
                .find(|c| c.has_guids_any(guids))
                .map(Resolved::Device)
                .ok_or_else(|| {
                    Error::NotSupported(format!("No child found with GUID of {}", list))
                }),
            Some(0) => {
                if self.devices.parent(&device.id).is_none() {
                    if !device.has_guids_any(guids) {
                        return Err(Error::NotSupported(format!(
                            "No GUID of {} on device {}",
                            list, device.name
                        )));
                    }
                    return Ok(Resolved::SelfMatched);
                }
                self.devices
                    .siblings(&device.id)
                    .into_iter()
                    .find(|s| s.has_guids_any(guids))
                    .map(Resolved::Device)
                    .ok_or_else(|| {
                        Error::NotSupported(format!("No sibling found with GUID of {}", list))
                    })
            }
            Some(_) => {
                if !device.has_guids_any(guids) {
                    return Err(Error::NotSupported(format!(
                        "No GUID of {} on parent device {}",
                        list, device.name
                    )));
                }
                Ok(Resolved::Device(device))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceId;

    const GUID: &str = "1ff60ab2-3905-06a1-b476-0371f00c9e9b";

    fn guids() -> Vec<String> {
        vec![GUID.to_string()]
    }

    fn list() -> DeviceList {
        let mut list = DeviceList::new();
        for id in ["root", "a", "b"] {
            list.add(Device::new(DeviceId::from_hwid(id), id));
        }
        let root = DeviceId::from_hwid("root");
        list.add_child(&root, &DeviceId::from_hwid("a")).unwrap();
        list.add_child(&root, &DeviceId::from_hwid("b")).unwrap();
        list
    }

    fn tag(list: &mut DeviceList, id: &str) {
        if let Some(d) = list.get_mut(&DeviceId::from_hwid(id)) {
            d.add_guid(GUID);
        }
    }

    #[test]
    fn test_sibling() {
        let mut devices = list();
        let a = devices.get(&DeviceId::from_hwid("a")).unwrap().clone();
        let err = TopologyResolver::new(&devices)
            .resolve(&a, &guids(), Some(0))
            .unwrap_err();
        assert_eq!(err.message(), format!("No sibling found with GUID of {}", GUID));

        // the device itself is not its own sibling
        tag(&mut devices, "a");
        let a = devices.get(&DeviceId::from_hwid("a")).unwrap().clone();
        assert!(TopologyResolver::new(&devices)
            .resolve(&a, &guids(), Some(0))
            .is_err());

        tag(&mut devices, "b");
        let resolved = TopologyResolver::new(&devices)
            .resolve(&a, &guids(), Some(0))
            .unwrap();
        assert!(matches!(resolved, Resolved::Device(d) if d.name == "b"));
    }

    #[test]
    fn test_root_sibling_checks_self() {
        let mut devices = list();
        let root = DeviceId::from_hwid("root");
        let dev = devices.get(&root).unwrap().clone();
        let err = TopologyResolver::new(&devices)
            .resolve(&dev, &guids(), Some(0))
            .unwrap_err();
        assert_eq!(err.message(), format!("No GUID of {} on device root", GUID));

        tag(&mut devices, "root");
        let dev = devices.get(&root).unwrap();
        assert!(matches!(
            TopologyResolver::new(&devices).resolve(dev, &guids(), Some(0)),
            Ok(Resolved::SelfMatched)
        ));
    }

    #[test]
    fn test_child_and_fleet() {
        let mut devices = list();
        tag(&mut devices, "b");
        let root = devices.get(&DeviceId::from_hwid("root")).unwrap();
        let resolver = TopologyResolver::new(&devices);
        assert!(matches!(
            resolver.resolve(root, &guids(), Some(-1)),
            Ok(Resolved::Device(d)) if d.name == "b"
        ));
        let a = devices.get(&DeviceId::from_hwid("a")).unwrap();
        assert!(matches!(
            resolver.resolve(a, &guids(), None),
            Ok(Resolved::Device(d)) if d.name == "b"
        ));
        assert!(resolver.resolve(a, &guids(), Some(-1)).is_err());
    }

    #[test]
    fn test_parent_must_carry_guid() {
        let devices = list();
        let root = devices.get(&DeviceId::from_hwid("root")).unwrap();
        let err = TopologyResolver::new(&devices)
            .resolve(root, &guids(), Some(1))
            .unwrap_err();
        assert_eq!(
            err.message(),
            format!("No GUID of {} on parent device root", GUID)
        );
    }
}
