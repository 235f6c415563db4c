//! Per-kind evaluation of a single requirement

use regex::Regex;
use tracing::debug;

use crate::context::EngineContext;
use crate::device::{Device, DeviceFlags};
use crate::error::{Error, Result};
use crate::predicate::{CompareOp, Predicate, Verdict};
use crate::release::Release;
use crate::request::InstallFlags;
use crate::requirement::{ClientToken, FirmwareTarget, Requirement};
use crate::resolver::{Resolved, TopologyResolver};
use crate::topology::DeviceList;
use crate::version::{self, VersionFormat};

/// Outcome of running a predicate, with the details failure messages need
enum Outcome {
    Pass,
    Fail { required: String, detail: String },
}

fn run_predicate(predicate: &Predicate, actual: &str, format: VersionFormat) -> Outcome {
    match predicate.evaluate(actual, format) {
        Ok(Verdict::Satisfied) | Ok(Verdict::NotApplicable) => Outcome::Pass,
        Ok(Verdict::Unsatisfied { required, message }) => Outcome::Fail {
            required,
            detail: message,
        },
        Err(e) => Outcome::Fail {
            required: predicate.raw_version().to_string(),
            detail: e.message().to_string(),
        },
    }
}

fn is_ge(predicate: &Predicate) -> bool {
    predicate.op == Some(CompareOp::Ge)
}

/// Evaluates requirements of one release against one device
pub struct Evaluator<'a> {
    ctx: &'a EngineContext,
    devices: &'a DeviceList,
    release: &'a Release,
    device: Option<&'a Device>,
    flags: InstallFlags,
    /// Highest engine version the release declares it needs
    engine_version: &'a str,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        ctx: &'a EngineContext,
        devices: &'a DeviceList,
        release: &'a Release,
        device: Option<&'a Device>,
        flags: InstallFlags,
        engine_version: &'a str,
    ) -> Self {
        Self {
            ctx,
            devices,
            release,
            device,
            flags,
            engine_version,
        }
    }

    pub fn evaluate(&self, req: &Requirement) -> Result<()> {
        match req {
            Requirement::Id { target, predicate } => self.check_id(target, predicate),
            Requirement::Firmware {
                target,
                depth,
                predicate,
            } => match self.device {
                Some(device) => self.check_firmware(device, target, *depth, predicate),
                None => Ok(()),
            },
            Requirement::Hardware { guids } => {
                if !self.ctx.hwids.loaded {
                    return Ok(());
                }
                if self
                    .device
                    .is_some_and(|d| d.has_flag(DeviceFlags::EMULATED))
                {
                    return Ok(());
                }
                self.check_hardware(guids)
            }
            Requirement::NotHardware { guids } => {
                if !self.ctx.hwids.loaded {
                    return Ok(());
                }
                self.check_not_hardware(guids)
            }
            Requirement::Client { tokens } => self.check_client(tokens),
        }
    }

    /// Fail unless the release declares at least `min` of the engine
    fn require_engine(&self, what: &str, min: &str) -> Result<()> {
        if version::compare(self.engine_version, min, VersionFormat::Unknown).is_lt() {
            return Err(Error::NotSupported(format!(
                "requirement '{}' also needs {} >= {}",
                what, self.ctx.engine_id, min
            )));
        }
        Ok(())
    }

    fn check_id(&self, target: &str, predicate: &Predicate) -> Result<()> {
        let actual = self
            .ctx
            .runtime_versions
            .get(target)
            .ok_or_else(|| Error::NotFound(format!("no version available for {}", target)))?;

        match run_predicate(predicate, actual, VersionFormat::Unknown) {
            Outcome::Pass => {
                debug!(
                    "requirement {} {} {} -> {} passed",
                    predicate.raw_version(),
                    predicate.op.map(|op| op.as_str()).unwrap_or_default(),
                    actual,
                    target
                );
                Ok(())
            }
            Outcome::Fail { required, detail } => Err(Error::InvalidFile(if is_ge(predicate) {
                format!(
                    "Not compatible with {} version {}, requires >= {}",
                    target, actual, required
                )
            } else {
                format!("Not compatible with {} version: {}", target, detail)
            })),
        }
    }

    fn check_firmware(
        &self,
        device: &Device,
        target: &FirmwareTarget,
        depth: Option<i64>,
        predicate: &Predicate,
    ) -> Result<()> {
        let actual_device = match depth {
            Some(hops) if hops > 0 => self.devices.ancestor(&device.id, hops.unsigned_abs())?,
            _ => device,
        };

        match depth {
            Some(hops) if hops < 0 => self.require_engine("child firmware", "1.9.7")?,
            Some(0) => self.require_engine("sibling firmware", "1.6.1")?,
            Some(1) => self.require_engine("parent firmware", "1.3.4")?,
            _ => {}
        }

        match target {
            FirmwareTarget::Runtime => self.check_own_version(actual_device, predicate),
            FirmwareTarget::Bootloader => self.check_bootloader(actual_device, predicate),
            FirmwareTarget::VendorId { pattern } => {
                if self.flags.contains(InstallFlags::IGNORE_VID_PID) {
                    return Ok(());
                }
                self.check_vendor_id(actual_device, pattern.as_deref())
            }
            FirmwareTarget::NotChild => self.check_not_child(actual_device, predicate),
            FirmwareTarget::OtherDevice { guids } => {
                self.check_other_device(actual_device, guids, depth, predicate)
            }
        }
    }

    fn check_own_version(&self, device: &Device, predicate: &Predicate) -> Result<()> {
        let actual = device.version.as_deref().ok_or_else(|| {
            Error::NotSupported(format!("no version provided by {}", device.name))
        })?;
        match run_predicate(predicate, actual, device.version_format) {
            Outcome::Pass => Ok(()),
            Outcome::Fail { required, detail } => Err(Error::InvalidFile(if is_ge(predicate) {
                format!(
                    "Not compatible with firmware version {}, requires >= {}",
                    actual, required
                )
            } else {
                format!("Not compatible with firmware version: {}", detail)
            })),
        }
    }

    fn check_bootloader(&self, device: &Device, predicate: &Predicate) -> Result<()> {
        let actual = device.version_bootloader.as_deref().ok_or_else(|| {
            Error::NotSupported(format!("no bootloader version provided by {}", device.name))
        })?;
        match run_predicate(predicate, actual, device.version_format) {
            Outcome::Pass => Ok(()),
            Outcome::Fail { required, .. } if is_ge(predicate) => {
                Err(Error::NotSupported(format!(
                    "Not compatible with bootloader version {}, requires >= {}",
                    actual, required
                )))
            }
            Outcome::Fail { detail, .. } => {
                debug!(device = %device.id, "Bootloader is not compatible: {}", detail);
                Err(Error::NotSupported("Bootloader is not compatible".to_string()))
            }
        }
    }

    fn check_vendor_id(&self, device: &Device, pattern: Option<&str>) -> Result<()> {
        if device.vendor_ids.is_empty() {
            return Err(Error::NotSupported(format!(
                "device [{}] has no vendor ID",
                device.id
            )));
        }
        let pattern =
            pattern.ok_or_else(|| Error::NotSupported("metadata has no vendor ID".to_string()))?;
        let re = Regex::new(pattern).map_err(|e| {
            Error::InvalidFile(format!("invalid vendor ID regex {}: {}", pattern, e))
        })?;

        let vendor_ids = device.vendor_ids.join("|");
        if !re.is_match(&vendor_ids) {
            return Err(Error::InvalidFile(format!(
                "Not compatible with vendor {}: got {}",
                vendor_ids, pattern
            )));
        }
        Ok(())
    }

    fn check_not_child(&self, device: &Device, predicate: &Predicate) -> Result<()> {
        for child in self.devices.children(&device.id) {
            let actual = child.version.as_deref().ok_or_else(|| {
                Error::NotSupported(format!(
                    "no version provided by {}, child of {}",
                    child.name, device.name
                ))
            })?;
            if predicate.holds(actual, child.version_format) {
                return Err(Error::NotSupported(format!(
                    "Not compatible with child device version {}",
                    actual
                )));
            }
        }
        Ok(())
    }

    fn check_other_device(
        &self,
        device: &Device,
        guids: &[String],
        depth: Option<i64>,
        predicate: &Predicate,
    ) -> Result<()> {
        let resolver = TopologyResolver::new(self.devices);
        let other = match resolver.resolve(device, guids, depth)? {
            Resolved::SelfMatched => return Ok(()),
            Resolved::Device(other) => other,
        };

        if depth.is_none() {
            if other.version.is_some() {
                self.require_engine("firmware with version", "1.1.0")?;
            } else {
                self.require_engine("firmware no version", "1.2.11")?;
            }
        }

        // a target without a version is never compared
        let Some(actual) = other.version.as_deref() else {
            return Ok(());
        };
        if predicate.op.is_none() {
            return Ok(());
        }
        match run_predicate(predicate, actual, other.version_format) {
            Outcome::Pass => Ok(()),
            Outcome::Fail { required, detail } => Err(Error::InvalidFile(if is_ge(predicate) {
                format!(
                    "Not compatible with {} version {}, requires >= {}",
                    other.name, actual, required
                )
            } else {
                format!("Not compatible with {}: {}", other.name, detail)
            })),
        }
    }

    fn check_hardware(&self, guids: &[String]) -> Result<()> {
        let min = if guids.len() > 1 { "1.0.8" } else { "1.0.1" };
        self.require_engine("hardware", min)?;

        if let Some(guid) = guids.iter().find(|g| self.ctx.hwids.contains(g)) {
            debug!(hwid = %guid, "HWID provided");
            return Ok(());
        }
        Err(Error::InvalidFile(format!(
            "no HWIDs matched {}",
            guids.join("|")
        )))
    }

    fn check_not_hardware(&self, guids: &[String]) -> Result<()> {
        self.require_engine("not_hardware", "1.9.10")?;

        if let Some(guid) = guids.iter().find(|g| self.ctx.hwids.contains(g)) {
            return Err(Error::InvalidFile(format!("{} HWIDs matched", guid)));
        }
        Ok(())
    }

    fn check_client(&self, tokens: &[ClientToken]) -> Result<()> {
        self.require_engine("client", "1.4.5")?;

        let request = &self.release.request;
        for token in tokens {
            match token {
                ClientToken::IdRequirementGlob => {}
                ClientToken::Unknown(name) => {
                    return Err(Error::NotFound(format!(
                        "client requirement {} unknown",
                        name
                    )));
                }
                ClientToken::Feature { name, flag } => {
                    if !request.has_feature(*flag) {
                        return Err(Error::NotSupported(format!(
                            "client requirement {} not supported",
                            name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HardwareIds;
    use crate::device::DeviceId;
    use crate::request::{EngineRequest, FeatureFlags};
    use crate::requirement::RequirementNode;

    const SIBLING_GUID: &str = "1ff60ab2-3905-06a1-b476-0371f00c9e9b";
    const HWID: &str = "6ff95c9c-ae41-5f59-9d90-3ec1ea66091e";

    fn req(node: RequirementNode) -> Requirement {
        Requirement::parse(&node).unwrap()
    }

    fn device(id: &str, version: &str) -> Device {
        let mut device = Device::new(DeviceId::from_hwid(id), id);
        device.set_version(version, VersionFormat::Triplet);
        device
    }

    fn check(
        ctx: &EngineContext,
        devices: &DeviceList,
        release: &Release,
        device: Option<&DeviceId>,
        engine_version: &str,
        requirement: Requirement,
    ) -> Result<()> {
        let device = device.and_then(|id| devices.get(id));
        Evaluator::new(
            ctx,
            devices,
            release,
            device,
            InstallFlags::empty(),
            engine_version,
        )
        .evaluate(&requirement)
    }

    #[test]
    fn test_id_requirement() {
        let ctx = EngineContext::new("1.9.8");
        let devices = DeviceList::new();
        let release = Release::new("1.2.3");

        let ok = req(RequirementNode::new("id")
            .with_target("org.freedesktop.fwupd")
            .with_compare("ge", "1.8.*=1.8.5|1.9.*=1.9.7|2.0.13"));
        assert!(check(&ctx, &devices, &release, None, "1.0.0", ok).is_ok());

        let too_new = req(RequirementNode::new("id")
            .with_target("org.freedesktop.fwupd")
            .with_compare("ge", "1.9.9"));
        let err = check(&ctx, &devices, &release, None, "1.0.0", too_new).unwrap_err();
        assert!(matches!(err, Error::InvalidFile(_)));
        assert_eq!(
            err.message(),
            "Not compatible with org.freedesktop.fwupd version 1.9.8, requires >= 1.9.9"
        );

        let missing = req(RequirementNode::new("id")
            .with_target("org.example.missing")
            .with_compare("ge", "1.0.0"));
        let err = check(&ctx, &devices, &release, None, "1.0.0", missing).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_firmware_own_version() {
        let ctx = EngineContext::new("2.0.0");
        let mut devices = DeviceList::new();
        devices.add(device("dev", "1.2.2"));
        let release = Release::new("1.2.4");
        let id = DeviceId::from_hwid("dev");

        let node = RequirementNode::new("firmware").with_compare("ge", "1.2.3");
        let err = check(
            &ctx,
            &devices,
            &release,
            Some(&id),
            "1.0.0",
            req(node.clone()),
        )
        .unwrap_err();
        assert!(err.message().contains("requires >= 1.2.3"));

        devices.add(device("dev", "1.2.3"));
        assert!(check(&ctx, &devices, &release, Some(&id), "1.0.0", req(node)).is_ok());

        let node = RequirementNode::new("firmware").with_compare("eq", "1.0.0");
        let err = check(&ctx, &devices, &release, Some(&id), "1.0.0", req(node)).unwrap_err();
        assert_eq!(
            err.message(),
            "Not compatible with firmware version: failed predicate [1.0.0 eq 1.2.3]"
        );
    }

    #[test]
    fn test_firmware_without_device_passes() {
        let ctx = EngineContext::new("2.0.0");
        let devices = DeviceList::new();
        let release = Release::new("1.2.4");
        let node = RequirementNode::new("firmware").with_compare("ge", "9.9.9");
        assert!(check(&ctx, &devices, &release, None, "1.0.0", req(node)).is_ok());
    }

    #[test]
    fn test_bootloader() {
        let ctx = EngineContext::new("2.0.0");
        let mut devices = DeviceList::new();
        let mut dev = device("dev", "1.2.3");
        dev.version_bootloader = Some("4.5.6".into());
        devices.add(dev);
        let release = Release::new("1.2.4");
        let id = DeviceId::from_hwid("dev");

        let node = RequirementNode::new("firmware")
            .with_target("bootloader")
            .with_compare("ge", "4.5.6");
        assert!(check(&ctx, &devices, &release, Some(&id), "1.0.0", req(node)).is_ok());

        let node = RequirementNode::new("firmware")
            .with_target("bootloader")
            .with_compare("ge", "5.0.0");
        let err = check(&ctx, &devices, &release, Some(&id), "1.0.0", req(node)).unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
        assert!(err.message().contains("requires >= 5.0.0"));

        let node = RequirementNode::new("firmware")
            .with_target("bootloader")
            .with_compare("lt", "1.0.0");
        let err = check(&ctx, &devices, &release, Some(&id), "1.0.0", req(node)).unwrap_err();
        assert_eq!(err.message(), "Bootloader is not compatible");
    }

    #[test]
    fn test_vendor_id() {
        let ctx = EngineContext::new("2.0.0");
        let mut devices = DeviceList::new();
        let mut dev = device("dev", "1.2.3");
        dev.add_vendor_id("USB:0xFFFF");
        devices.add(dev);
        devices.add(device("bare", "1.2.3"));
        let release = Release::new("1.2.4");
        let id = DeviceId::from_hwid("dev");
        let node = |pattern: &str| {
            req(RequirementNode::new("firmware")
                .with_target("vendor-id")
                .with_compare("eq", pattern))
        };

        assert!(check(
            &ctx,
            &devices,
            &release,
            Some(&id),
            "1.0.0",
            node("USB:0xFFFF|DMI:Lenovo"),
        )
        .is_ok());

        let err = check(
            &ctx,
            &devices,
            &release,
            Some(&id),
            "1.0.0",
            node("DMI:Lenovo"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidFile(_)));
        assert_eq!(err.message(), "Not compatible with vendor USB:0xFFFF: got DMI:Lenovo");

        let bare = DeviceId::from_hwid("bare");
        let err = check(
            &ctx,
            &devices,
            &release,
            Some(&bare),
            "1.0.0",
            node("USB:0xFFFF"),
        )
        .unwrap_err();
        assert_eq!(err.message(), "device [bare] has no vendor ID");

        let evaluator = Evaluator::new(
            &ctx,
            &devices,
            &release,
            devices.get(&id),
            InstallFlags::IGNORE_VID_PID,
            "1.0.0",
        );
        assert!(evaluator.evaluate(&node("DMI:Lenovo")).is_ok());
    }

    #[test]
    fn test_not_child() {
        let ctx = EngineContext::new("2.0.0");
        let mut devices = DeviceList::new();
        devices.add(device("parent", "1.0.0"));
        devices.add(device("child", "0.0.999"));
        let parent = DeviceId::from_hwid("parent");
        devices.add_child(&parent, &DeviceId::from_hwid("child")).unwrap();
        let release = Release::new("1.2.4");

        let node = RequirementNode::new("firmware")
            .with_target("not-child")
            .with_compare("eq", "4.5.6");
        assert!(check(&ctx, &devices, &release, Some(&parent), "1.0.0", req(node)).is_ok());

        devices.add(device("child", "0.0.1"));
        let node = RequirementNode::new("firmware")
            .with_target("not-child")
            .with_compare("glob", "0.0.*");
        let err = check(
            &ctx,
            &devices,
            &release,
            Some(&parent),
            "1.0.0",
            req(node.clone()),
        )
        .unwrap_err();
        assert!(err
            .message()
            .contains("Not compatible with child device version"));

        devices.get_mut(&DeviceId::from_hwid("child")).unwrap().version = None;
        let err = check(&ctx, &devices, &release, Some(&parent), "1.0.0", req(node)).unwrap_err();
        assert_eq!(err.message(), "no version provided by child, child of parent");
    }

    #[test]
    fn test_other_device_null_version_passes() {
        let ctx = EngineContext::new("2.0.0");
        let mut devices = DeviceList::new();
        devices.add(device("dev", "1.0.0"));
        let mut other = Device::new(DeviceId::from_hwid("other"), "other");
        other.add_guid(SIBLING_GUID);
        devices.add(other);
        let release = Release::new("1.2.4");
        let id = DeviceId::from_hwid("dev");

        let node = RequirementNode::new("firmware")
            .with_target(SIBLING_GUID)
            .with_compare("ge", "9.9.9");
        // needs the 'firmware no version' gate
        let err = check(
            &ctx,
            &devices,
            &release,
            Some(&id),
            "1.2.10",
            req(node.clone()),
        )
        .unwrap_err();
        assert!(err.message().contains("'firmware no version'"));
        assert!(check(&ctx, &devices, &release, Some(&id), "1.2.11", req(node)).is_ok());
    }

    #[test]
    fn test_other_device_version_compare() {
        let ctx = EngineContext::new("2.0.0");
        let mut devices = DeviceList::new();
        devices.add(device("dev", "1.0.0"));
        let mut other = device("other", "4.5.6");
        other.add_guid(SIBLING_GUID);
        devices.add(other);
        let release = Release::new("1.2.4");
        let id = DeviceId::from_hwid("dev");

        let node = RequirementNode::new("firmware")
            .with_target(SIBLING_GUID)
            .with_compare("gt", "4.0.0");
        assert!(check(&ctx, &devices, &release, Some(&id), "1.1.0", req(node)).is_ok());

        let node = RequirementNode::new("firmware")
            .with_target(SIBLING_GUID)
            .with_compare("ge", "5.0.0");
        let err = check(&ctx, &devices, &release, Some(&id), "1.1.0", req(node)).unwrap_err();
        assert_eq!(
            err.message(),
            "Not compatible with other version 4.5.6, requires >= 5.0.0"
        );
    }

    #[test]
    fn test_depth_self_gates() {
        let ctx = EngineContext::new("2.0.0");
        let mut devices = DeviceList::new();
        devices.add(device("parent", "1.0.0"));
        devices.add(device("child", "1.0.0"));
        let parent = DeviceId::from_hwid("parent");
        let child = DeviceId::from_hwid("child");
        devices.add_child(&parent, &child).unwrap();
        let release = Release::new("1.2.4");

        let node = RequirementNode::new("firmware")
            .with_compare("ge", "1.0.0")
            .with_depth(1);
        let err = check(
            &ctx,
            &devices,
            &release,
            Some(&child),
            "1.3.3",
            req(node.clone()),
        )
        .unwrap_err();
        assert_eq!(
            err.message(),
            "requirement 'parent firmware' also needs org.freedesktop.fwupd >= 1.3.4"
        );
        assert!(check(&ctx, &devices, &release, Some(&child), "1.3.4", req(node.clone())).is_ok());

        // walking past the root
        let err = check(&ctx, &devices, &release, Some(&parent), "1.3.4", req(node)).unwrap_err();
        assert_eq!(err.message(), "No parent device for parent (0/1)");
    }

    #[test]
    fn test_hardware() {
        let mut ctx = EngineContext::new("2.0.0");
        let devices = DeviceList::new();
        let release = Release::new("1.2.4");
        let node = || req(RequirementNode::new("hardware").with_target(HWID));

        // skipped until hardware identity is loaded
        assert!(check(&ctx, &devices, &release, None, "1.0.0", node()).is_ok());

        ctx.hwids = HardwareIds::loaded(Vec::<String>::new());
        let err = check(&ctx, &devices, &release, None, "1.0.1", node()).unwrap_err();
        assert_eq!(err.message(), format!("no HWIDs matched {}", HWID));

        ctx.hwids.insert(HWID);
        assert!(check(&ctx, &devices, &release, None, "1.0.1", node()).is_ok());
        let err = check(&ctx, &devices, &release, None, "1.0.0", node()).unwrap_err();
        assert!(err.message().contains("'hardware' also needs"));

        let target = format!("{}|{}", SIBLING_GUID, HWID);
        let list = req(RequirementNode::new("hardware").with_target(&target));
        let err = check(&ctx, &devices, &release, None, "1.0.1", list).unwrap_err();
        assert!(err.message().ends_with(">= 1.0.8"));
    }

    #[test]
    fn test_hardware_skipped_for_emulated_device() {
        let mut ctx = EngineContext::new("2.0.0");
        ctx.hwids = HardwareIds::loaded([HWID]);
        let mut devices = DeviceList::new();
        devices.add(device("dev", "1.0.0"));
        let release = Release::new("1.2.4");
        let id = DeviceId::from_hwid("dev");
        let node = || req(RequirementNode::new("hardware").with_target(SIBLING_GUID));

        let err = check(&ctx, &devices, &release, Some(&id), "1.0.1", node()).unwrap_err();
        assert_eq!(err.message(), format!("no HWIDs matched {}", SIBLING_GUID));

        devices
            .get_mut(&id)
            .unwrap()
            .add_flag(DeviceFlags::EMULATED);
        assert!(check(&ctx, &devices, &release, Some(&id), "1.0.1", node()).is_ok());
    }

    #[test]
    fn test_not_hardware() {
        let mut ctx = EngineContext::new("2.0.0");
        ctx.hwids = HardwareIds::loaded([HWID]);
        let devices = DeviceList::new();
        let release = Release::new("1.2.4");

        let absent = req(RequirementNode::new("not_hardware")
            .with_target("ffffffff-ffff-ffff-ffff-ffffffffffff"));
        assert!(check(&ctx, &devices, &release, None, "1.9.10", absent.clone()).is_ok());
        assert!(check(&ctx, &devices, &release, None, "1.9.9", absent).is_err());

        let present = req(RequirementNode::new("not_hardware").with_target(HWID));
        let err = check(&ctx, &devices, &release, None, "1.9.10", present).unwrap_err();
        assert_eq!(err.message(), format!("{} HWIDs matched", HWID));
    }

    #[test]
    fn test_client() {
        let ctx = EngineContext::new("2.0.0");
        let devices = DeviceList::new();
        let release = Release::new("1.2.4")
            .with_request(EngineRequest::new(FeatureFlags::DETACH_ACTION));
        let client = |tokens: &str| req(RequirementNode::new("client").with_target(tokens));

        assert!(check(&ctx, &devices, &release, None, "1.4.5", client("detach-action")).is_ok());
        assert!(check(
            &ctx,
            &devices,
            &release,
            None,
            "1.4.5",
            client("detach-action|id-requirement-glob")
        )
        .is_ok());

        let err = check(
            &ctx,
            &devices,
            &release,
            None,
            "1.4.5",
            client("update-action"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
        assert_eq!(err.message(), "client requirement update-action not supported");

        let err = check(&ctx, &devices, &release, None, "1.4.5", client("hello-dave")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = check(
            &ctx,
            &devices,
            &release,
            None,
            "1.4.4",
            client("detach-action"),
        )
        .unwrap_err();
        assert!(err.message().contains("'client' also needs"));
    }
}
