//! Rules spanning the whole requirement set of a release

use tracing::info;

use crate::context::EngineContext;
use crate::device::{Device, DeviceFlags};
use crate::error::{Error, Result};
use crate::release::Release;
use crate::request::InstallFlags;
use crate::requirement::{Requirement, CAPABILITY_ID_REQUIREMENT_GLOB};

/// The device must currently accept updates
pub fn check_updatable(device: &Device) -> Result<()> {
    if device.is_updatable() {
        return Ok(());
    }
    let mut msg = format!(
        "Device {} [{}] does not currently allow updates",
        device.name, device.id
    );
    if let Some(reason) = &device.update_error {
        msg.push_str(": ");
        msg.push_str(reason);
    }
    Err(Error::NotSupported(msg))
}

/// The release protocol must be one the device speaks, if it declares any
pub fn check_protocol(device: &Device, release: &Release) -> Result<()> {
    let Some(protocol) = release.protocol.as_deref() else {
        return Ok(());
    };
    if device.protocols.is_empty() || device.has_protocol(protocol) {
        return Ok(());
    }
    Err(Error::NotSupported(format!(
        "Device {} does not support {}, only {}",
        device.name,
        protocol,
        device.protocols.join("|")
    )))
}

/// Allow-listing and deny-listing hardware in one release is rejected
pub fn check_hardware_exclusive(release: &Release) -> Result<()> {
    let has_hardware = release
        .hard_reqs
        .iter()
        .any(|r| matches!(r, Requirement::Hardware { .. }));
    let has_not_hardware = release
        .hard_reqs
        .iter()
        .any(|r| matches!(r, Requirement::NotHardware { .. }));
    if has_hardware && has_not_hardware {
        return Err(Error::NotSupported(
            "using hardware and not_hardware at the same time is not supported".to_string(),
        ));
    }
    Ok(())
}

/// Version globs are only understood by clients that say so
pub fn check_version_globs(release: &Release) -> Result<()> {
    let uses_globs = release.requirements().any(Requirement::uses_version_fallback);
    let granted = release.requirements().any(Requirement::grants_version_glob);
    if uses_globs && !granted {
        return Err(Error::NotSupported(format!(
            "requirement version globs also need client requirement {}",
            CAPABILITY_ID_REQUIREMENT_GLOB
        )));
    }
    Ok(())
}

/// Devices with generic GUIDs need a release pinned to the hardware
pub fn check_enforce_requires(
    ctx: &EngineContext,
    device: &Device,
    release: &Release,
    flags: InstallFlags,
) -> Result<()> {
    if device.has_flag(DeviceFlags::EMULATED)
        || !device.has_flag(DeviceFlags::ENFORCE_REQUIRES)
        || release.hard_reqs.iter().any(Requirement::is_specific)
    {
        return Ok(());
    }
    if ctx.supported_build {
        return Err(Error::NotSupported(
            "generic GUID requires a CHID, child, parent or sibling requirement".to_string(),
        ));
    }
    if !flags.contains(InstallFlags::IGNORE_REQUIREMENTS) {
        return Err(Error::NotSupported(
            "generic GUID requires --force, a CHID, child, parent or sibling requirement"
                .to_string(),
        ));
    }
    info!(device = %device.id, "ignoring enforce-requires requirement due to --force");
    Ok(())
}
