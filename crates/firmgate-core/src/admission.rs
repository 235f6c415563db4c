//! Release admission: whether a release may be installed on a device at all
//!
//! This runs before the requirement checks and is where "already installed"
//! and "older than installed" outcomes come from.

use std::cmp::Ordering;

use tracing::debug;

use crate::device::{Device, DeviceFlags};
use crate::error::{Error, Result};
use crate::release::Release;
use crate::request::{EngineRequest, FeatureFlags, InstallFlags};
use crate::requirement::Requirement;
use crate::validate;
use crate::version::{self, VersionFormat};

fn label(device: &Device) -> String {
    format!("Device {} [{}]", device.name, device.id)
}

fn check_provides(device: &Device, release: &Release) -> Result<()> {
    if release.provides.iter().any(|guid| device.has_guid(guid)) {
        return Ok(());
    }
    Err(Error::NotFound("No supported devices found".to_string()))
}

fn check_version_check_required(device: &Device, release: &Release) -> Result<()> {
    if !device.has_flag(DeviceFlags::VERSION_CHECK_REQUIRED) {
        return Ok(());
    }
    if release.hard_reqs.iter().any(Requirement::checks_own_version) {
        return Ok(());
    }
    Err(Error::NotSupported("no firmware requirement".to_string())
        .prefixed("device requires firmware with a version check: "))
}

fn check_branch(device: &Device, release: &Release, flags: InstallFlags) -> Result<()> {
    if flags.contains(InstallFlags::ALLOW_BRANCH_SWITCH) || device.branch == release.branch {
        return Ok(());
    }
    Err(Error::NotSupported(format!(
        "{} would switch firmware branch from {} to {}",
        label(device),
        device.branch.as_deref().unwrap_or("default"),
        release.branch.as_deref().unwrap_or("default"),
    )))
}

fn check_version_formats(device: &Device, release: &Release, flags: InstallFlags) -> Result<()> {
    if release.version_formats.is_empty()
        || flags.intersects(InstallFlags::FORCE | InstallFlags::ALLOW_BRANCH_SWITCH)
    {
        return Ok(());
    }
    let wanted = release
        .version_formats
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(";");
    if device.version_format == VersionFormat::Unknown {
        return Err(Error::NotSupported(format!(
            "release version format '{}' but no device version format",
            wanted
        )));
    }
    if !release.version_formats.contains(&device.version_format) {
        return Err(Error::NotSupported(format!(
            "Firmware version formats were different, device was '{}' and release is '{}'",
            device.version_format, wanted
        )));
    }
    Ok(())
}

/// Check whether `release` may be installed on `device`
///
/// Checks run in a fixed order and the first failure is returned.
pub fn check_release_version(
    device: &Device,
    release: &Release,
    request: &EngineRequest,
    flags: InstallFlags,
) -> Result<()> {
    check_provides(device, release)?;
    check_version_check_required(device, release)?;

    if device.has_flag(DeviceFlags::LOCKED) {
        return Err(Error::NotSupported(format!("{} is locked", label(device))));
    }
    check_branch(device, release, flags)?;

    if !request.has_feature(FeatureFlags::SHOW_PROBLEMS) {
        validate::check_updatable(device)?;
    }
    if device.has_flag(DeviceFlags::ONLY_OFFLINE)
        && !flags.intersects(InstallFlags::OFFLINE | InstallFlags::FORCE)
    {
        return Err(Error::NotSupported(format!(
            "{} only allows offline updates",
            label(device)
        )));
    }

    let installed = device.version.as_deref().ok_or_else(|| {
        Error::Internal(format!("{} has no firmware version", label(device)))
    })?;
    check_version_formats(device, release, flags)?;

    if let Some(lowest) = device.version_lowest.as_deref() {
        if !flags.contains(InstallFlags::FORCE)
            && version::compare(lowest, &release.version, device.version_format).is_gt()
        {
            // quotes the release, the version actually being refused
            return Err(Error::NotSupported(format!(
                "Specified firmware is older than the minimum required version '{} < {}'",
                release.version, lowest
            )));
        }
    }

    let order = version::compare(installed, &release.version, device.version_format);
    debug!(
        device = %device.id,
        installed,
        release = %release.version,
        "version order {:?}",
        order
    );
    if device.has_flag(DeviceFlags::ONLY_VERSION_UPGRADE) && order == Ordering::Greater {
        return Err(Error::NotSupported(
            "Device only supports version upgrades".to_string(),
        ));
    }
    match order {
        Ordering::Equal if !flags.contains(InstallFlags::ALLOW_REINSTALL) => {
            Err(Error::VersionSame(format!(
                "Specified firmware is already installed '{}'",
                release.version
            )))
        }
        Ordering::Greater
            if !flags.intersects(InstallFlags::ALLOW_OLDER | InstallFlags::ALLOW_BRANCH_SWITCH) =>
        {
            Err(Error::VersionNewer(format!(
                "Specified firmware is older than installed '{} < {}'",
                release.version, installed
            )))
        }
        _ => Ok(()),
    }
}
