//! Requirements check for one device and release pair

use tracing::{debug, debug_span, info};

use crate::context::EngineContext;
use crate::error::{Error, Result};
use crate::evaluate::Evaluator;
use crate::predicate::CompareOp;
use crate::release::Release;
use crate::request::InstallFlags;
use crate::requirement::Requirement;
use crate::topology::DeviceList;
use crate::validate;
use crate::version::{self, VersionFormat};

/// Engine version assumed when a release does not ask for one
pub const BASELINE_ENGINE_VERSION: &str = "1.0.0";

/// Checks releases against the device graph and engine state
pub struct RequirementsEngine<'a> {
    ctx: &'a EngineContext,
    devices: &'a DeviceList,
}

impl<'a> RequirementsEngine<'a> {
    pub fn new(ctx: &'a EngineContext, devices: &'a DeviceList) -> Self {
        Self { ctx, devices }
    }

    /// Highest engine version the release's hard `id` requirements ask for
    pub fn declared_engine_version(&self, release: &Release) -> Result<String> {
        let mut newest = BASELINE_ENGINE_VERSION.to_string();
        let running = self.ctx.engine_version().unwrap_or_default();
        for req in &release.hard_reqs {
            let Requirement::Id { target, predicate } = req else {
                continue;
            };
            if *target != self.ctx.engine_id || predicate.op != Some(CompareOp::Ge) {
                continue;
            }
            let expr = predicate.version.as_ref().ok_or_else(|| {
                Error::NotFound(format!("no version provided for requirement {}", target))
            })?;
            let Some(candidate) = expr.resolve(running)? else {
                continue;
            };
            if version::compare(candidate, &newest, VersionFormat::Unknown).is_gt() {
                newest = candidate.to_string();
            }
        }
        Ok(newest)
    }

    /// Check every requirement of `release` against its device
    pub fn check(&self, release: &Release, flags: InstallFlags) -> Result<()> {
        let span = debug_span!(
            "requirements_check",
            version = %release.version,
            device = release.device.as_ref().map(|d| d.as_str()).unwrap_or("none")
        );
        let _enter = span.enter();

        let device = match &release.device {
            Some(id) => Some(
                self.devices
                    .get(id)
                    .ok_or_else(|| Error::NotFound(format!("device {} not found", id)))?,
            ),
            None => None,
        };
        if let Some(device) = device {
            validate::check_updatable(device)?;
            validate::check_protocol(device, release)?;
        }
        validate::check_hardware_exclusive(release)?;

        let engine_version = self.declared_engine_version(release)?;
        debug!(engine_version = %engine_version, "declared engine version");
        let evaluator = Evaluator::new(
            self.ctx,
            self.devices,
            release,
            device,
            flags,
            &engine_version,
        );

        for req in &release.hard_reqs {
            evaluator.evaluate(req)?;
        }

        validate::check_version_globs(release)?;
        if let Some(device) = device {
            validate::check_enforce_requires(self.ctx, device, release, flags)?;
        }

        for req in &release.soft_reqs {
            if let Err(e) = evaluator.evaluate(req) {
                if !flags.contains(InstallFlags::IGNORE_REQUIREMENTS) {
                    return Err(e);
                }
                info!(requirement = req.kind_name(), "ignoring soft-requirement: {}", e);
            }
        }

        debug!("requirements passed");
        Ok(())
    }
}

/// Check `release` against its device; see [`RequirementsEngine::check`]
pub fn requirements_check(
    ctx: &EngineContext,
    devices: &DeviceList,
    release: &Release,
    flags: InstallFlags,
) -> Result<()> {
    RequirementsEngine::new(ctx, devices).check(release, flags)
}
