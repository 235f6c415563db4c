//! Firmgate Check - Evaluate firmware releases against a device fleet
//!
//! Every release is checked against every device in the fleet: admission
//! first, then the release's requirements. The exit status is zero when at
//! least one pair is admitted.

mod fleet;
mod report;

use anyhow::{bail, Context, Result};
use clap::Parser;
use firmgate_core::{
    best_error, check_release_version, requirements_check, DeviceList, EngineConfig,
    EngineContext, EngineRequest, Error, FeatureFlags, InstallFlags, Release,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use fleet::FleetFile;
use report::{Failure, PairReport, Report};

#[derive(Parser, Debug)]
#[command(name = "firmgate-check")]
#[command(about = "Check firmware releases against a device fleet")]
#[command(version)]
struct Args {
    /// Path to engine configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the device fleet file
    #[arg(short, long)]
    fleet: PathBuf,

    /// Release metadata files
    #[arg(required = true)]
    releases: Vec<PathBuf>,

    /// Only check this device id
    #[arg(short, long)]
    device: Option<String>,

    /// Log soft requirement failures instead of failing
    #[arg(long)]
    ignore_requirements: bool,

    /// Skip vendor-id requirements
    #[arg(long)]
    ignore_vid_pid: bool,

    /// Allow installing the version already installed
    #[arg(long)]
    allow_reinstall: bool,

    /// Allow installing an older version
    #[arg(long)]
    allow_older: bool,

    /// Client feature to declare, e.g. detach-action (repeatable)
    #[arg(long = "feature")]
    features: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn install_flags(&self) -> InstallFlags {
        let mut flags = InstallFlags::empty();
        flags.set(InstallFlags::IGNORE_REQUIREMENTS, self.ignore_requirements);
        flags.set(InstallFlags::IGNORE_VID_PID, self.ignore_vid_pid);
        flags.set(InstallFlags::ALLOW_REINSTALL, self.allow_reinstall);
        flags.set(InstallFlags::ALLOW_OLDER, self.allow_older);
        flags
    }

    fn request(&self) -> Result<EngineRequest> {
        let mut features = FeatureFlags::empty();
        for token in &self.features {
            match FeatureFlags::from_token(token) {
                Some(flag) => features |= flag,
                None => bail!("unknown client feature '{}'", token),
            }
        }
        Ok(EngineRequest::new(features))
    }
}

fn load_context(args: &Args) -> Result<EngineContext> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(config.into_context())
}

/// Admission then requirements for one pair
fn check_pair(
    ctx: &EngineContext,
    devices: &DeviceList,
    release: &Release,
    flags: InstallFlags,
) -> firmgate_core::Result<()> {
    if let Some(device) = release.device.as_ref().and_then(|id| devices.get(id)) {
        check_release_version(device, release, &release.request, flags)?;
    }
    requirements_check(ctx, devices, release, flags)
}

fn run(args: &Args) -> Result<Report> {
    let ctx = load_context(args)?;
    let devices = FleetFile::from_file(&args.fleet)
        .with_context(|| format!("loading fleet {}", args.fleet.display()))?
        .into_device_list()?;
    let flags = args.install_flags();
    let request = args.request()?;

    info!(
        engine = %ctx.engine_id,
        version = ctx.engine_version().unwrap_or("unknown"),
        devices = devices.len(),
        "Configuration loaded"
    );

    let mut report = Report::default();
    let mut errors: Vec<Error> = Vec::new();
    for path in &args.releases {
        let name = path.display().to_string();
        let release = match Release::from_file(path) {
            Ok(release) => release.with_request(request.clone()),
            Err(e) => {
                report
                    .pairs
                    .push(PairReport::new(&name, None, None, &Err(e.clone())));
                errors.push(e);
                continue;
            }
        };

        for device in devices.iter() {
            if args.device.as_deref().is_some_and(|d| d != device.id.as_str()) {
                continue;
            }
            let candidate = release.clone().with_device(device.id.clone());
            let outcome = check_pair(&ctx, &devices, &candidate, flags);
            debug!(release = %name, device = %device.id, admitted = outcome.is_ok(), "checked");
            report.pairs.push(PairReport::new(
                &name,
                Some(device.id.as_str()),
                Some(&release.version),
                &outcome,
            ));
            if let Err(e) = outcome {
                errors.push(e);
            }
        }
    }

    if !report.any_admitted() {
        report.best_error = Some(Failure::from(&best_error(&errors)));
    }
    Ok(report)
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let report = run(&args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for pair in &report.pairs {
            println!("{}", pair);
        }
        if let Some(failure) = &report.best_error {
            println!("{}", failure.message);
        }
    }

    Ok(if report.any_admitted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
