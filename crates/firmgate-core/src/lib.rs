//! Firmgate Core - Release requirement and compatibility checks
//!
//! This crate decides whether a firmware release may be installed on a device:
//! - Version comparison across the vendor version formats
//! - Requirement parsing and per-kind evaluation (`id`, `firmware`,
//!   `hardware`, `not_hardware`, `client`)
//! - Device graph for parent, child and sibling lookups
//! - Release admission (already installed, older, locked, branch)
//! - Choosing the single most useful error across many candidates

pub mod admission;
pub mod config;
pub mod context;
pub mod device;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod guid;
pub mod predicate;
pub mod prioritize;
pub mod release;
pub mod request;
pub mod requirement;
pub mod resolver;
pub mod topology;
pub mod validate;
pub mod version;

pub use admission::check_release_version;
pub use config::{ConfigError, EngineConfig};
pub use context::{EngineContext, HardwareIds, RuntimeVersions, DEFAULT_ENGINE_ID};
pub use device::{Device, DeviceFlags, DeviceId};
pub use engine::{requirements_check, RequirementsEngine};
pub use error::{Error, ErrorKind, Result};
pub use predicate::{CompareOp, Predicate, Verdict};
pub use prioritize::best_error;
pub use release::Release;
pub use request::{EngineRequest, FeatureFlags, InstallFlags, TrustLevel};
pub use requirement::{Requirement, RequirementNode};
pub use topology::DeviceList;
pub use version::VersionFormat;
