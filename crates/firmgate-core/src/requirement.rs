//! Requirement nodes, raw and typed
//!
//! A [`RequirementNode`] is the attribute bag found in release metadata. It
//! is converted once into a typed [`Requirement`], so unknown kinds, bad
//! operators and malformed GUID lists are rejected before any evaluation.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::guid;
use crate::predicate::Predicate;
use crate::request::FeatureFlags;

/// Capability token allowing `glob=version` fallback syntax in versions
pub const CAPABILITY_ID_REQUIREMENT_GLOB: &str = "id-requirement-glob";

/// A requirement as written in release metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementNode {
    /// Element name: `id`, `firmware`, `hardware`, `not_hardware` or `client`
    pub kind: String,
    /// Element text
    pub target: Option<String>,
    pub compare: Option<String>,
    pub version: Option<String>,
    pub depth: Option<String>,
}

impl RequirementNode {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_compare(mut self, compare: &str, version: &str) -> Self {
        self.compare = Some(compare.to_string());
        self.version = Some(version.to_string());
        self
    }

    pub fn with_depth(mut self, depth: i64) -> Self {
        self.depth = Some(depth.to_string());
        self
    }

    /// Target text, treating an empty string as absent
    fn text(&self) -> Option<&str> {
        self.target.as_deref().filter(|t| !t.is_empty())
    }

    fn require_text(&self) -> Result<&str> {
        self.text()
            .ok_or_else(|| Error::NotSupported("no requirement value supplied".to_string()))
    }
}

/// Which version of which device a `firmware` requirement looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirmwareTarget {
    /// The device's own firmware version
    Runtime,
    Bootloader,
    /// Regex over the device's `|`-joined vendor ids
    VendorId { pattern: Option<String> },
    /// Inverted predicate over every child
    NotChild,
    /// Another device found by GUID
    OtherDevice { guids: Vec<String> },
}

/// One token of a `client` requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientToken {
    Feature { name: String, flag: FeatureFlags },
    /// Engine capability rather than a client feature
    IdRequirementGlob,
    Unknown(String),
}

impl ClientToken {
    pub fn parse(token: &str) -> Self {
        if token == CAPABILITY_ID_REQUIREMENT_GLOB {
            return ClientToken::IdRequirementGlob;
        }
        match FeatureFlags::from_token(token) {
            Some(flag) => ClientToken::Feature {
                name: token.to_string(),
                flag,
            },
            None => ClientToken::Unknown(token.to_string()),
        }
    }
}

/// A typed requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Runtime version of a component, e.g. the engine itself
    Id { target: String, predicate: Predicate },
    Firmware {
        target: FirmwareTarget,
        /// Parent hops; `-1` children, `0` siblings, absent means any device
        depth: Option<i64>,
        predicate: Predicate,
    },
    /// Any of the GUIDs must be a machine HWID
    Hardware { guids: Vec<String> },
    /// None of the GUIDs may be a machine HWID
    NotHardware { guids: Vec<String> },
    /// Every token must be supported
    Client { tokens: Vec<ClientToken> },
}

fn parse_depth(depth: &str) -> Result<i64> {
    let value = depth
        .parse::<i64>()
        .map_err(|_| Error::NotSupported(format!("cannot parse depth {}", depth)))?;
    if value < -1 {
        return Err(Error::NotSupported(format!(
            "depth {} is below minimum -1",
            depth
        )));
    }
    Ok(value)
}

impl Requirement {
    pub fn parse(node: &RequirementNode) -> Result<Self> {
        match node.kind.as_str() {
            "id" => Ok(Requirement::Id {
                target: node.require_text()?.to_string(),
                predicate: Predicate::from_attrs(node.compare.as_deref(), node.version.as_deref())?,
            }),
            "firmware" => Self::parse_firmware(node),
            "hardware" => Ok(Requirement::Hardware {
                guids: node.require_text()?.split('|').map(str::to_string).collect(),
            }),
            "not_hardware" => Ok(Requirement::NotHardware {
                guids: node.require_text()?.split('|').map(str::to_string).collect(),
            }),
            "client" => Ok(Requirement::Client {
                tokens: node.require_text()?.split('|').map(ClientToken::parse).collect(),
            }),
            other => Err(Error::NotSupported(format!(
                "cannot handle requirement type {}",
                other
            ))),
        }
    }

    fn parse_firmware(node: &RequirementNode) -> Result<Self> {
        let depth = node.depth.as_deref().map(parse_depth).transpose()?;
        let target = match node.text() {
            None => FirmwareTarget::Runtime,
            Some("bootloader") => FirmwareTarget::Bootloader,
            Some("vendor-id") => FirmwareTarget::VendorId {
                pattern: node.version.clone(),
            },
            Some("not-child") => FirmwareTarget::NotChild,
            Some(list) => FirmwareTarget::OtherDevice {
                guids: guid::split_list(list)?,
            },
        };
        let predicate = match target {
            FirmwareTarget::VendorId { .. } => Predicate::default(),
            _ => Predicate::from_attrs(node.compare.as_deref(), node.version.as_deref())?,
        };
        Ok(Requirement::Firmware {
            target,
            depth,
            predicate,
        })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Requirement::Id { .. } => "id",
            Requirement::Firmware { .. } => "firmware",
            Requirement::Hardware { .. } => "hardware",
            Requirement::NotHardware { .. } => "not_hardware",
            Requirement::Client { .. } => "client",
        }
    }

    /// A firmware requirement pinned in the topology, or a HWID match
    pub fn is_specific(&self) -> bool {
        matches!(
            self,
            Requirement::Firmware { depth: Some(_), .. } | Requirement::Hardware { .. }
        )
    }

    /// Whether the required version uses `glob=version` fallback syntax
    pub fn uses_version_fallback(&self) -> bool {
        match self {
            Requirement::Id { predicate, .. } | Requirement::Firmware { predicate, .. } => {
                predicate.uses_fallback()
            }
            _ => false,
        }
    }

    /// Whether this is a `client` requirement carrying `id-requirement-glob`
    pub fn grants_version_glob(&self) -> bool {
        match self {
            Requirement::Client { tokens } => tokens.contains(&ClientToken::IdRequirementGlob),
            _ => false,
        }
    }

    /// Whether this checks the device's own firmware version
    pub fn checks_own_version(&self) -> bool {
        matches!(
            self,
            Requirement::Firmware {
                target: FirmwareTarget::Runtime,
                ..
            }
        )
    }
}
