//! The calling client and the flags it passed

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Features the calling client declares it can handle
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FeatureFlags: u32 {
        /// Can upload a report of the update
        const CAN_REPORT = 1 << 0;
        /// Can show a manual detach prompt
        const DETACH_ACTION = 1 << 1;
        /// Can show a manual post-update prompt
        const UPDATE_ACTION = 1 << 2;
        const SWITCH_BRANCH = 1 << 3;
        /// Can show interactive requests
        const REQUESTS = 1 << 4;
        const REQUESTS_NON_GENERIC = 1 << 5;
        /// Can warn about full disk encryption
        const FDE_WARNING = 1 << 6;
        const COMMUNITY_TEXT = 1 << 7;
        /// Can show device problems
        const SHOW_PROBLEMS = 1 << 8;
        const ALLOW_AUTHENTICATION = 1 << 9;
    }
}

impl FeatureFlags {
    /// Look up a client feature by its metadata token
    pub fn from_token(token: &str) -> Option<Self> {
        let flag = match token {
            "can-report" => FeatureFlags::CAN_REPORT,
            "detach-action" => FeatureFlags::DETACH_ACTION,
            "update-action" => FeatureFlags::UPDATE_ACTION,
            "switch-branch" => FeatureFlags::SWITCH_BRANCH,
            "requests" => FeatureFlags::REQUESTS,
            "requests-non-generic" => FeatureFlags::REQUESTS_NON_GENERIC,
            "fde-warning" => FeatureFlags::FDE_WARNING,
            "community-text" => FeatureFlags::COMMUNITY_TEXT,
            "show-problems" => FeatureFlags::SHOW_PROBLEMS,
            "allow-authentication" => FeatureFlags::ALLOW_AUTHENTICATION,
            _ => return None,
        };
        Some(flag)
    }
}

/// How much the engine trusts the calling client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    #[default]
    Untrusted,
    /// Running as the local administrator
    Trusted,
}

/// The client request a release is being checked for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineRequest {
    pub feature_flags: FeatureFlags,
    pub trust: TrustLevel,
}

impl EngineRequest {
    pub fn new(feature_flags: FeatureFlags) -> Self {
        Self {
            feature_flags,
            trust: TrustLevel::default(),
        }
    }

    pub fn has_feature(&self, flag: FeatureFlags) -> bool {
        self.feature_flags.contains(flag)
    }
}

bitflags! {
    /// Caller-supplied install options
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct InstallFlags: u32 {
        /// Soft requirement failures are logged instead of fatal
        const IGNORE_REQUIREMENTS = 1 << 0;
        /// Skip vendor-id requirements
        const IGNORE_VID_PID = 1 << 1;
        const FORCE = 1 << 2;
        const ALLOW_REINSTALL = 1 << 3;
        const ALLOW_OLDER = 1 << 4;
        const ALLOW_BRANCH_SWITCH = 1 << 5;
        /// Install on next reboot
        const OFFLINE = 1 << 6;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_from_token() {
        assert_eq!(
            FeatureFlags::from_token("detach-action"),
            Some(FeatureFlags::DETACH_ACTION)
        );
        assert_eq!(
            FeatureFlags::from_token("show-problems"),
            Some(FeatureFlags::SHOW_PROBLEMS)
        );
        assert_eq!(FeatureFlags::from_token("id-requirement-glob"), None);
        assert_eq!(FeatureFlags::from_token("hello-dave"), None);
    }

    #[test]
    fn test_request_has_feature() {
        let request = EngineRequest::new(FeatureFlags::DETACH_ACTION | FeatureFlags::REQUESTS);
        assert!(request.has_feature(FeatureFlags::REQUESTS));
        assert!(!request.has_feature(FeatureFlags::CAN_REPORT));
        assert_eq!(request.trust, TrustLevel::Untrusted);
    }
}
