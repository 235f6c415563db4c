//! Candidate releases and their metadata loader
//!
//! Release metadata is an AppStream-style `<component>` document:
//!
//! ```xml
//! <component>
//!   <provides>
//!     <firmware type="flashed">12345678-1234-1234-1234-123456789012</firmware>
//!   </provides>
//!   <requires>
//!     <id compare="ge" version="1.9.10">org.freedesktop.fwupd</id>
//!     <firmware compare="ge" version="1.2.3"/>
//!   </requires>
//!   <recommends>
//!     <client>detach-action</client>
//!   </recommends>
//!   <custom>
//!     <value key="LVFS::UpdateProtocol">org.uefi.capsule</value>
//!   </custom>
//!   <releases>
//!     <release version="1.2.4"/>
//!   </releases>
//! </component>
//! ```
//!
//! Children of `<requires>` are hard requirements; children of
//! `<recommends>` and `<suggests>` are soft. The element name is the
//! requirement kind, the element text its target.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::path::Path;
use tracing::debug;

use crate::device::DeviceId;
use crate::error::{Error, Result};
use crate::request::EngineRequest;
use crate::requirement::{Requirement, RequirementNode};
use crate::version::VersionFormat;

const KEY_UPDATE_PROTOCOL: &str = "LVFS::UpdateProtocol";
const KEY_VERSION_FORMAT: &str = "LVFS::VersionFormat";

/// A release that could be installed on a device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release {
    /// Version this release would install
    pub version: String,
    /// Update protocol the payload is written for
    pub protocol: Option<String>,
    pub branch: Option<String>,
    /// GUIDs of devices this firmware can be flashed onto
    pub provides: Vec<String>,
    /// Version formats the release version is written in
    pub version_formats: Vec<VersionFormat>,
    /// Requirements that must pass
    pub hard_reqs: Vec<Requirement>,
    /// Requirements that can be ignored on request
    pub soft_reqs: Vec<Requirement>,
    /// Device this release is being checked against
    pub device: Option<DeviceId>,
    pub request: EngineRequest,
    /// Remote the metadata came from
    pub remote: Option<String>,
}

impl Release {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            ..Default::default()
        }
    }

    pub fn with_device(mut self, device: DeviceId) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_request(mut self, request: EngineRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_remote(mut self, remote: &str) -> Self {
        self.remote = Some(remote.to_string());
        self
    }

    pub fn with_protocol(mut self, protocol: &str) -> Self {
        self.protocol = Some(protocol.to_string());
        self
    }

    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }

    pub fn provide(mut self, guid: &str) -> Self {
        self.provides.push(guid.to_ascii_lowercase());
        self
    }

    /// Add a hard requirement
    pub fn require(mut self, node: RequirementNode) -> Result<Self> {
        self.hard_reqs.push(Requirement::parse(&node)?);
        Ok(self)
    }

    /// Add a soft requirement
    pub fn recommend(mut self, node: RequirementNode) -> Result<Self> {
        self.soft_reqs.push(Requirement::parse(&node)?);
        Ok(self)
    }

    /// Parse release metadata
    pub fn from_xml(xml: &str) -> Result<Self> {
        MetadataParser::default().parse(xml)
    }

    /// Load release metadata from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidFile(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_xml(&xml)
    }

    /// Every requirement, hard first
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.hard_reqs.iter().chain(self.soft_reqs.iter())
    }
}

/// An open element while walking the document
struct Frame {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
}

impl Frame {
    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::InvalidFile(err.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|err| Error::InvalidFile(err.to_string()))?;
            attrs.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }
        Ok(Self {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            attrs,
            text: String::new(),
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn text(&self) -> Option<&str> {
        Some(self.text.as_str()).filter(|t| !t.is_empty())
    }
}

#[derive(Default)]
struct MetadataParser {
    release: Release,
    version: Option<String>,
}

impl MetadataParser {
    fn parse(mut self, xml: &str) -> Result<Release> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Frame> = Vec::new();
        let mut seen_root = false;
        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::InvalidFile(format!("failed to parse metadata: {}", e)))?;
            match event {
                Event::Start(e) => {
                    seen_root = true;
                    stack.push(Frame::from_start(&e)?);
                }
                Event::Empty(e) => {
                    seen_root = true;
                    let frame = Frame::from_start(&e)?;
                    self.close(&stack, frame)?;
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| {
                        Error::InvalidFile(format!("failed to parse metadata: {}", e))
                    })?;
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&text);
                    }
                }
                Event::End(_) => {
                    if let Some(frame) = stack.pop() {
                        self.close(&stack, frame)?;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if !seen_root {
            return Err(Error::InvalidFile("metadata has no component".to_string()));
        }

        self.release.version = self
            .version
            .ok_or_else(|| Error::InvalidFile("metadata has no release version".to_string()))?;
        debug!(
            version = %self.release.version,
            hard = self.release.hard_reqs.len(),
            soft = self.release.soft_reqs.len(),
            "loaded release metadata"
        );
        Ok(self.release)
    }

    /// Handle a finished element given its open ancestors
    fn close(&mut self, parents: &[Frame], frame: Frame) -> Result<()> {
        let parent = match parents {
            [_root, parent] => parent.name.as_str(),
            [_root] => {
                if frame.name == "branch" {
                    self.release.branch = frame.text().map(str::to_string);
                }
                return Ok(());
            }
            _ => return Ok(()),
        };

        match (parent, frame.name.as_str()) {
            ("requires", _) => {
                let req = Requirement::parse(&Self::node(&frame))?;
                self.release.hard_reqs.push(req);
            }
            ("recommends" | "suggests", _) => {
                let req = Requirement::parse(&Self::node(&frame))?;
                self.release.soft_reqs.push(req);
            }
            ("provides", "firmware") if frame.attr("type") == Some("flashed") => {
                if let Some(guid) = frame.text() {
                    self.release.provides.push(guid.to_ascii_lowercase());
                }
            }
            ("custom", "value") => match (frame.attr("key"), frame.text()) {
                (Some(KEY_UPDATE_PROTOCOL), Some(value)) => {
                    self.release.protocol = Some(value.to_string());
                }
                (Some(KEY_VERSION_FORMAT), Some(value)) => {
                    self.release
                        .version_formats
                        .push(VersionFormat::from_name(value));
                }
                _ => {}
            },
            ("releases", "release") => {
                if self.version.is_none() {
                    self.version = frame.attr("version").map(str::to_string);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn node(frame: &Frame) -> RequirementNode {
        RequirementNode {
            kind: frame.name.clone(),
            target: frame.text().map(str::to_string),
            compare: frame.attr("compare").map(str::to_string),
            version: frame.attr("version").map(str::to_string),
            depth: frame.attr("depth").map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::FirmwareTarget;
    use std::io::Write;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<component type="firmware">
  <id>com.example.Dock.firmware</id>
  <provides>
    <firmware type="flashed">12345678-1234-1234-1234-123456789012</firmware>
  </provides>
  <requires>
    <id compare="ge" version="1.9.10">org.freedesktop.fwupd</id>
    <firmware compare="ge" version="1.2.3"/>
    <firmware depth="1" compare="eq" version="4.5.6">1ff60ab2-3905-06a1-b476-0371f00c9e9b</firmware>
  </requires>
  <recommends>
    <client>detach-action</client>
  </recommends>
  <suggests>
    <hardware>6ff95c9c-ae41-5f59-9d90-3ec1ea66091e</hardware>
  </suggests>
  <branch>community</branch>
  <custom>
    <value key="LVFS::UpdateProtocol">com.example.dfu</value>
    <value key="LVFS::VersionFormat">triplet</value>
  </custom>
  <releases>
    <release version="1.2.4"/>
    <release version="1.2.3"/>
  </releases>
</component>"#;

    #[test]
    fn test_parse_metadata() {
        let release = Release::from_xml(SAMPLE).unwrap();
        assert_eq!(release.version, "1.2.4");
        assert_eq!(release.protocol.as_deref(), Some("com.example.dfu"));
        assert_eq!(release.branch.as_deref(), Some("community"));
        assert_eq!(release.provides, vec!["12345678-1234-1234-1234-123456789012"]);
        assert_eq!(release.version_formats, vec![VersionFormat::Triplet]);
        assert_eq!(release.hard_reqs.len(), 3);
        assert_eq!(release.soft_reqs.len(), 2);
        assert!(release.hard_reqs[1].checks_own_version());
        assert!(matches!(
            &release.hard_reqs[2],
            Requirement::Firmware { target: FirmwareTarget::OtherDevice { .. }, depth: Some(1), .. }
        ));
        assert_eq!(release.requirements().count(), 5);
    }

    #[test]
    fn test_unknown_requirement_kind() {
        let xml = r#"<component>
  <requires><phased_update/></requires>
  <releases><release version="1.2.3"/></releases>
</component>"#;
        let err = Release::from_xml(xml).unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
        assert_eq!(err.message(), "cannot handle requirement type phased_update");
    }

    #[test]
    fn test_malformed_metadata() {
        assert!(matches!(
            Release::from_xml("<component><requires></component>"),
            Err(Error::InvalidFile(_))
        ));
        assert!(matches!(
            Release::from_xml("<component/>"),
            Err(Error::InvalidFile(_))
        ));
        assert!(matches!(Release::from_xml(""), Err(Error::InvalidFile(_))));
    }

    #[test]
    fn test_builder() {
        let release = Release::new("1.2.3")
            .with_device(DeviceId::from_hwid("dev"))
            .with_remote("lvfs")
            .provide("12345678-1234-1234-1234-123456789012")
            .require(RequirementNode::new("firmware").with_compare("ge", "1.0.0"))
            .unwrap()
            .recommend(RequirementNode::new("client").with_target("detach-action"))
            .unwrap();
        assert_eq!(release.device, Some(DeviceId::from_hwid("dev")));
        assert_eq!(release.remote.as_deref(), Some("lvfs"));
        assert_eq!(release.hard_reqs.len(), 1);
        assert_eq!(release.soft_reqs.len(), 1);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let release = Release::from_file(file.path()).unwrap();
        assert_eq!(release.version, "1.2.4");

        let err = Release::from_file(Path::new("/nonexistent/firmware.metainfo.xml")).unwrap_err();
        assert!(matches!(err, Error::InvalidFile(_)));
    }
}
