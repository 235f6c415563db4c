//! Device graph with parent/child relationships
//!
//! Devices live in an arena indexed by position; links are indices, so
//! sibling and ancestor lookups are plain index walks.

use std::collections::HashMap;

use crate::device::{Device, DeviceId};
use crate::error::{Error, Result};

/// A device plus its links in the graph
#[derive(Debug, Clone)]
struct DeviceNode {
    device: Device,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Every known device, in insertion order
#[derive(Debug, Clone, Default)]
pub struct DeviceList {
    nodes: Vec<Option<DeviceNode>>,
    index: HashMap<DeviceId, usize>,
}

impl DeviceList {
    /// Create a new empty device list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device, replacing any device with the same id
    ///
    /// A replaced device keeps its parent and children.
    pub fn add(&mut self, device: Device) {
        if let Some(&idx) = self.index.get(&device.id) {
            if let Some(node) = self.nodes[idx].as_mut() {
                node.device = device;
                return;
            }
        }
        let idx = self.nodes.len();
        self.index.insert(device.id.clone(), idx);
        self.nodes.push(Some(DeviceNode {
            device,
            parent: None,
            children: Vec::new(),
        }));
    }

    /// Remove a device; its children become roots
    pub fn remove(&mut self, id: &DeviceId) -> Option<Device> {
        let idx = self.index.remove(id)?;
        let node = self.nodes[idx].take()?;
        if let Some(parent) = node.parent.and_then(|p| self.nodes[p].as_mut()) {
            parent.children.retain(|&c| c != idx);
        }
        for child in node.children {
            if let Some(child) = self.nodes[child].as_mut() {
                child.parent = None;
            }
        }
        Some(node.device)
    }

    /// Make `child_id` a child of `parent_id`, detaching it from any old parent
    pub fn add_child(&mut self, parent_id: &DeviceId, child_id: &DeviceId) -> Result<()> {
        let parent = self.lookup(parent_id)?;
        let child = self.lookup(child_id)?;

        // the child must not be the parent or one of its ancestors
        let mut cursor = Some(parent);
        while let Some(idx) = cursor {
            if idx == child {
                return Err(Error::Internal(format!(
                    "adding {} as child of {} would create a cycle",
                    child_id, parent_id
                )));
            }
            cursor = self.node(idx).and_then(|n| n.parent);
        }

        if let Some(old) = self.node(child).and_then(|n| n.parent) {
            if old == parent {
                return Ok(());
            }
            if let Some(old) = self.nodes[old].as_mut() {
                old.children.retain(|&c| c != child);
            }
        }
        if let Some(node) = self.nodes[child].as_mut() {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes[parent].as_mut() {
            node.children.push(child);
        }
        Ok(())
    }

    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.index
            .get(id)
            .and_then(|&idx| self.node(idx))
            .map(|n| &n.device)
    }

    pub fn get_mut(&mut self, id: &DeviceId) -> Option<&mut Device> {
        let idx = *self.index.get(id)?;
        self.nodes[idx].as_mut().map(|n| &mut n.device)
    }

    pub fn parent(&self, id: &DeviceId) -> Option<&Device> {
        let node = self.node(*self.index.get(id)?)?;
        node.parent.and_then(|p| self.node(p)).map(|n| &n.device)
    }

    /// Children of a device, in the order they were added
    pub fn children(&self, id: &DeviceId) -> Vec<&Device> {
        self.index
            .get(id)
            .and_then(|&idx| self.node(idx))
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|&c| self.node(c))
                    .map(|n| &n.device)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Other children of the same parent; empty for a root device
    pub fn siblings(&self, id: &DeviceId) -> Vec<&Device> {
        match self.parent(id) {
            Some(parent) => self
                .children(&parent.id)
                .into_iter()
                .filter(|d| &d.id != id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Walk exactly `depth` parent links up from `id`
    pub fn ancestor(&self, id: &DeviceId, depth: u64) -> Result<&Device> {
        let mut idx = self.lookup(id)?;
        for hop in 0..depth {
            let Some(node) = self.node(idx) else {
                return Err(Error::Internal(format!("device {} vanished", id)));
            };
            match node.parent {
                Some(parent) => idx = parent,
                None => {
                    return Err(Error::NotSupported(format!(
                        "No parent device for {} ({}/{})",
                        node.device.name, hop, depth
                    )))
                }
            }
        }
        self.node(idx)
            .map(|n| &n.device)
            .ok_or_else(|| Error::Internal(format!("device {} vanished", id)))
    }

    /// First device, in insertion order, carrying `guid`
    pub fn find_by_guid(&self, guid: &str) -> Option<&Device> {
        self.iter().find(|d| d.has_guid(guid))
    }

    /// All devices, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.nodes.iter().flatten().map(|n| &n.device)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn node(&self, idx: usize) -> Option<&DeviceNode> {
        self.nodes.get(idx).and_then(Option::as_ref)
    }

    fn lookup(&self, id: &DeviceId) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("device {} not found", id)))
    }
}
