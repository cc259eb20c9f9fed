//! Virtual Resources
//!
//! A [`ResourceEntry`] describes one named render target for the frame. Every
//! write produces a new [`ResourceNode`] pointing at the same entry, so the
//! nodes of one entry form a version chain.

use std::rc::Rc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::device::{Framebuffer, RenderingEngine};
use crate::handle::{EntryId, PassId};
use crate::pool::ResourcePool;
use crate::FrameGraphResult;

bitflags! {
    /// How a render target is going to be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TextureUsage: u32 {
        const RENDER_ATTACHMENT = 1 << 0;
        const SAMPLED = 1 << 1;
        const COPY_SRC = 1 << 2;
        const COPY_DST = 1 << 3;
        const STORAGE = 1 << 4;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::RENDER_ATTACHMENT | Self::SAMPLED
    }
}

/// Sizing and usage hints for the real GPU object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub width: u32,
    pub height: u32,
    /// Falls back to [`TextureUsage::default`] when unset
    pub usage: Option<TextureUsage>,
}

impl ResourceDescriptor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TextureUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Usage flags with the default applied
    pub fn resolved_usage(&self) -> TextureUsage {
        self.usage.unwrap_or_default()
    }
}

/// Kind of virtual resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResourceKind {
    /// Sampled texture
    Texture,
    /// Render target
    RenderTarget,
}

/// Virtual resource shared by every version of one named resource
#[derive(Debug)]
pub struct ResourceEntry<F> {
    /// Pool key
    pub name: String,
    pub kind: ResourceKind,
    pub descriptor: ResourceDescriptor,
    /// Bumped on every write
    pub version: u32,
    /// Lives outside the graph (e.g. the screen)
    pub imported: bool,
    /// Priority tier, 0 or 1
    pub priority: u8,
    pub(crate) refs: u32,
    pub(crate) first: Option<PassId>,
    pub(crate) last: Option<PassId>,
    pub(crate) resource: Option<Rc<F>>,
}

impl<F: Framebuffer> ResourceEntry<F> {
    /// Create a virtual entry at version 0
    pub fn new(name: impl Into<String>, kind: ResourceKind, descriptor: ResourceDescriptor) -> Self {
        Self {
            name: name.into(),
            kind,
            descriptor,
            version: 0,
            imported: false,
            priority: 0,
            refs: 0,
            first: None,
            last: None,
            resource: None,
        }
    }

    /// Create an entry for an object that already exists outside the graph
    pub fn imported(name: impl Into<String>, descriptor: ResourceDescriptor, resource: Rc<F>) -> Self {
        let mut entry = Self::new(name, ResourceKind::RenderTarget, descriptor);
        entry.imported = true;
        entry.resource = Some(resource);
        entry
    }

    /// Number of reads of any version by surviving passes
    pub fn refs(&self) -> u32 {
        self.refs
    }

    /// First surviving pass touching any version
    pub fn first(&self) -> Option<PassId> {
        self.first
    }

    /// Last surviving pass touching any version
    pub fn last(&self) -> Option<PassId> {
        self.last
    }

    /// Currently materialized object, if any
    pub fn resource(&self) -> Option<&Rc<F>> {
        self.resource.as_ref()
    }

    pub(crate) fn reset_lifetime(&mut self) {
        self.refs = 0;
        self.first = None;
        self.last = None;
    }

    /// Acquire the real object from the pool before the first pass using it
    pub fn pre_execute_devirtualize<D>(
        &mut self,
        pool: &mut ResourcePool<D>,
        device: &mut D,
    ) -> FrameGraphResult<()>
    where
        D: RenderingEngine<Framebuffer = F>,
    {
        if self.imported || self.resource.is_some() {
            return Ok(());
        }
        let framebuffer = pool.get_or_create_resource(self, device)?;
        log::trace!("Devirtualized '{}' ({})", self.name, framebuffer.label());
        self.resource = Some(framebuffer);
        Ok(())
    }

    /// Hook before the last pass using this resource runs
    pub fn pre_execute_destroy(&mut self) {
        log::trace!("'{}' reaches its last use", self.name);
    }

    /// Hook after the first pass using this resource ran
    pub fn post_execute_devirtualize(&mut self) {}

    /// Release the frame's reference once the last pass ran; the pool keeps the object
    pub fn post_execute_destroy(&mut self) {
        if !self.imported && self.resource.take().is_some() {
            log::trace!("Released '{}' back to the pool", self.name);
        }
    }
}

/// One version of a resource entry
#[derive(Debug, Clone)]
pub struct ResourceNode {
    pub(crate) entry: EntryId,
    pub(crate) version: u32,
    pub(crate) writer: Option<PassId>,
    pub(crate) reader_count: u32,
}

impl ResourceNode {
    pub(crate) fn new(entry: EntryId, version: u32, writer: Option<PassId>) -> Self {
        Self {
            entry,
            version,
            writer,
            reader_count: 0,
        }
    }

    /// Entry this node is a version of
    pub fn entry(&self) -> EntryId {
        self.entry
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Pass that produced this version
    pub fn writer(&self) -> Option<PassId> {
        self.writer
    }

    /// Passes still reading this exact version
    pub fn reader_count(&self) -> u32 {
        self.reader_count
    }
}
