//! Resource Pool
//!
//! Turns a virtual [`ResourceEntry`] into a real framebuffer exactly once per
//! name and hands the same object back on every later request. The pool
//! outlives the per-frame graph; only engine tear-down empties it.
//!
//! A cached object is returned even when the requesting entry carries a
//! different descriptor. Consumers resize the returned framebuffer in place.

use std::rc::Rc;

use ahash::AHashMap;

use crate::device::{FramebufferDescriptor, RenderingEngine, TextureDescriptor};
use crate::resource::ResourceEntry;
use crate::FrameGraphResult;

/// Name-keyed cache of materialized framebuffers
pub struct ResourcePool<D: RenderingEngine> {
    resources: AHashMap<String, Rc<D::Framebuffer>>,
}

impl<D: RenderingEngine> ResourcePool<D> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            resources: AHashMap::new(),
        }
    }

    /// Return the framebuffer cached under `entry.name`, allocating it on first request
    pub fn get_or_create_resource(
        &mut self,
        entry: &ResourceEntry<D::Framebuffer>,
        device: &mut D,
    ) -> FrameGraphResult<Rc<D::Framebuffer>> {
        if let Some(existing) = self.resources.get(&entry.name) {
            return Ok(Rc::clone(existing));
        }

        // Zero-sized targets are clamped to one pixel
        let width = entry.descriptor.width.max(1);
        let height = entry.descriptor.height.max(1);
        let color = device.create_texture_2d(&TextureDescriptor {
            label: entry.name.clone(),
            width,
            height,
            usage: entry.descriptor.resolved_usage(),
        })?;
        let framebuffer = device.create_framebuffer(FramebufferDescriptor {
            label: entry.name.clone(),
            width,
            height,
            color_attachments: vec![color],
        })?;

        log::debug!("Pool allocated '{}' ({}x{})", entry.name, width, height);
        let framebuffer = Rc::new(framebuffer);
        self.resources.insert(entry.name.clone(), Rc::clone(&framebuffer));
        Ok(framebuffer)
    }

    /// Cached framebuffer for a name, if one was ever allocated
    pub fn get(&self, name: &str) -> Option<&Rc<D::Framebuffer>> {
        self.resources.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Drop every cached framebuffer
    pub fn clean(&mut self) {
        if !self.resources.is_empty() {
            log::debug!("Pool releasing {} framebuffers", self.resources.len());
        }
        self.resources.clear();
    }
}

impl<D: RenderingEngine> Default for ResourcePool<D> {
    fn default() -> Self {
        Self::new()
    }
}
