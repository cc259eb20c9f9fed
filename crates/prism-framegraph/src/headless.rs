//! Headless Rendering Engine
//!
//! In-memory backend that allocates nothing on a GPU and records every
//! allocation and submitted command. Used for tests, benchmarks and offline
//! inspection of frame plans.

use std::cell::Cell;

use crate::device::{Framebuffer, FramebufferDescriptor, RenderingEngine, TextureDescriptor};
use crate::resource::TextureUsage;
use crate::{FrameGraphError, FrameGraphResult};

/// Texture allocated by the headless device
#[derive(Debug)]
pub struct HeadlessTexture {
    pub id: u64,
    pub label: String,
    pub width: Cell<u32>,
    pub height: Cell<u32>,
    pub usage: TextureUsage,
}

/// Framebuffer allocated by the headless device
#[derive(Debug)]
pub struct HeadlessFramebuffer {
    id: u64,
    label: String,
    width: Cell<u32>,
    height: Cell<u32>,
    color_attachments: Vec<HeadlessTexture>,
    resizes: Cell<u32>,
}

impl HeadlessFramebuffer {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn color_attachments(&self) -> &[HeadlessTexture] {
        &self.color_attachments
    }

    /// Number of times the framebuffer changed size
    pub fn resize_count(&self) -> u32 {
        self.resizes.get()
    }
}

impl Framebuffer for HeadlessFramebuffer {
    fn label(&self) -> &str {
        &self.label
    }

    fn width(&self) -> u32 {
        self.width.get()
    }

    fn height(&self) -> u32 {
        self.height.get()
    }

    fn resize(&self, width: u32, height: u32) {
        if self.width.get() == width && self.height.get() == height {
            return;
        }
        self.width.set(width);
        self.height.set(height);
        for attachment in &self.color_attachments {
            attachment.width.set(width);
            attachment.height.set(height);
        }
        self.resizes.set(self.resizes.get() + 1);
    }
}

/// Recording device with no GPU behind it
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_id: u64,
    textures_created: usize,
    framebuffers_created: usize,
    max_dimension: Option<u32>,
    commands: Vec<String>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device that refuses textures larger than `limit` in either dimension
    pub fn with_max_dimension(limit: u32) -> Self {
        Self {
            max_dimension: Some(limit),
            ..Self::default()
        }
    }

    /// Framebuffer standing in for the swapchain, not counted as a pool allocation
    pub fn screen(&mut self, width: u32, height: u32) -> HeadlessFramebuffer {
        HeadlessFramebuffer {
            id: self.next_id(),
            label: "screen".to_string(),
            width: Cell::new(width),
            height: Cell::new(height),
            color_attachments: Vec::new(),
            resizes: Cell::new(0),
        }
    }

    /// Record a submitted command
    pub fn record(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<String> {
        std::mem::take(&mut self.commands)
    }

    pub fn textures_created(&self) -> usize {
        self.textures_created
    }

    pub fn framebuffers_created(&self) -> usize {
        self.framebuffers_created
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl RenderingEngine for HeadlessDevice {
    type Texture = HeadlessTexture;
    type Framebuffer = HeadlessFramebuffer;

    fn create_texture_2d(&mut self, descriptor: &TextureDescriptor) -> FrameGraphResult<HeadlessTexture> {
        if let Some(limit) = self.max_dimension {
            if descriptor.width > limit || descriptor.height > limit {
                return Err(FrameGraphError::Device(format!(
                    "texture '{}' is {}x{}, limit is {}",
                    descriptor.label, descriptor.width, descriptor.height, limit
                )));
            }
        }

        self.textures_created += 1;
        Ok(HeadlessTexture {
            id: self.next_id(),
            label: descriptor.label.clone(),
            width: Cell::new(descriptor.width),
            height: Cell::new(descriptor.height),
            usage: descriptor.usage,
        })
    }

    fn create_framebuffer(
        &mut self,
        descriptor: FramebufferDescriptor<HeadlessTexture>,
    ) -> FrameGraphResult<HeadlessFramebuffer> {
        self.framebuffers_created += 1;
        Ok(HeadlessFramebuffer {
            id: self.next_id(),
            label: descriptor.label,
            width: Cell::new(descriptor.width),
            height: Cell::new(descriptor.height),
            color_attachments: descriptor.color_attachments,
            resizes: Cell::new(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_counters() {
        let mut device = HeadlessDevice::new();
        let texture = device
            .create_texture_2d(&TextureDescriptor {
                label: "Color".into(),
                width: 4,
                height: 4,
                usage: TextureUsage::default(),
            })
            .unwrap();
        let fb = device
            .create_framebuffer(FramebufferDescriptor {
                label: "Color".into(),
                width: 4,
                height: 4,
                color_attachments: vec![texture],
            })
            .unwrap();

        assert_eq!(device.textures_created(), 1);
        assert_eq!(device.framebuffers_created(), 1);
        assert_eq!(fb.color_attachments().len(), 1);
        assert_ne!(fb.id(), fb.color_attachments()[0].id);
    }

    #[test]
    fn test_resize_updates_attachments() {
        let mut device = HeadlessDevice::new();
        let texture = device
            .create_texture_2d(&TextureDescriptor {
                label: "Color".into(),
                width: 4,
                height: 4,
                usage: TextureUsage::default(),
            })
            .unwrap();
        let fb = device
            .create_framebuffer(FramebufferDescriptor {
                label: "Color".into(),
                width: 4,
                height: 4,
                color_attachments: vec![texture],
            })
            .unwrap();

        fb.resize(4, 4);
        assert_eq!(fb.resize_count(), 0);

        fb.resize(16, 9);
        assert_eq!((fb.width(), fb.height()), (16, 9));
        assert_eq!(fb.color_attachments()[0].width.get(), 16);
        assert_eq!(fb.resize_count(), 1);
    }

    #[test]
    fn test_command_recording() {
        let mut device = HeadlessDevice::new();
        device.record("draw");
        device.record("blit");
        assert_eq!(device.commands(), ["draw", "blit"]);
        assert_eq!(device.take_commands().len(), 2);
        assert!(device.commands().is_empty());
    }
}
