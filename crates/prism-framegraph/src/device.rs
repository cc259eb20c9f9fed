//! Rendering Engine Capability
//!
//! The frame graph never talks to a GPU API directly. It consumes the small
//! allocation surface below, which each backend implements.

use std::fmt;

use crate::resource::TextureUsage;
use crate::FrameGraphResult;

/// Description of a 2D texture to allocate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// Debug label
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub usage: TextureUsage,
}

/// Description of a framebuffer and the attachments it takes ownership of
#[derive(Debug)]
pub struct FramebufferDescriptor<T> {
    /// Debug label
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// Color attachments, in binding order
    pub color_attachments: Vec<T>,
}

/// A real framebuffer produced by a backend
///
/// GPU objects are handles with interior state, so resizing goes through `&self`.
pub trait Framebuffer: fmt::Debug {
    /// Debug label the framebuffer was created with
    fn label(&self) -> &str;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Resize every attachment in place
    fn resize(&self, width: u32, height: u32);
}

/// Allocation capability consumed by the frame graph
pub trait RenderingEngine: 'static {
    /// Backend texture type
    type Texture;
    /// Backend framebuffer type
    type Framebuffer: Framebuffer;

    /// Allocate a 2D texture
    fn create_texture_2d(&mut self, descriptor: &TextureDescriptor) -> FrameGraphResult<Self::Texture>;

    /// Allocate a framebuffer over the given attachments
    fn create_framebuffer(
        &mut self,
        descriptor: FramebufferDescriptor<Self::Texture>,
    ) -> FrameGraphResult<Self::Framebuffer>;
}
