//! # Prism Frame Graph
//!
//! Per-frame render graph scheduler for the Prism renderer.
//!
//! ## Features
//! - Declarative pass registration with versioned resource handles
//! - Reference-counted culling of passes whose output is never consumed
//! - Exact first/last-use intervals per resource
//! - Materialization right before first use and release right after last use
//! - Name-keyed resource pool that keeps render targets alive across frames
//!
//! A frame goes through `add_pass` for every stage, then [`FrameGraphEngine::compile`],
//! then [`FrameGraphEngine::execute_pass_nodes`], which resets the per-frame state.

pub mod config;
pub mod device;
pub mod engine;
pub mod handle;
pub mod headless;
pub mod pass;
pub mod passes;
pub mod pool;
pub mod resource;
pub mod stats;

pub use config::{FrameGraphConfig, TaaSettings};
pub use device::{Framebuffer, FramebufferDescriptor, RenderingEngine, TextureDescriptor};
pub use engine::FrameGraphEngine;
pub use handle::{EntryId, FrameGraphHandle, PassId, PassRef};
pub use headless::HeadlessDevice;
pub use pass::{FrameGraphPass, PassNode};
pub use pool::ResourcePool;
pub use resource::{ResourceDescriptor, ResourceEntry, ResourceKind, ResourceNode, TextureUsage};
pub use stats::{FrameGraphStats, ScheduleReport, ScheduledPass};

use thiserror::Error;

/// Frame graph errors
#[derive(Error, Debug)]
pub enum FrameGraphError {
    #[error("Invalid resource handle {index} (frame has {len} resource nodes)")]
    InvalidHandle { index: usize, len: usize },

    #[error("Pass '{0}' survived culling but its setup never populated pass data")]
    MissingPassData(String),

    #[error("'{0}' called from inside a pass setup")]
    ReentrantSetup(String),

    #[error("'{0}' called while a pass is executing")]
    ReentrantExecute(String),

    #[error("Pass '{0}' holds data of a different type")]
    PassTypeMismatch(String),

    #[error("Device allocation failed: {0}")]
    Device(String),

    #[error("Pass '{pass}' failed: {reason}")]
    PassFailed { pass: String, reason: String },
}

/// Result type for frame graph operations
pub type FrameGraphResult<T> = Result<T, FrameGraphError>;
