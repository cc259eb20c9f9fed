//! Frame Configuration
//!
//! Settings consumed by the concrete passes when building a frame.

use serde::{Deserialize, Serialize};

use crate::resource::ResourceDescriptor;

/// TAA (Temporal Anti-Aliasing) settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaaSettings {
    /// Enable TAA
    pub enabled: bool,
    /// Jitter scale, in pixels
    pub jitter_scale: f32,
    /// History blend factor
    pub blend_factor: f32,
}

impl Default for TaaSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            jitter_scale: 1.0,
            blend_factor: 0.9,
        }
    }
}

/// Frame graph configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameGraphConfig {
    /// Render target width
    pub width: u32,
    /// Render target height
    pub height: u32,
    /// TAA settings
    pub taa: TaaSettings,
    /// Copy the final color into a separate target before presenting
    pub copy_output: bool,
}

impl FrameGraphConfig {
    /// Descriptor of the main color target
    pub fn color_descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(self.width, self.height)
    }
}

impl Default for FrameGraphConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            taa: TaaSettings::default(),
            copy_output: false,
        }
    }
}
