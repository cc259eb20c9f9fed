//! Concrete Passes
//!
//! Stock passes built on top of the engine API. Each one only declares its
//! resources; the actual GPU work is a callback supplied by the backend.

pub mod copy;
pub mod render;
pub mod taa;

pub use copy::{add_copy_pass, CopyPassData};
pub use render::{add_render_pass, RenderPassData};
pub use taa::{add_taa_pass, jitter_offset, TaaPassData, TaaResolve, TAA_HISTORY};
