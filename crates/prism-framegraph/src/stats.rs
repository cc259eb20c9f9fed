//! Frame Statistics and Schedule Reports

use std::fmt;

use serde::Serialize;

/// Counters of the last executed frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameGraphStats {
    /// Frames executed since the engine was created
    pub frames_executed: u64,
    /// Passes registered in the last frame
    pub passes_declared: usize,
    /// Passes that ran
    pub passes_executed: usize,
    /// Passes skipped by culling
    pub passes_culled: usize,
    /// Entries devirtualized during the frame
    pub resources_materialized: usize,
    /// Framebuffers held by the pool after the frame
    pub pooled_resources: usize,
}

/// One pass in a compiled plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledPass {
    pub index: usize,
    pub name: String,
    pub culled: bool,
    pub ref_count: u32,
    pub has_side_effect: bool,
    /// Resources materialized before the pass
    pub devirtualize: Vec<String>,
    /// Resources released after the pass
    pub destroy: Vec<String>,
}

/// Plan of one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleReport {
    /// False if the graph changed after the last compile
    pub compiled: bool,
    pub passes: Vec<ScheduledPass>,
}

impl ScheduleReport {
    /// Passes that will run
    pub fn live(&self) -> impl Iterator<Item = &ScheduledPass> {
        self.passes.iter().filter(|pass| !pass.culled)
    }

    pub fn culled_count(&self) -> usize {
        self.passes.iter().filter(|pass| pass.culled).count()
    }
}

impl fmt::Display for ScheduleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.compiled {
            writeln!(f, "(not compiled)")?;
        }
        for pass in &self.passes {
            let state = if pass.culled { "culled" } else { "live" };
            let effect = if pass.has_side_effect { " [side effect]" } else { "" };
            writeln!(f, "{:>3} {:<20} {:<6} refs={}{}", pass.index, pass.name, state, pass.ref_count, effect)?;
            if !pass.devirtualize.is_empty() {
                writeln!(f, "      + {}", pass.devirtualize.join(", "))?;
            }
            if !pass.destroy.is_empty() {
                writeln!(f, "      - {}", pass.destroy.join(", "))?;
            }
        }
        Ok(())
    }
}
