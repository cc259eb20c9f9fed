//! Passes
//!
//! A pass is split in two: the [`PassNode`] holds what the scheduler needs
//! (declared reads and writes, culling state, lifetime lists), while the
//! [`FrameGraphPass`] holds the typed data and callbacks supplied by the
//! subsystem owning the pass. Both live at the same index in the engine.

use std::any::Any;

use smallvec::SmallVec;

use crate::device::RenderingEngine;
use crate::engine::FrameGraphEngine;
use crate::handle::{EntryId, FrameGraphHandle, PassId};
use crate::{FrameGraphError, FrameGraphResult};

/// Scheduling node of one pass
#[derive(Debug, Clone)]
pub struct PassNode {
    pub(crate) id: PassId,
    pub(crate) name: String,
    pub(crate) reads: SmallVec<[FrameGraphHandle; 8]>,
    pub(crate) writes: SmallVec<[FrameGraphHandle; 4]>,
    pub(crate) ref_count: u32,
    /// Externally observable work; the pass is never culled
    pub has_side_effect: bool,
    pub(crate) devirtualize: SmallVec<[EntryId; 4]>,
    pub(crate) destroy: SmallVec<[EntryId; 4]>,
}

impl PassNode {
    pub(crate) fn new(id: PassId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            reads: SmallVec::new(),
            writes: SmallVec::new(),
            ref_count: 0,
            has_side_effect: false,
            devirtualize: SmallVec::new(),
            destroy: SmallVec::new(),
        }
    }

    pub fn id(&self) -> PassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a read of this exact version
    pub fn read(&mut self, handle: FrameGraphHandle) -> FrameGraphHandle {
        if !self.reads.contains(&handle) {
            self.reads.push(handle);
        }
        handle
    }

    /// Declare a sampled read
    ///
    /// Same as [`PassNode::read`] for now; kept separate so sampling can later
    /// carry its own usage and barrier requirements.
    pub fn sample(&mut self, handle: FrameGraphHandle) -> FrameGraphHandle {
        self.read(handle)
    }

    /// Declare a write, producing the next version of the resource
    ///
    /// Callers must thread the returned handle forward; the old handle keeps
    /// naming the previous version.
    pub fn write<D: RenderingEngine>(
        &mut self,
        engine: &mut FrameGraphEngine<D>,
        handle: FrameGraphHandle,
    ) -> FrameGraphResult<FrameGraphHandle> {
        if self.writes.contains(&handle) {
            return Ok(handle);
        }

        let (new_handle, imported) = engine.version_resource(handle, self.id)?;
        if imported {
            self.has_side_effect = true;
        }
        self.writes.push(new_handle);
        Ok(new_handle)
    }

    pub fn reads(&self) -> &[FrameGraphHandle] {
        &self.reads
    }

    pub fn writes(&self) -> &[FrameGraphHandle] {
        &self.writes
    }

    /// Zero after compile means the pass is culled
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn is_culled(&self) -> bool {
        self.ref_count == 0
    }

    /// Entries materialized right before this pass runs
    pub fn devirtualize(&self) -> &[EntryId] {
        &self.devirtualize
    }

    /// Entries released right after this pass runs
    pub fn destroy(&self) -> &[EntryId] {
        &self.destroy
    }
}

/// Execute callback: receives the engine and the pass data
pub type ExecuteFn<D, T> = Box<dyn FnMut(&mut FrameGraphEngine<D>, &T) -> FrameGraphResult<()>>;

/// Tear-down callback invoked on engine shutdown
pub type TearDownFn = Box<dyn FnMut()>;

/// Typed payload and callbacks of one pass
pub struct FrameGraphPass<D: RenderingEngine, T> {
    name: String,
    /// Filled in by `setup`; handles the pass needs at execute time
    pub data: Option<T>,
    execute: ExecuteFn<D, T>,
    tear_down: Option<TearDownFn>,
}

impl<D: RenderingEngine, T> FrameGraphPass<D, T> {
    pub(crate) fn new(name: impl Into<String>, execute: ExecuteFn<D, T>, tear_down: Option<TearDownFn>) -> Self {
        Self {
            name: name.into(),
            data: None,
            execute,
            tear_down,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data set during setup, if any
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn has_tear_down(&self) -> bool {
        self.tear_down.is_some()
    }
}

/// Type-erased pass storage kept by the engine
pub(crate) trait ErasedPass<D: RenderingEngine> {
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn execute(&mut self, engine: &mut FrameGraphEngine<D>) -> FrameGraphResult<()>;

    fn tear_down(&mut self);
}

impl<D: RenderingEngine, T: 'static> ErasedPass<D> for FrameGraphPass<D, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn execute(&mut self, engine: &mut FrameGraphEngine<D>) -> FrameGraphResult<()> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| FrameGraphError::MissingPassData(self.name.clone()))?;
        (self.execute)(engine, data)
    }

    fn tear_down(&mut self) {
        if let Some(tear_down) = self.tear_down.as_mut() {
            tear_down();
        }
    }
}
