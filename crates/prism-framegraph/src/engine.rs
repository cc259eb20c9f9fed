//! Frame Graph Engine
//!
//! Owns the per-frame arenas (pass nodes, passes, resource nodes, resource
//! entries), compiles them into a culled plan with exact resource lifetimes
//! and executes the surviving passes in declaration order.
//!
//! ```text
//!  add_pass ──► setup ──► PassNode reads/writes ──┐
//!                                                 ▼
//!  compile:  ref counts ─► cull dead passes ─► first/last use ─► devirtualize/destroy lists
//!                                                 ▼
//!  execute_pass_nodes:  [devirtualize] execute [destroy]  per surviving pass ─► reset
//! ```
//!
//! Indices handed out during a frame are only valid until [`FrameGraphEngine::reset`].
//! The [`ResourcePool`] is not part of the frame and keeps its objects until
//! [`FrameGraphEngine::tear_down`].

use std::rc::Rc;
use std::time::Instant;

use crate::device::RenderingEngine;
use crate::handle::{EntryId, FrameGraphHandle, PassId, PassRef};
use crate::pass::{ErasedPass, FrameGraphPass, PassNode, TearDownFn};
use crate::pool::ResourcePool;
use crate::resource::{ResourceDescriptor, ResourceEntry, ResourceKind, ResourceNode};
use crate::stats::{FrameGraphStats, ScheduleReport, ScheduledPass};
use crate::{FrameGraphError, FrameGraphResult};

/// Number of priority tiers used when assigning lifetimes
const PRIORITY_TIERS: u8 = 2;

/// Name of the pass added by [`FrameGraphEngine::present`]
pub const PRESENT_PASS: &str = "Present";

/// What the engine is doing when user code calls back into it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Setup,
    Execute,
}

/// Per-frame render graph scheduler
pub struct FrameGraphEngine<D: RenderingEngine> {
    device: D,
    resource_pool: ResourcePool<D>,
    pass_nodes: Vec<PassNode>,
    frame_graph_passes: Vec<Option<Box<dyn ErasedPass<D>>>>,
    resource_nodes: Vec<ResourceNode>,
    entries: Vec<ResourceEntry<D::Framebuffer>>,
    /// Entries versioned by the setup in progress, undone if it fails
    setup_versions: Vec<EntryId>,
    phase: Phase,
    compiled: bool,
    stats: FrameGraphStats,
}

impl<D: RenderingEngine> FrameGraphEngine<D> {
    /// Create an engine allocating through `device`
    pub fn new(device: D) -> Self {
        Self {
            device,
            resource_pool: ResourcePool::new(),
            pass_nodes: Vec::new(),
            frame_graph_passes: Vec::new(),
            resource_nodes: Vec::new(),
            entries: Vec::new(),
            setup_versions: Vec::new(),
            phase: Phase::Idle,
            compiled: false,
            stats: FrameGraphStats::default(),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn resource_pool(&self) -> &ResourcePool<D> {
        &self.resource_pool
    }

    /// Register a pass
    ///
    /// `setup` runs immediately. It declares the pass's reads and writes on the
    /// node and stores the handles needed at execute time in `pass.data`.
    pub fn add_pass<T, S, E>(&mut self, name: &str, setup: S, execute: E) -> FrameGraphResult<PassRef<T>>
    where
        T: 'static,
        S: FnOnce(&mut Self, &mut PassNode, &mut FrameGraphPass<D, T>) -> FrameGraphResult<()>,
        E: FnMut(&mut Self, &T) -> FrameGraphResult<()> + 'static,
    {
        self.add_pass_inner(name, setup, Box::new(execute), None)
    }

    /// Register a pass with a tear-down callback run on engine shutdown
    pub fn add_pass_with_tear_down<T, S, E, X>(
        &mut self,
        name: &str,
        setup: S,
        execute: E,
        tear_down: X,
    ) -> FrameGraphResult<PassRef<T>>
    where
        T: 'static,
        S: FnOnce(&mut Self, &mut PassNode, &mut FrameGraphPass<D, T>) -> FrameGraphResult<()>,
        E: FnMut(&mut Self, &T) -> FrameGraphResult<()> + 'static,
        X: FnMut() + 'static,
    {
        self.add_pass_inner(name, setup, Box::new(execute), Some(Box::new(tear_down)))
    }

    fn add_pass_inner<T, S>(
        &mut self,
        name: &str,
        setup: S,
        execute: Box<dyn FnMut(&mut Self, &T) -> FrameGraphResult<()>>,
        tear_down: Option<TearDownFn>,
    ) -> FrameGraphResult<PassRef<T>>
    where
        T: 'static,
        S: FnOnce(&mut Self, &mut PassNode, &mut FrameGraphPass<D, T>) -> FrameGraphResult<()>,
    {
        self.ensure_idle(name)?;

        let id = PassId(self.pass_nodes.len() as u32);
        let mut node = PassNode::new(id, name);
        let mut pass = FrameGraphPass::new(name, execute, tear_down);

        let node_mark = self.resource_nodes.len();
        let entry_mark = self.entries.len();

        self.setup_versions.clear();
        self.phase = Phase::Setup;
        let result = setup(self, &mut node, &mut pass);
        self.phase = Phase::Idle;

        if let Err(err) = result {
            // Nothing may point at a pass that was never registered
            for id in self.setup_versions.drain(..) {
                if let Some(entry) = self.entries.get_mut(id.index()) {
                    entry.version -= 1;
                }
            }
            self.resource_nodes.truncate(node_mark);
            self.entries.truncate(entry_mark);
            return Err(err);
        }
        self.setup_versions.clear();

        log::trace!("Added pass '{}' ({} reads, {} writes)", name, node.reads.len(), node.writes.len());
        self.pass_nodes.push(node);
        self.frame_graph_passes.push(Some(Box::new(pass)));
        self.compiled = false;
        Ok(PassRef::new(id))
    }

    /// First pass registered under `name` this frame, if it holds `T` data
    ///
    /// A pass is detached from the engine while it executes, so looking up the
    /// running pass from its own `execute` yields `None`.
    pub fn get_pass<T: 'static>(&self, name: &str) -> Option<&FrameGraphPass<D, T>> {
        let index = self.pass_nodes.iter().position(|node| node.name == name)?;
        self.frame_graph_passes
            .get(index)?
            .as_ref()?
            .as_any()
            .downcast_ref()
    }

    /// Pass returned by `add_pass`
    pub fn pass<T: 'static>(&self, pass: PassRef<T>) -> FrameGraphResult<&FrameGraphPass<D, T>> {
        let index = pass.id().index();
        let stored = self
            .frame_graph_passes
            .get(index)
            .and_then(Option::as_ref)
            .ok_or(FrameGraphError::InvalidHandle {
                index,
                len: self.frame_graph_passes.len(),
            })?;
        stored
            .as_any()
            .downcast_ref()
            .ok_or_else(|| FrameGraphError::PassTypeMismatch(stored.name().to_string()))
    }

    /// Copy of the data of a pass returned by `add_pass`
    pub fn pass_data<T: Clone + 'static>(&self, pass: PassRef<T>) -> FrameGraphResult<T> {
        let stored = self.pass(pass)?;
        stored
            .data
            .clone()
            .ok_or_else(|| FrameGraphError::MissingPassData(stored.name().to_string()))
    }

    /// Declare a virtual texture
    ///
    /// The pass node is accepted for symmetry with the other declarations but
    /// does not become the writer; whichever pass writes the handle does.
    pub fn create_texture(&mut self, _pass: &PassNode, name: &str, descriptor: ResourceDescriptor) -> FrameGraphHandle {
        self.create_entry(ResourceEntry::new(name, ResourceKind::Texture, descriptor))
    }

    /// Declare a virtual render target
    ///
    /// Same ownership rules as [`FrameGraphEngine::create_texture`].
    pub fn create_render_target(
        &mut self,
        _pass: &PassNode,
        name: &str,
        descriptor: ResourceDescriptor,
    ) -> FrameGraphHandle {
        self.create_entry(ResourceEntry::new(name, ResourceKind::RenderTarget, descriptor))
    }

    /// Bring an object that lives outside the graph into it (e.g. the screen)
    ///
    /// Writing the returned handle marks the writer as side-effecting.
    pub fn import_render_target(
        &mut self,
        name: &str,
        descriptor: ResourceDescriptor,
        framebuffer: Rc<D::Framebuffer>,
    ) -> FrameGraphHandle {
        self.create_entry(ResourceEntry::imported(name, descriptor, framebuffer))
    }

    fn create_entry(&mut self, entry: ResourceEntry<D::Framebuffer>) -> FrameGraphHandle {
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(entry);
        self.create_resource_node(id, 0, None)
    }

    fn create_resource_node(&mut self, entry: EntryId, version: u32, writer: Option<PassId>) -> FrameGraphHandle {
        let handle = FrameGraphHandle::new(self.resource_nodes.len());
        self.resource_nodes.push(ResourceNode::new(entry, version, writer));
        self.compiled = false;
        handle
    }

    /// Bump the version of the resource behind `handle` and return the new node's handle
    pub(crate) fn version_resource(
        &mut self,
        handle: FrameGraphHandle,
        writer: PassId,
    ) -> FrameGraphResult<(FrameGraphHandle, bool)> {
        let entry_id = self.resource_node(handle)?.entry;
        let entry = &mut self.entries[entry_id.index()];
        entry.version += 1;
        self.setup_versions.push(entry_id);
        let version = entry.version;
        let imported = entry.imported;

        let new_handle = self.create_resource_node(entry_id, version, Some(writer));
        Ok((new_handle, imported))
    }

    /// Add a side-effecting pass reading `input`, anchoring everything it depends on
    pub fn present(&mut self, input: FrameGraphHandle) -> FrameGraphResult<PassRef<()>> {
        self.add_pass(
            PRESENT_PASS,
            move |_, node, pass| {
                node.has_side_effect = true;
                node.read(input);
                pass.data = Some(());
                Ok(())
            },
            |_, _| Ok(()),
        )
    }

    /// Cull unreachable passes and compute the materialize/destroy points of every entry
    pub fn compile(&mut self) -> FrameGraphResult<()> {
        self.ensure_idle("compile")?;
        for entry in &mut self.entries {
            entry.reset_lifetime();
        }
        for node in &mut self.resource_nodes {
            node.reader_count = 0;
        }

        // Writes keep a pass alive, side effects pin it
        let node_count = self.resource_nodes.len();
        for pass in &mut self.pass_nodes {
            pass.devirtualize.clear();
            pass.destroy.clear();
            pass.ref_count = pass.writes.len() as u32 + u32::from(pass.has_side_effect);

            for read in &pass.reads {
                let node = self
                    .resource_nodes
                    .get_mut(read.index)
                    .ok_or(FrameGraphError::InvalidHandle {
                        index: read.index,
                        len: node_count,
                    })?;
                node.reader_count += 1;
            }
        }

        // Reverse reference counting from the unread nodes
        let mut stack: Vec<usize> = self
            .resource_nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.reader_count == 0)
            .map(|(index, _)| index)
            .collect();

        while let Some(index) = stack.pop() {
            let Some(writer) = self.resource_nodes[index].writer else {
                continue;
            };
            let pass = &mut self.pass_nodes[writer.index()];
            debug_assert!(pass.ref_count > 0, "pass '{}' released twice", pass.name);
            pass.ref_count -= 1;
            if pass.ref_count != 0 {
                continue;
            }

            for read in &pass.reads {
                let node = &mut self.resource_nodes[read.index];
                node.reader_count -= 1;
                if node.reader_count == 0 {
                    stack.push(read.index);
                }
            }
        }

        for node in &self.resource_nodes {
            self.entries[node.entry.index()].refs += node.reader_count;
        }

        // Declaration order gives first and last surviving use
        for pass in self.pass_nodes.iter().filter(|pass| pass.ref_count != 0) {
            for handle in pass.reads.iter().chain(pass.writes.iter()) {
                let entry = &mut self.entries[self.resource_nodes[handle.index].entry.index()];
                entry.first.get_or_insert(pass.id);
                entry.last = Some(pass.id);
            }
        }

        for priority in 0..PRIORITY_TIERS {
            for (index, entry) in self.entries.iter().enumerate() {
                if entry.priority != priority || entry.refs == 0 {
                    continue;
                }
                if let (Some(first), Some(last)) = (entry.first, entry.last) {
                    let id = EntryId(index as u32);
                    self.pass_nodes[first.index()].devirtualize.push(id);
                    self.pass_nodes[last.index()].destroy.push(id);
                }
            }
        }

        let culled = self.pass_nodes.iter().filter(|pass| pass.ref_count == 0).count();
        log::debug!(
            "Compiled frame graph: {} passes ({} culled), {} resources, {} versions",
            self.pass_nodes.len(),
            culled,
            self.entries.len(),
            self.resource_nodes.len()
        );

        self.compiled = true;
        Ok(())
    }

    /// Run every surviving pass in declaration order, then reset the frame
    ///
    /// Compiles first if the graph changed since the last compile. The frame
    /// is reset even when a pass fails.
    pub fn execute_pass_nodes(&mut self) -> FrameGraphResult<()> {
        self.ensure_idle("execute_pass_nodes")?;
        let result = self.ensure_compiled().and_then(|()| self.run_passes());
        self.reset();
        result
    }

    /// Reject calls that would rebuild or run the graph from inside a callback
    fn ensure_idle(&self, operation: &str) -> FrameGraphResult<()> {
        match self.phase {
            Phase::Idle => Ok(()),
            Phase::Setup => Err(FrameGraphError::ReentrantSetup(operation.to_string())),
            Phase::Execute => Err(FrameGraphError::ReentrantExecute(operation.to_string())),
        }
    }

    fn ensure_compiled(&mut self) -> FrameGraphResult<()> {
        if self.compiled {
            return Ok(());
        }
        log::debug!("Frame graph changed since last compile, recompiling");
        self.compile()
    }

    fn run_passes(&mut self) -> FrameGraphResult<()> {
        let mut executed = 0;
        let mut materialized = 0;

        for index in 0..self.pass_nodes.len() {
            let node = &self.pass_nodes[index];
            if node.ref_count == 0 {
                continue;
            }
            let devirtualize = node.devirtualize.clone();
            let destroy = node.destroy.clone();

            for id in &devirtualize {
                self.entries[id.index()].pre_execute_devirtualize(&mut self.resource_pool, &mut self.device)?;
            }
            materialized += devirtualize.len();
            for id in &destroy {
                self.entries[id.index()].pre_execute_destroy();
            }

            let mut pass = self.frame_graph_passes[index]
                .take()
                .ok_or_else(|| FrameGraphError::MissingPassData(self.pass_nodes[index].name.clone()))?;
            let start = Instant::now();
            self.phase = Phase::Execute;
            let result = pass.execute(self);
            self.phase = Phase::Idle;
            let duration = start.elapsed();
            tracing::debug!(
                target: "frame_graph",
                pass = pass.name(),
                duration_us = duration.as_micros() as u64,
                "Pass executed"
            );
            self.frame_graph_passes[index] = Some(pass);
            result?;
            executed += 1;

            for id in &devirtualize {
                self.entries[id.index()].post_execute_devirtualize();
            }
            for id in &destroy {
                self.entries[id.index()].post_execute_destroy();
            }
        }

        self.stats.frames_executed += 1;
        self.stats.passes_declared = self.pass_nodes.len();
        self.stats.passes_executed = executed;
        self.stats.passes_culled = self.pass_nodes.len() - executed;
        self.stats.resources_materialized = materialized;
        self.stats.pooled_resources = self.resource_pool.len();
        Ok(())
    }

    /// Materialized framebuffer behind a handle, while its entry is alive
    ///
    /// `None` for resources that nobody reads; passes must tolerate that.
    pub fn get_resource(&self, handle: FrameGraphHandle) -> FrameGraphResult<Option<Rc<D::Framebuffer>>> {
        Ok(self.entry_of(handle)?.resource.clone())
    }

    /// Discard all per-frame state
    ///
    /// Ignored while a pass is being set up or executed.
    pub fn reset(&mut self) {
        if self.phase != Phase::Idle {
            log::warn!("Frame graph reset requested during {:?}, ignoring", self.phase);
            return;
        }
        self.pass_nodes.clear();
        self.frame_graph_passes.clear();
        self.resource_nodes.clear();
        self.entries.clear();
        self.setup_versions.clear();
        self.compiled = false;
    }

    /// Shut down: run tear-down callbacks of live passes, reset and empty the pool
    ///
    /// Ignored while a pass is being set up or executed.
    pub fn tear_down(&mut self) {
        if self.phase != Phase::Idle {
            log::warn!("Frame graph tear down requested during {:?}, ignoring", self.phase);
            return;
        }
        for (node, pass) in self.pass_nodes.iter().zip(self.frame_graph_passes.iter_mut()) {
            if self.compiled && node.ref_count == 0 {
                continue;
            }
            if let Some(pass) = pass {
                pass.tear_down();
            }
        }
        self.reset();
        self.resource_pool.clean();
    }

    pub fn pass_node(&self, id: PassId) -> Option<&PassNode> {
        self.pass_nodes.get(id.index())
    }

    pub fn pass_nodes(&self) -> &[PassNode] {
        &self.pass_nodes
    }

    pub fn resource_node(&self, handle: FrameGraphHandle) -> FrameGraphResult<&ResourceNode> {
        self.resource_nodes.get(handle.index).ok_or(FrameGraphError::InvalidHandle {
            index: handle.index,
            len: self.resource_nodes.len(),
        })
    }

    pub fn resource_entry(&self, id: EntryId) -> Option<&ResourceEntry<D::Framebuffer>> {
        self.entries.get(id.index())
    }

    /// Entry shared by every version of the resource behind `handle`
    pub fn entry_of(&self, handle: FrameGraphHandle) -> FrameGraphResult<&ResourceEntry<D::Framebuffer>> {
        let entry = self.resource_node(handle)?.entry;
        Ok(&self.entries[entry.index()])
    }

    pub fn pass_count(&self) -> usize {
        self.pass_nodes.len()
    }

    pub fn resource_node_count(&self) -> usize {
        self.resource_nodes.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Statistics of the last executed frame
    pub fn stats(&self) -> &FrameGraphStats {
        &self.stats
    }

    /// Plan of the current frame as computed by the last compile
    pub fn schedule(&self) -> ScheduleReport {
        let entry_names = |ids: &[EntryId]| -> Vec<String> {
            ids.iter().map(|id| self.entries[id.index()].name.clone()).collect()
        };

        let passes = self
            .pass_nodes
            .iter()
            .map(|node| ScheduledPass {
                index: node.id.index(),
                name: node.name.clone(),
                culled: self.compiled && node.ref_count == 0,
                ref_count: node.ref_count,
                has_side_effect: node.has_side_effect,
                devirtualize: entry_names(&node.devirtualize),
                destroy: entry_names(&node.destroy),
            })
            .collect();

        ScheduleReport {
            compiled: self.compiled,
            passes,
        }
    }
}
