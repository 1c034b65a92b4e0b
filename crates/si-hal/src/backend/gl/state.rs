//! Global state manager for the immediate-mode model.
//!
//! Tracks the full mutable binding state of the context and records which
//! categories changed since the last flush via dirty flags. Setters only
//! mark a category dirty when the value actually changes, so rebinding an
//! identical pipeline is observably a no-op.

use std::sync::Arc;

use bitflags::bitflags;

use crate::pipeline::{BlendState, DepthState, PrimitiveTopology, RasterizerState};

use super::binding::GlBindingLayout;
use super::program::GlProgramId;

bitflags! {
    /// State categories changed since the last flush.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u32 {
        /// Active program has changed
        const PROGRAM = 1 << 0;
        /// Binding table has changed
        const BINDINGS = 1 << 1;
        /// Depth state has changed
        const DEPTH = 1 << 2;
        /// Blend state has changed
        const BLEND = 1 << 3;
        /// Rasterization state has changed
        const RASTER = 1 << 4;
        /// Primitive topology has changed
        const TOPOLOGY = 1 << 5;
    }
}

impl Default for DirtyFlags {
    fn default() -> Self {
        DirtyFlags::empty()
    }
}

/// Globally-stateful context state.
#[derive(Debug, Default)]
pub struct GlStateManager {
    bound_program: Option<GlProgramId>,
    binding_layout: Option<Arc<GlBindingLayout>>,
    depth: DepthState,
    blend: BlendState,
    rasterizer: RasterizerState,
    topology: PrimitiveTopology,
    dirty: DirtyFlags,
}

impl GlStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `program` the active program.
    pub fn bind_program(&mut self, program: Option<GlProgramId>) {
        if self.bound_program != program {
            self.bound_program = program;
            self.dirty |= DirtyFlags::PROGRAM;
        }
    }

    /// Install the binding table consulted at draw time.
    pub fn bind_binding_layout(&mut self, layout: Arc<GlBindingLayout>) {
        let unchanged = self
            .binding_layout
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &layout));
        if !unchanged {
            self.binding_layout = Some(layout);
            self.dirty |= DirtyFlags::BINDINGS;
        }
    }

    pub fn set_depth_state(&mut self, depth: DepthState) {
        if self.depth != depth {
            self.depth = depth;
            self.dirty |= DirtyFlags::DEPTH;
        }
    }

    pub fn set_blend_state(&mut self, blend: BlendState) {
        if self.blend != blend {
            self.blend = blend;
            self.dirty |= DirtyFlags::BLEND;
        }
    }

    pub fn set_rasterizer_state(&mut self, rasterizer: RasterizerState) {
        if self.rasterizer != rasterizer {
            self.rasterizer = rasterizer;
            self.dirty |= DirtyFlags::RASTER;
        }
    }

    pub fn set_topology(&mut self, topology: PrimitiveTopology) {
        if self.topology != topology {
            self.topology = topology;
            self.dirty |= DirtyFlags::TOPOLOGY;
        }
    }

    pub fn bound_program(&self) -> Option<GlProgramId> {
        self.bound_program
    }

    pub fn binding_layout(&self) -> Option<&Arc<GlBindingLayout>> {
        self.binding_layout.as_ref()
    }

    pub fn depth_state(&self) -> DepthState {
        self.depth
    }

    pub fn blend_state(&self) -> BlendState {
        self.blend
    }

    pub fn rasterizer_state(&self) -> RasterizerState {
        self.rasterizer
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Categories changed since the last flush.
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Take and clear the dirty set; the flush point where native state
    /// calls would be issued.
    pub fn take_dirty(&mut self) -> DirtyFlags {
        std::mem::take(&mut self.dirty)
    }
}
