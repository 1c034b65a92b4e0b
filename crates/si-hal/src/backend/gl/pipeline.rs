//! Pipeline state objects for the immediate-mode backend.

use std::sync::Arc;

use si_core::Report;

use crate::binding::LayoutCache;
use crate::pipeline::{
    BlendState, DepthState, PipelineDesc, PipelineRole, PipelineState, PrimitiveTopology,
    RasterizerState,
};
use crate::shader::Permutation;

use super::binding::GlBindingLayout;
use super::program::{GlProfile, GlProgram};
use super::state::GlStateManager;

/// Immediate-mode pipeline state object.
///
/// Construction is atomic: the program links, the binding table resolves,
/// and the fixed-function state is captured in one step. A link failure
/// does not abort construction; it attaches as the report, and the
/// object must then be rejected by the caller before any submission.
pub struct GlPipelineState {
    role: PipelineRole,
    program: GlProgram,
    binding_layout: Arc<GlBindingLayout>,
    depth: DepthState,
    blend: BlendState,
    rasterizer: RasterizerState,
    topology: PrimitiveTopology,
    name: Option<String>,
    report: Option<Report>,
    advisories: Vec<String>,
}

impl GlPipelineState {
    /// Build a pipeline from a descriptor.
    ///
    /// `layouts` is the shared table cache; pipelines with identical
    /// binding signatures receive the same table object.
    pub fn new(
        profile: &GlProfile,
        layouts: &LayoutCache<GlBindingLayout>,
        desc: &PipelineDesc,
    ) -> Self {
        let bindings = desc.bindings();
        let stages = desc.stages();
        let permutation = match desc {
            PipelineDesc::Graphics(graphics) => graphics.permutation.clone(),
            PipelineDesc::Compute(_) => Permutation::Standard,
        };

        let program = GlProgram::link(profile, &stages, &permutation);

        let mut report = Report::new();
        program.query_info_log(&mut report);
        let report = report.has_errors().then_some(report);

        let binding_layout =
            layouts.get_or_insert_with(bindings.signature(), || GlBindingLayout::build(bindings));

        // A shader-declared resource the caller never describes is dead
        // code on the shader side: advisory only, never an error.
        let mut advisories = Vec::new();
        if report.is_none() {
            for resource in &program.query_reflection().resources {
                if bindings.find(resource.kind, resource.slot).is_none() {
                    let note = format!(
                        "{} '{}' (slot {}) is declared by the program but not present in the binding layout",
                        resource.kind.name(),
                        resource.name,
                        resource.slot
                    );
                    tracing::warn!(target: "binding", "{note}");
                    advisories.push(note);
                }
            }
        }

        let (depth, blend, rasterizer, topology) = match desc {
            PipelineDesc::Graphics(graphics) => (
                graphics.depth,
                graphics.blend,
                graphics.rasterizer,
                graphics.topology,
            ),
            PipelineDesc::Compute(_) => Default::default(),
        };

        Self {
            role: desc.role(),
            program,
            binding_layout,
            depth,
            blend,
            rasterizer,
            topology,
            name: None,
            report,
            advisories,
        }
    }

    /// Apply this pipeline's state to the context.
    ///
    /// Fully overwrites the program, binding table, and (for graphics)
    /// fixed-function slots, never merging with a previously bound
    /// pipeline. Binding a pipeline with a non-null report is a caller
    /// contract violation.
    pub fn bind(&self, state: &mut GlStateManager) {
        if self.report.is_some() {
            tracing::warn!(target: "link", "binding a pipeline whose link failed");
        }

        state.bind_program(Some(self.program.id()));
        state.bind_binding_layout(self.binding_layout.clone());

        if self.role == PipelineRole::Graphics {
            state.set_depth_state(self.depth);
            state.set_blend_state(self.blend);
            state.set_rasterizer_state(self.rasterizer);
            state.set_topology(self.topology);
        }
    }

    pub fn program(&self) -> &GlProgram {
        &self.program
    }

    /// The shared binding table.
    pub fn binding_layout(&self) -> &Arc<GlBindingLayout> {
        &self.binding_layout
    }

    /// Non-fatal notes from binding translation.
    pub fn advisories(&self) -> &[String] {
        &self.advisories
    }
}

impl PipelineState for GlPipelineState {
    fn set_name(&mut self, name: Option<&str>) {
        self.name = name.map(str::to_owned);
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    fn role(&self) -> PipelineRole {
        self.role
    }
}
