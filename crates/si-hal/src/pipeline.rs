//! Backend-agnostic pipeline descriptors and the pipeline-state contract.
//!
//! A pipeline is either graphics or compute, decided once at construction
//! by which [`PipelineDesc`] variant the caller builds. The role is part
//! of the type, never a runtime convention.

use std::sync::Arc;

use si_core::Report;

use crate::binding::BindingLayoutDesc;
use crate::shader::{Permutation, ShaderModule};

/// The comparison function used for depth testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Depth test and write state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    pub test_enabled: bool,
    pub write_enabled: bool,
    pub compare: CompareOp,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enabled: false,
            write_enabled: false,
            compare: CompareOp::Less,
        }
    }
}

/// A factor in a blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// The operation combining source and destination colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Color blend state for the single color target this core models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub enabled: bool,
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
    pub op: BlendOp,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::Zero,
            op: BlendOp::Add,
        }
    }
}

/// Which face of a triangle to cull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    #[default]
    None,
    Front,
    Back,
}

/// Which winding order is front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    #[default]
    Ccw,
    Cw,
}

/// How polygons are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
    Point,
}

/// Rasterizer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RasterizerState {
    pub cull: CullMode,
    pub front_face: FrontFace,
    pub polygon_mode: PolygonMode,
}

/// How vertices assemble into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

/// Descriptor for a graphics pipeline.
#[derive(Debug, Clone)]
pub struct GraphicsPipelineDesc {
    /// Per-stage compiled shader objects from the external compiler.
    pub stages: Vec<Arc<ShaderModule>>,
    /// Link-time program variant.
    pub permutation: Permutation,
    /// Abstract slot-to-binding-point description.
    pub bindings: BindingLayoutDesc,
    pub depth: DepthState,
    pub blend: BlendState,
    pub rasterizer: RasterizerState,
    pub topology: PrimitiveTopology,
}

impl GraphicsPipelineDesc {
    /// Descriptor with default fixed-function state and empty bindings.
    pub fn new(stages: Vec<Arc<ShaderModule>>) -> Self {
        Self {
            stages,
            permutation: Permutation::default(),
            bindings: BindingLayoutDesc::empty(),
            depth: DepthState::default(),
            blend: BlendState::default(),
            rasterizer: RasterizerState::default(),
            topology: PrimitiveTopology::default(),
        }
    }

    pub fn with_bindings(mut self, bindings: BindingLayoutDesc) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_permutation(mut self, permutation: Permutation) -> Self {
        self.permutation = permutation;
        self
    }
}

/// Descriptor for a compute pipeline.
#[derive(Debug, Clone)]
pub struct ComputePipelineDesc {
    /// The single compute stage.
    pub stage: Arc<ShaderModule>,
    /// Abstract slot-to-binding-point description.
    pub bindings: BindingLayoutDesc,
}

impl ComputePipelineDesc {
    pub fn new(stage: Arc<ShaderModule>) -> Self {
        Self {
            stage,
            bindings: BindingLayoutDesc::empty(),
        }
    }

    pub fn with_bindings(mut self, bindings: BindingLayoutDesc) -> Self {
        self.bindings = bindings;
        self
    }
}

/// A pipeline is exactly one of graphics or compute, never both.
#[derive(Debug, Clone)]
pub enum PipelineDesc {
    Graphics(GraphicsPipelineDesc),
    Compute(ComputePipelineDesc),
}

impl PipelineDesc {
    pub fn role(&self) -> PipelineRole {
        match self {
            PipelineDesc::Graphics(_) => PipelineRole::Graphics,
            PipelineDesc::Compute(_) => PipelineRole::Compute,
        }
    }

    pub fn bindings(&self) -> &BindingLayoutDesc {
        match self {
            PipelineDesc::Graphics(desc) => &desc.bindings,
            PipelineDesc::Compute(desc) => &desc.bindings,
        }
    }

    /// The stage modules of either variant, in declaration order.
    pub fn stages(&self) -> Vec<Arc<ShaderModule>> {
        match self {
            PipelineDesc::Graphics(desc) => desc.stages.clone(),
            PipelineDesc::Compute(desc) => vec![desc.stage.clone()],
        }
    }
}

/// Role a pipeline was constructed with; fixed for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineRole {
    Graphics,
    Compute,
}

/// Contract every backend's pipeline state object fulfills.
///
/// A pipeline whose `report()` is `Some` must be treated as unusable for
/// submission even when native handles exist. The asymmetry mirrors
/// native drivers, which can hand back a handle on link failure.
pub trait PipelineState {
    /// Attach or clear a human-readable name. Purely cosmetic: the name
    /// never participates in caching or lookup.
    fn set_name(&mut self, name: Option<&str>);

    fn name(&self) -> Option<&str>;

    /// `None` when the most recent link/validation attempt succeeded;
    /// never an empty non-null report.
    fn report(&self) -> Option<&Report>;

    /// Role chosen at construction.
    fn role(&self) -> PipelineRole;

    fn is_graphics(&self) -> bool {
        self.role() == PipelineRole::Graphics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::ShaderStage;

    #[test]
    fn test_desc_role_is_fixed_by_variant() {
        let graphics = PipelineDesc::Graphics(GraphicsPipelineDesc::new(vec![Arc::new(
            ShaderModule::new(ShaderStage::Vertex, "main"),
        )]));
        assert_eq!(graphics.role(), PipelineRole::Graphics);

        let compute = PipelineDesc::Compute(ComputePipelineDesc::new(Arc::new(
            ShaderModule::new(ShaderStage::Compute, "main"),
        )));
        assert_eq!(compute.role(), PipelineRole::Compute);
        assert_eq!(compute.stages().len(), 1);
    }

    #[test]
    fn test_default_fixed_function_state() {
        let desc = GraphicsPipelineDesc::new(Vec::new());
        assert!(!desc.depth.test_enabled);
        assert!(!desc.blend.enabled);
        assert_eq!(desc.rasterizer.cull, CullMode::None);
        assert_eq!(desc.topology, PrimitiveTopology::TriangleList);
    }
}
