//! Shader stages and opaque compiled shader objects.
//!
//! Compilation itself happens in an external compiler; the HAL consumes
//! its output as per-stage [`ShaderModule`]s. A module that failed to
//! compile still arrives here; its error text is carried along and
//! surfaces through the same report mechanism as link failures.

use std::sync::Arc;

use bitflags::bitflags;

use crate::binding::ResourceKind;

/// A single programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

bitflags! {
    /// Stage mask, used by reflection records and binding slots.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StageFlags: u8 {
        const VERTEX = 1 << 0;
        const TESS_CONTROL = 1 << 1;
        const TESS_EVAL = 1 << 2;
        const GEOMETRY = 1 << 3;
        const FRAGMENT = 1 << 4;
        const COMPUTE = 1 << 5;
    }
}

impl ShaderStage {
    /// The mask bit for this stage.
    pub fn flags(self) -> StageFlags {
        match self {
            ShaderStage::Vertex => StageFlags::VERTEX,
            ShaderStage::TessControl => StageFlags::TESS_CONTROL,
            ShaderStage::TessEval => StageFlags::TESS_EVAL,
            ShaderStage::Geometry => StageFlags::GEOMETRY,
            ShaderStage::Fragment => StageFlags::FRAGMENT,
            ShaderStage::Compute => StageFlags::COMPUTE,
        }
    }

    /// Lowercase stage name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::TessControl => "tessellation control",
            ShaderStage::TessEval => "tessellation evaluation",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        }
    }
}

/// Data type of an interface variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec4,
    UInt,
    Mat4,
}

/// An input or output variable declared by a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceVar {
    pub name: String,
    pub ty: VarType,
    /// Location the source declared explicitly, if any. Unlocated
    /// variables get locations assigned before linking.
    pub location: Option<u32>,
}

impl InterfaceVar {
    pub fn new(name: impl Into<String>, ty: VarType) -> Self {
        Self {
            name: name.into(),
            ty,
            location: None,
        }
    }

    pub fn at_location(mut self, location: u32) -> Self {
        self.location = Some(location);
        self
    }
}

/// A resource binding declared by a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDecl {
    pub name: String,
    pub slot: u32,
    pub kind: ResourceKind,
    pub array_size: u32,
}

impl ResourceDecl {
    pub fn new(name: impl Into<String>, slot: u32, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            slot,
            kind,
            array_size: 1,
        }
    }

    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }
}

/// Interface declarations the external compiler extracted for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderIo {
    /// Stage inputs; for the vertex stage these are the vertex attributes.
    pub inputs: Vec<InterfaceVar>,
    /// Stage outputs; varyings for the vertex stage, color outputs for the
    /// fragment stage.
    pub outputs: Vec<InterfaceVar>,
    /// Resource bindings the stage reads or writes.
    pub resources: Vec<ResourceDecl>,
}

/// Opaque compiled shader object for one stage.
#[derive(Debug, Clone)]
pub struct ShaderModule {
    /// Stage this module was compiled for.
    pub stage: ShaderStage,
    /// Entry point function name.
    pub entry_point: String,
    /// Compiled code words (SPIR-V for the explicit backend; unused by the
    /// immediate-mode backend).
    pub code: Vec<u32>,
    /// Declared interface.
    pub io: ShaderIo,
    /// Compiler error text, when compilation failed upstream.
    pub compile_log: Option<String>,
}

impl ShaderModule {
    /// Create a successfully compiled module with an empty interface.
    pub fn new(stage: ShaderStage, entry_point: impl Into<String>) -> Self {
        Self {
            stage,
            entry_point: entry_point.into(),
            code: Vec::new(),
            io: ShaderIo::default(),
            compile_log: None,
        }
    }

    pub fn with_code(mut self, code: Vec<u32>) -> Self {
        self.code = code;
        self
    }

    pub fn with_io(mut self, io: ShaderIo) -> Self {
        self.io = io;
        self
    }

    /// Mark the module as failed upstream, carrying the compiler log.
    pub fn with_compile_error(mut self, log: impl Into<String>) -> Self {
        self.compile_log = Some(log.into());
        self
    }

    /// Whether the external compiler produced this module successfully.
    pub fn is_compiled(&self) -> bool {
        self.compile_log.is_none()
    }

    /// Get code as byte slice
    pub fn code_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.code)
    }
}

/// Link-time program variant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Permutation {
    #[default]
    Standard,
    /// Register these varyings for transform feedback. Registration and
    /// linking happen in one atomic step; some drivers re-validate
    /// varyings only at link time.
    TransformFeedback(Vec<String>),
}

/// Check that a stage set forms a linkable program.
///
/// Shared by every backend: the immediate-mode linker rejects the set
/// before touching program state, the explicit backend validates stage
/// compatibility the same way. Returns the diagnostic line on failure.
pub fn validate_stage_set(stages: &[Arc<ShaderModule>]) -> std::result::Result<(), String> {
    if stages.is_empty() {
        return Err("no shader stages provided".into());
    }

    let mut seen = StageFlags::empty();
    for module in stages {
        let flag = module.stage.flags();
        if seen.contains(flag) {
            return Err(format!("duplicate {} stage", module.stage.name()));
        }
        seen |= flag;
    }

    if seen.contains(StageFlags::COMPUTE) {
        if stages.len() > 1 {
            return Err("compute stage cannot be combined with graphics stages".into());
        }
    } else if !seen.contains(StageFlags::VERTEX) {
        return Err("graphics program requires a vertex stage".into());
    }

    Ok(())
}

/// Collect pre-existing compile errors from a stage set, one line each.
pub fn collect_compile_errors(stages: &[Arc<ShaderModule>]) -> Vec<String> {
    stages
        .iter()
        .filter_map(|module| {
            module
                .compile_log
                .as_ref()
                .map(|log| format!("compile error ({}): {}", module.stage.name(), log))
        })
        .collect()
}
